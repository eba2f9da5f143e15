use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;

pub async fn connect_pg(cfg: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_max_connections)
        .connect(&cfg.database_url)
        .await?;

    tracing::info!(max_connections = cfg.db_max_connections, "Connected to postgres");
    Ok(pool)
}

/// Apply the embedded migrations under `migrations/`.
pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    tracing::info!("Applying database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
