mod auth;
mod config;
mod middleware;

mod db;
mod error;
mod models;
mod repository;
mod routes;
mod service;
mod usecase;

use crate::{config::Config, middleware::trace, models::AppState};

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use axum::http::header;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env()?;
    let pool = db::connect_pg(&cfg).await?;
    if cfg.run_migrations {
        db::migrate(&pool).await?;
    }

    let state = AppState::new(pool, cfg.session_ttl_hours);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            trace::TRACEPARENT_HEADER,
        ])
        .expose_headers([trace::TRACEPARENT_HEADER]);

    // The last layer runs first: the traceparent must exist before the span is made.
    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(trace::make_request_span))
        .layer(axum::middleware::from_fn(trace::trace_parent));

    tracing::info!("Listening on http://{}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
