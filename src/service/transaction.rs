use sqlx::{PgPool, Postgres, Transaction};

use crate::error::ApiError;

pub type PgTx = Transaction<'static, Postgres>;

/// Begin/commit/rollback over the shared pool. Every data-access operation
/// owns exactly one transaction from `begin` until `commit` or `abort`.
#[derive(Clone, Debug)]
pub struct TransactionManager {
    db: PgPool,
}

impl TransactionManager {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn begin(&self) -> Result<PgTx, ApiError> {
        tracing::debug!("Starting new transaction");
        self.db.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Could not begin transaction");
            ApiError::db(e)
        })
    }

    pub async fn commit(&self, tx: PgTx) -> Result<(), ApiError> {
        tracing::debug!("Committing transaction");
        tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Could not commit transaction");
            ApiError::db(e)
        })
    }

    /// Best effort: a failed rollback is logged, not returned.
    pub async fn rollback(&self, tx: PgTx) {
        tracing::debug!("Rolling back transaction");
        if let Err(e) = tx.rollback().await {
            tracing::error!(error = %e, "Failed to rollback transaction");
        }
    }

    /// Roll back and hand the error back to the caller.
    pub async fn abort(&self, tx: PgTx, err: ApiError) -> ApiError {
        self.rollback(tx).await;
        err
    }
}
