use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sqlx::PgPool;

use crate::error::ApiError;
use crate::middleware::trace::TraceParent;
use crate::models::AppState;

pub mod transaction;

pub use transaction::TransactionManager;

/// Request-scoped handle passed down to every data-access operation.
#[derive(Clone, Debug)]
pub struct Service {
    db: PgPool,
    trx: TransactionManager,
    trace: TraceParent,
}

impl Service {
    pub fn new(db: PgPool, trace: TraceParent) -> Self {
        Self {
            trx: TransactionManager::new(db.clone()),
            db,
            trace,
        }
    }

    #[allow(dead_code)]
    pub fn db(&self) -> &PgPool {
        &self.db
    }

    pub fn transaction_manager(&self) -> &TransactionManager {
        &self.trx
    }

    pub fn trace_parent(&self) -> &TraceParent {
        &self.trace
    }
}

impl FromRequestParts<AppState> for Service {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let trace = parts
            .extensions
            .get::<TraceParent>()
            .cloned()
            .unwrap_or_else(TraceParent::generate);
        let db = state.db.clone();
        async move { Ok(Service::new(db, trace)) }
    }
}
