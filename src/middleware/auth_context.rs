use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use uuid::Uuid;

use crate::auth::hash_access_token;
use crate::error::ApiError;
use crate::models::{AppState, Role};
use crate::service::Service;

/// Identity of the caller, resolved once per request from its bearer token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
    pub session_token_id: Uuid,
}

impl AuthContext {
    /// Per-route allow-list check.
    pub fn require(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.user_id,
                role = self.role.as_str(),
                "role not permitted for this route"
            );
            Err(ApiError::Forbidden)
        }
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let TypedHeader(authz): TypedHeader<Authorization<Bearer>> =
                TypedHeader::from_request_parts(parts, state)
                    .await
                    .map_err(|_| ApiError::Unauthorized)?;

            let token_hash = hash_access_token(authz.token());
            let svc = Service::from_request_parts(parts, state).await?;

            let session = state
                .auth
                .resolve_session(&svc, &token_hash)
                .await?
                .ok_or(ApiError::Unauthorized)?;

            Ok(AuthContext {
                user_id: session.user_id,
                role: session.role,
                session_token_id: session.session_token_id,
            })
        }
    }
}
