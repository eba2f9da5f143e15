use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::{generate_access_token, hash_access_token, hash_password};
use crate::error::ApiError;
use crate::middleware::auth_context::AuthContext;
use crate::models::{
    LoginRequest, LoginResponseData, NewSession, NewUser, RegisterRequest, SessionIdentity,
    UserProfile,
};
use crate::repository::AuthRepository;
use crate::service::Service;

#[derive(Clone)]
pub struct AuthUsecase {
    repo: Arc<dyn AuthRepository>,
}

impl AuthUsecase {
    pub fn new(repo: Arc<dyn AuthRepository>) -> Self {
        Self { repo }
    }

    pub async fn register(&self, svc: &Service, req: &RegisterRequest) -> Result<Uuid, ApiError> {
        req.validate()?;

        let user = NewUser {
            username: req.username.trim().to_string(),
            name: req.name.trim().to_string(),
            email: req.email.trim().to_string(),
            password_hash: hash_password(&req.password)?,
            role: req.role,
        };

        self.repo.register_user(svc, &user).await.inspect_err(|e| {
            tracing::error!(error = %e, username = %user.username, "Error registering user");
        })
    }

    /// Verify credentials and open a session lasting `ttl_hours`.
    pub async fn login(
        &self,
        svc: &Service,
        req: &LoginRequest,
        ttl_hours: i64,
    ) -> Result<LoginResponseData, ApiError> {
        let username = req.username.trim();
        if username.is_empty() || req.password.is_empty() {
            return Err(ApiError::BadRequest(
                "username and password are required".into(),
            ));
        }

        let user = self
            .repo
            .login_user(svc, username, &req.password)
            .await
            .inspect_err(|e| tracing::error!(error = %e, %username, "Error logging in user"))?;

        let access_token = generate_access_token();
        let session = NewSession {
            user_id: user.user_id,
            token_hash: hash_access_token(&access_token),
            device_name: req.device_name.clone(),
            expires_at: Utc::now() + Duration::hours(ttl_hours),
        };
        let saved = self
            .repo
            .create_session(svc, &session)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error creating session"))?;

        Ok(LoginResponseData {
            access_token,
            expires_at: saved.expires_at,
            user: UserProfile {
                user_id: user.user_id,
                username: user.username,
                name: user.name,
                role: user.role,
            },
        })
    }

    pub async fn resolve_session(
        &self,
        svc: &Service,
        token_hash: &str,
    ) -> Result<Option<SessionIdentity>, ApiError> {
        self.repo
            .resolve_session(svc, token_hash)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error resolving session"))
    }

    pub async fn logout(&self, svc: &Service, auth: &AuthContext) -> Result<(), ApiError> {
        let revoked = self
            .repo
            .revoke_session(svc, auth.session_token_id, auth.user_id)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error revoking session"))?;
        if !revoked {
            tracing::warn!(session_token_id = %auth.session_token_id, "Session was already revoked");
        }
        Ok(())
    }
}
