use async_trait::async_trait;
use uuid::Uuid;

use super::{AuthRepository, PgRepository};
use crate::auth::verify_password;
use crate::error::ApiError;
use crate::models::{NewSession, NewUser, SessionIdentity, SessionTokenRow, UserRow};
use crate::service::Service;

const REGISTER_USER_QUERY: &str = r#"
INSERT INTO users (username, name, email, password_hash, role)
VALUES ($1, $2, $3, $4, $5)
RETURNING user_id
"#;

const LOGIN_USER_QUERY: &str = r#"
SELECT user_id, username, name, email, password_hash, role
FROM users
WHERE username = $1
"#;

const CREATE_SESSION_QUERY: &str = r#"
INSERT INTO session_token (user_id, session_token_hash, device_name, expires_at)
VALUES ($1, $2, $3, $4)
RETURNING session_token_id, expires_at
"#;

const RESOLVE_SESSION_QUERY: &str = r#"
UPDATE session_token st
SET last_seen_at = now()
FROM users u
WHERE u.user_id = st.user_id
  AND st.session_token_hash = $1
  AND st.revoked_at IS NULL
  AND st.expires_at > now()
RETURNING st.session_token_id, st.user_id, u.role
"#;

const REVOKE_SESSION_QUERY: &str = r#"
UPDATE session_token
SET revoked_at = now()
WHERE session_token_id = $1
  AND user_id = $2
  AND revoked_at IS NULL
"#;

#[async_trait]
impl AuthRepository for PgRepository {
    async fn register_user(&self, svc: &Service, user: &NewUser) -> Result<Uuid, ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;

        let user_id = match sqlx::query_scalar::<_, Uuid>(REGISTER_USER_QUERY)
            .bind(&user.username)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .fetch_one(&mut *tx)
            .await
        {
            Ok(id) => id,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                let err = ApiError::BadRequest("username is already taken".into());
                return Err(trx.abort(tx, err).await);
            }
            Err(e) => {
                tracing::error!(error = %e, "Could not register user");
                return Err(trx.abort(tx, ApiError::db(e)).await);
            }
        };

        trx.commit(tx).await?;
        tracing::info!(%user_id, username = %user.username, "Successfully registered a new user");
        Ok(user_id)
    }

    async fn login_user(
        &self,
        svc: &Service,
        username: &str,
        password: &str,
    ) -> Result<UserRow, ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;

        let found = match sqlx::query_as::<_, UserRow>(LOGIN_USER_QUERY)
            .bind(username)
            .fetch_optional(&mut *tx)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(error = %e, "Could not retrieve user");
                return Err(trx.abort(tx, ApiError::db(e)).await);
            }
        };

        let Some(user) = found else {
            tracing::info!(%username, "User not found");
            return Err(trx.abort(tx, ApiError::UserNotFound).await);
        };

        if !verify_password(password, &user.password_hash) {
            tracing::info!(user_id = %user.user_id, "Invalid password");
            return Err(trx.abort(tx, ApiError::InvalidPassword).await);
        }

        trx.commit(tx).await?;
        tracing::info!(user_id = %user.user_id, "Successfully logged in user");
        Ok(user)
    }

    async fn create_session(
        &self,
        svc: &Service,
        session: &NewSession,
    ) -> Result<SessionTokenRow, ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;

        let row = match sqlx::query_as::<_, SessionTokenRow>(CREATE_SESSION_QUERY)
            .bind(session.user_id)
            .bind(&session.token_hash)
            .bind(session.device_name.as_deref())
            .bind(session.expires_at)
            .fetch_one(&mut *tx)
            .await
        {
            Ok(row) => row,
            Err(e) => return Err(trx.abort(tx, ApiError::db(e)).await),
        };

        trx.commit(tx).await?;
        Ok(row)
    }

    async fn resolve_session(
        &self,
        svc: &Service,
        token_hash: &str,
    ) -> Result<Option<SessionIdentity>, ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;

        let found = match sqlx::query_as::<_, SessionIdentity>(RESOLVE_SESSION_QUERY)
            .bind(token_hash)
            .fetch_optional(&mut *tx)
            .await
        {
            Ok(found) => found,
            Err(e) => return Err(trx.abort(tx, ApiError::db(e)).await),
        };

        trx.commit(tx).await?;
        Ok(found)
    }

    async fn revoke_session(
        &self,
        svc: &Service,
        session_token_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;

        let revoked = match sqlx::query(REVOKE_SESSION_QUERY)
            .bind(session_token_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
        {
            Ok(done) => done.rows_affected() > 0,
            Err(e) => return Err(trx.abort(tx, ApiError::db(e)).await),
        };

        trx.commit(tx).await?;
        Ok(revoked)
    }
}
