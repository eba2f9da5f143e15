use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{
        ApiOk, AppState, LoginRequest, LoginResponseData, MessageData, RegisterRequest,
        RegisterResponseData,
    },
    service::Service,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub async fn register(
    State(state): State<AppState>,
    svc: Service,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<ApiOk<RegisterResponseData>>, ApiError> {
    let Json(req) = payload?;
    let user_id = state.auth.register(&svc, &req).await?;

    Ok(Json(ApiOk {
        data: RegisterResponseData {
            user_id,
            message: "User registered successfully".into(),
        },
    }))
}

pub async fn login(
    State(state): State<AppState>,
    svc: Service,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiOk<LoginResponseData>>, ApiError> {
    let Json(req) = payload?;
    let data = state
        .auth
        .login(&svc, &req, state.session_ttl_hours)
        .await?;
    Ok(Json(ApiOk { data }))
}

/// Revokes the session whose token authenticated this request.
pub async fn logout(
    State(state): State<AppState>,
    svc: Service,
    auth: AuthContext,
) -> Result<Json<ApiOk<MessageData>>, ApiError> {
    state.auth.logout(&svc, &auth).await?;
    Ok(Json(ApiOk {
        data: MessageData {
            message: "Logged out".into(),
        },
    }))
}
