use crate::models::AppState;
use axum::Router;

pub mod admin_routes;
pub mod appointment_routes;
pub mod auth_routes;
pub mod doctor_routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1/auth", auth_routes::router())
        .nest("/api/v1/admin", admin_routes::router())
        .nest("/api/v1", appointment_routes::router())
        .nest("/api/v1", doctor_routes::router())
        .with_state(state)
}
