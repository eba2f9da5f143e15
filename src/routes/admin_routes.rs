use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{
        ApiOk, AppState, DateQuery, DoctorAvailability, DoctorMostAppointments, DoctorOverTime,
        Role,
    },
    service::Service,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/doctors-availability", get(doctors_availability))
        .route("/doctors-most-appointments", get(doctors_most_appointments))
        .route("/doctors-over-6-hours", get(doctors_over_six_hours))
}

pub async fn doctors_availability(
    State(state): State<AppState>,
    svc: Service,
    auth: AuthContext,
) -> Result<Json<ApiOk<Vec<DoctorAvailability>>>, ApiError> {
    auth.require(&[Role::Admin])?;
    let data = state.admin.doctors_availability(&svc).await?;
    Ok(Json(ApiOk { data }))
}

/// `?date=YYYY-MM-DD`
pub async fn doctors_most_appointments(
    State(state): State<AppState>,
    svc: Service,
    auth: AuthContext,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<ApiOk<Vec<DoctorMostAppointments>>>, ApiError> {
    auth.require(&[Role::Admin])?;
    let Query(q) = query?;
    let date = q.required_date()?;

    let data = state.admin.doctors_most_appointments(&svc, date).await?;
    Ok(Json(ApiOk { data }))
}

pub async fn doctors_over_six_hours(
    State(state): State<AppState>,
    svc: Service,
    auth: AuthContext,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<ApiOk<Vec<DoctorOverTime>>>, ApiError> {
    auth.require(&[Role::Admin])?;
    let Query(q) = query?;
    let date = q.required_date()?;

    let data = state.admin.doctors_over_six_hours(&svc, date).await?;
    Ok(Json(ApiOk { data }))
}
