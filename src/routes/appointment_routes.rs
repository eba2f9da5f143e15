use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, Appointment, BookAppointmentRequest, BookedData, MessageData, Role},
    service::Service,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", post(book_appointment))
        .route("/appointments/history", get(get_own_history))
        .route(
            "/appointments/{id}",
            get(get_appointment).delete(cancel_appointment),
        )
        .route("/appointments/{id}/history", get(get_patient_history))
}

/// The patient is always the caller; a `patient_id` in the body is ignored.
pub async fn book_appointment(
    State(state): State<AppState>,
    svc: Service,
    auth: AuthContext,
    payload: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<Json<ApiOk<BookedData>>, ApiError> {
    auth.require(&[Role::Patient])?;
    let Json(req) = payload?;

    let appointment_id = state.appointments.book(&svc, auth.user_id, &req).await?;

    Ok(Json(ApiOk {
        data: BookedData {
            appointment_id,
            message: "Appointment booked successfully".into(),
        },
    }))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    svc: Service,
    auth: AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiOk<Appointment>>, ApiError> {
    auth.require(&[Role::Doctor, Role::Patient])?;
    let Path(appointment_id) = path?;

    let data = state
        .appointments
        .get(&svc, appointment_id, auth.user_id)
        .await?;
    Ok(Json(ApiOk { data }))
}

pub async fn get_own_history(
    State(state): State<AppState>,
    svc: Service,
    auth: AuthContext,
) -> Result<Json<ApiOk<Vec<Appointment>>>, ApiError> {
    auth.require(&[Role::Patient])?;
    let data = state.appointments.history(&svc, auth.user_id).await?;
    Ok(Json(ApiOk { data }))
}

pub async fn get_patient_history(
    State(state): State<AppState>,
    svc: Service,
    auth: AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiOk<Vec<Appointment>>>, ApiError> {
    auth.require(&[Role::Doctor])?;
    let Path(patient_id) = path?;

    let data = state.appointments.history(&svc, patient_id).await?;
    Ok(Json(ApiOk { data }))
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    svc: Service,
    auth: AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiOk<MessageData>>, ApiError> {
    auth.require(&[Role::Doctor, Role::Admin])?;
    let Path(appointment_id) = path?;

    state.appointments.cancel(&svc, appointment_id).await?;
    tracing::info!(%appointment_id, cancelled_by = %auth.user_id, "Appointment cancelled");

    Ok(Json(ApiOk {
        data: MessageData {
            message: "Appointment cancelled successfully".into(),
        },
    }))
}
