use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, Doctor, Role, ScheduleRequest, ScheduleRow, SlotListing},
    service::Service,
};

const ANY_ROLE: &[Role] = &[Role::Patient, Role::Doctor, Role::Admin];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/doctors", get(list_doctors))
        .route("/doctors/{id}", get(get_doctor))
        .route("/doctors/{id}/slots", get(get_doctor_slots))
        .route("/doctors/{id}/schedule", put(put_doctor_schedule))
}

pub async fn list_doctors(
    State(state): State<AppState>,
    svc: Service,
    auth: AuthContext,
) -> Result<Json<ApiOk<Vec<Doctor>>>, ApiError> {
    auth.require(ANY_ROLE)?;
    let data = state.doctors.list(&svc).await?;
    Ok(Json(ApiOk { data }))
}

pub async fn get_doctor(
    State(state): State<AppState>,
    svc: Service,
    auth: AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiOk<Doctor>>, ApiError> {
    auth.require(ANY_ROLE)?;
    let Path(doctor_id) = path?;
    let data = state.doctors.get(&svc, doctor_id).await?;
    Ok(Json(ApiOk { data }))
}

/// Doctors and admins get the booked patient on each slot; patients do not.
pub async fn get_doctor_slots(
    State(state): State<AppState>,
    svc: Service,
    auth: AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiOk<SlotListing>>, ApiError> {
    auth.require(ANY_ROLE)?;
    let Path(doctor_id) = path?;
    let data = state.doctors.slots(&svc, doctor_id, auth.role).await?;
    Ok(Json(ApiOk { data }))
}

pub async fn put_doctor_schedule(
    State(state): State<AppState>,
    svc: Service,
    auth: AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Result<Json<ApiOk<ScheduleRow>>, ApiError> {
    auth.require(&[Role::Admin])?;
    let Path(doctor_id) = path?;
    let Json(req) = payload?;

    let data = state.doctors.set_schedule(&svc, doctor_id, &req).await?;
    Ok(Json(ApiOk { data }))
}
