use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;
use crate::repository::{
    AdminRepository, AppointmentRepository, AuthRepository, DoctorRepository, PgRepository,
};
use crate::usecase::{AdminUsecase, AppointmentUsecase, AuthUsecase, DoctorUsecase};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub session_ttl_hours: i64,
    pub auth: AuthUsecase,
    pub appointments: AppointmentUsecase,
    pub doctors: DoctorUsecase,
    pub admin: AdminUsecase,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, session_ttl_hours: i64) -> Self {
        Self::with_repository(db, session_ttl_hours, Arc::new(PgRepository))
    }

    /// Wire every use case to one repository implementation.
    pub fn with_repository<R>(db: sqlx::PgPool, session_ttl_hours: i64, repo: Arc<R>) -> Self
    where
        R: AuthRepository + DoctorRepository + AppointmentRepository + AdminRepository + 'static,
    {
        Self {
            db,
            session_ttl_hours,
            auth: AuthUsecase::new(repo.clone()),
            appointments: AppointmentUsecase::new(repo.clone()),
            doctors: DoctorUsecase::new(repo.clone()),
            admin: AdminUsecase::new(repo),
        }
    }
}

/* -------------------------
   Roles
--------------------------*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        }
    }

    /// Doctors and admins see who booked each slot; patients do not.
    pub fn sees_booking_details(self) -> bool {
        matches!(self, Role::Doctor | Role::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "schedule_availability", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
}

/* -------------------------
   API envelopes
--------------------------*/

#[derive(Debug, Serialize)]
pub struct ApiOk<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct MessageData {
    pub message: String,
}

/* -------------------------
   Authentication
--------------------------*/

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let username = self.username.trim();
        if username.is_empty() || self.password.is_empty() {
            return Err(ApiError::BadRequest(
                "username and password are required".into(),
            ));
        }
        if username.len() > 64 {
            return Err(ApiError::BadRequest("username is too long (max 64)".into()));
        }
        if self.name.trim().is_empty() {
            return Err(ApiError::BadRequest("name is required".into()));
        }
        if !self.email.contains('@') {
            return Err(ApiError::BadRequest("email is invalid".into()));
        }
        Ok(())
    }
}

/// A validated registration with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub device_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponseData {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub username: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponseData {
    pub user_id: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Active session resolved from a bearer token hash.
#[derive(Debug, Clone, FromRow)]
pub struct SessionIdentity {
    pub session_token_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, FromRow)]
pub struct SessionTokenRow {
    pub session_token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Session row to persist after a successful login.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: Uuid,
    pub token_hash: String,
    pub device_name: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/* -------------------------
   Doctors and slots
--------------------------*/

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Doctor {
    pub doctor_id: Uuid,
    pub name: String,
    pub email: String,
    pub availability: Availability,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DoctorSlot {
    pub slot_id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Option<Uuid>,
    pub patient_name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_booked: bool,
    pub duration: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PatientSlot {
    pub slot_id: Uuid,
    pub appointment_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_booked: bool,
    pub duration: String,
}

/// Slot listing, shaped by who is asking.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", content = "slots", rename_all = "lowercase")]
pub enum SlotListing {
    Doctor(Vec<DoctorSlot>),
    Patient(Vec<PatientSlot>),
}

impl SlotListing {
    pub fn len(&self) -> usize {
        match self {
            SlotListing::Doctor(slots) => slots.len(),
            SlotListing::Patient(slots) => slots.len(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    /// `None` targets the doctor's default row.
    pub date: Option<NaiveDate>,
    pub availability: Availability,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ScheduleRow {
    pub schedule_id: Uuid,
    pub doctor_id: Uuid,
    pub date: Option<NaiveDate>,
    pub total_appointments: i32,
    pub total_time: String,
    pub availability: Availability,
}

/* -------------------------
   Appointments
--------------------------*/

pub const MIN_APPOINTMENT_MINUTES: i64 = 15;
pub const MAX_APPOINTMENT_MINUTES: i64 = 120;

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl BookAppointmentRequest {
    /// 15 minutes to 2 hours, inclusive, to the second.
    pub fn validate_duration(&self) -> Result<(), ApiError> {
        let length = self.end_time - self.start_time;
        if length < Duration::minutes(MIN_APPOINTMENT_MINUTES)
            || length > Duration::minutes(MAX_APPOINTMENT_MINUTES)
        {
            return Err(ApiError::InvalidDuration);
        }
        Ok(())
    }

    /// The appointment counts against `appointment_date`, so it must start on it (UTC).
    pub fn validate_date(&self) -> Result<(), ApiError> {
        if self.start_time.date_naive() != self.appointment_date {
            return Err(ApiError::BadRequest(
                "start_time must fall on appointment_date".into(),
            ));
        }
        Ok(())
    }

    pub fn for_patient(&self, patient_id: Uuid) -> NewAppointment {
        NewAppointment {
            doctor_id: self.doctor_id,
            patient_id,
            appointment_date: self.appointment_date,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// What the booking statement decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingOutcome {
    Valid,
    AppointmentExists,
    ScheduleNotFound,
    DoctorOverbooked,
}

impl BookingOutcome {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "valid" => Some(BookingOutcome::Valid),
            "appointment_exists" => Some(BookingOutcome::AppointmentExists),
            "schedule_not_found" => Some(BookingOutcome::ScheduleNotFound),
            "doctor_overbooked" => Some(BookingOutcome::DoctorOverbooked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingDecision {
    pub appointment_id: Option<Uuid>,
    pub outcome: BookingOutcome,
}

impl BookingDecision {
    pub fn into_result(self) -> Result<Uuid, ApiError> {
        match (self.outcome, self.appointment_id) {
            (BookingOutcome::Valid, Some(id)) => Ok(id),
            (BookingOutcome::Valid, None) => Err(ApiError::Database(
                "booking reported valid without an appointment id".into(),
            )),
            (BookingOutcome::AppointmentExists, _) => Err(ApiError::AppointmentExists),
            (BookingOutcome::ScheduleNotFound, _) => Err(ApiError::NoSchedule),
            (BookingOutcome::DoctorOverbooked, _) => Err(ApiError::DoctorOverbooked),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookedData {
    pub appointment_id: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Appointment {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub doctor_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
}

/* -------------------------
   Admin reports
--------------------------*/

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DoctorAvailability {
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub doctor_email: String,
    pub appointment_date: Option<NaiveDate>,
    pub total_appointments: i32,
    pub total_time: String,
    pub availability: Availability,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DoctorMostAppointments {
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub doctor_email: String,
    pub total_appointments: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DoctorOverTime {
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub doctor_email: String,
    pub total_time: String,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

impl DateQuery {
    pub fn required_date(&self) -> Result<NaiveDate, ApiError> {
        let raw = self
            .date
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::BadRequest("date is required".into()))?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::BadRequest("date must be YYYY-MM-DD".into()))
    }
}
