//! Data-access operations. Each method opens one transaction through the
//! request's [`Service`], runs one purpose-built statement and maps the
//! result into the domain types or an [`ApiError`].

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    Appointment, BookingDecision, Doctor, DoctorAvailability, DoctorMostAppointments,
    DoctorOverTime, NewAppointment, NewSession, NewUser, ScheduleRequest, ScheduleRow,
    SessionIdentity, SessionTokenRow, SlotListing, UserRow,
};
use crate::service::Service;

pub mod admin;
pub mod appointment;
pub mod auth;
pub mod doctor;

#[cfg(test)]
pub mod memory;

/// Postgres-backed implementation of every repository trait.
#[derive(Clone, Copy, Debug, Default)]
pub struct PgRepository;

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn register_user(&self, svc: &Service, user: &NewUser) -> Result<Uuid, ApiError>;

    /// Unknown username is `UserNotFound`; wrong password is `InvalidPassword`.
    async fn login_user(
        &self,
        svc: &Service,
        username: &str,
        password: &str,
    ) -> Result<UserRow, ApiError>;

    async fn create_session(
        &self,
        svc: &Service,
        session: &NewSession,
    ) -> Result<SessionTokenRow, ApiError>;

    async fn resolve_session(
        &self,
        svc: &Service,
        token_hash: &str,
    ) -> Result<Option<SessionIdentity>, ApiError>;

    async fn revoke_session(
        &self,
        svc: &Service,
        session_token_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, ApiError>;
}

#[async_trait]
pub trait DoctorRepository: Send + Sync {
    async fn all_doctors(&self, svc: &Service) -> Result<Vec<Doctor>, ApiError>;

    async fn doctor_by_id(&self, svc: &Service, doctor_id: Uuid) -> Result<Doctor, ApiError>;

    async fn doctor_slots(
        &self,
        svc: &Service,
        doctor_id: Uuid,
        with_booking_details: bool,
    ) -> Result<SlotListing, ApiError>;

    async fn upsert_schedule(
        &self,
        svc: &Service,
        doctor_id: Uuid,
        schedule: &ScheduleRequest,
    ) -> Result<ScheduleRow, ApiError>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// The atomic booking decision. Never returns the four outcomes as
    /// errors; the caller maps them.
    async fn book_appointment(
        &self,
        svc: &Service,
        appointment: &NewAppointment,
    ) -> Result<BookingDecision, ApiError>;

    /// Only visible to the appointment's patient or doctor.
    async fn appointment_by_id(
        &self,
        svc: &Service,
        appointment_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Appointment, ApiError>;

    async fn patient_history(
        &self,
        svc: &Service,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, ApiError>;

    async fn cancel_appointment(&self, svc: &Service, appointment_id: Uuid)
    -> Result<(), ApiError>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn doctors_availability(&self, svc: &Service)
    -> Result<Vec<DoctorAvailability>, ApiError>;

    async fn doctors_most_appointments(
        &self,
        svc: &Service,
        date: NaiveDate,
    ) -> Result<Vec<DoctorMostAppointments>, ApiError>;

    async fn doctors_over_six_hours(
        &self,
        svc: &Service,
        date: NaiveDate,
    ) -> Result<Vec<DoctorOverTime>, ApiError>;
}
