use std::sync::Arc;

use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Appointment, BookAppointmentRequest};
use crate::repository::AppointmentRepository;
use crate::service::Service;

#[derive(Clone)]
pub struct AppointmentUsecase {
    repo: Arc<dyn AppointmentRepository>,
}

impl AppointmentUsecase {
    pub fn new(repo: Arc<dyn AppointmentRepository>) -> Self {
        Self { repo }
    }

    /// Books for `patient_id`. Out-of-band durations and mismatched dates never
    /// reach the database.
    pub async fn book(
        &self,
        svc: &Service,
        patient_id: Uuid,
        req: &BookAppointmentRequest,
    ) -> Result<Uuid, ApiError> {
        req.validate_date()?;
        if let Err(e) = req.validate_duration() {
            tracing::info!(
                start = %req.start_time,
                end = %req.end_time,
                "Rejected appointment with invalid duration"
            );
            return Err(e);
        }

        let decision = self
            .repo
            .book_appointment(svc, &req.for_patient(patient_id))
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error booking appointment"))?;

        decision.into_result()
    }

    pub async fn get(
        &self,
        svc: &Service,
        appointment_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Appointment, ApiError> {
        self.repo
            .appointment_by_id(svc, appointment_id, viewer_id)
            .await
            .inspect_err(|e| tracing::error!(error = %e, %appointment_id, "Error getting appointment"))
    }

    pub async fn history(&self, svc: &Service, patient_id: Uuid) -> Result<Vec<Appointment>, ApiError> {
        self.repo
            .patient_history(svc, patient_id)
            .await
            .inspect_err(|e| tracing::error!(error = %e, %patient_id, "Error getting patient history"))
    }

    pub async fn cancel(&self, svc: &Service, appointment_id: Uuid) -> Result<(), ApiError> {
        self.repo
            .cancel_appointment(svc, appointment_id)
            .await
            .inspect_err(|e| tracing::error!(error = %e, %appointment_id, "Error cancelling appointment"))
    }
}
