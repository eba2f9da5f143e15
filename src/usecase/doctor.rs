use std::sync::Arc;

use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Doctor, Role, ScheduleRequest, ScheduleRow, SlotListing};
use crate::repository::DoctorRepository;
use crate::service::Service;

#[derive(Clone)]
pub struct DoctorUsecase {
    repo: Arc<dyn DoctorRepository>,
}

impl DoctorUsecase {
    pub fn new(repo: Arc<dyn DoctorRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, svc: &Service) -> Result<Vec<Doctor>, ApiError> {
        self.repo
            .all_doctors(svc)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error getting doctors"))
    }

    pub async fn get(&self, svc: &Service, doctor_id: Uuid) -> Result<Doctor, ApiError> {
        self.repo
            .doctor_by_id(svc, doctor_id)
            .await
            .inspect_err(|e| tracing::error!(error = %e, %doctor_id, "Error getting doctor"))
    }

    /// The listing's shape follows the caller's role.
    pub async fn slots(
        &self,
        svc: &Service,
        doctor_id: Uuid,
        viewer: Role,
    ) -> Result<SlotListing, ApiError> {
        self.repo
            .doctor_slots(svc, doctor_id, viewer.sees_booking_details())
            .await
            .inspect_err(|e| tracing::error!(error = %e, %doctor_id, "Error getting slots"))
    }

    pub async fn set_schedule(
        &self,
        svc: &Service,
        doctor_id: Uuid,
        schedule: &ScheduleRequest,
    ) -> Result<ScheduleRow, ApiError> {
        self.repo
            .upsert_schedule(svc, doctor_id, schedule)
            .await
            .inspect_err(|e| tracing::error!(error = %e, %doctor_id, "Error saving schedule"))
    }
}
