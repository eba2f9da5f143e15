use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::ApiError;
use crate::models::{DoctorAvailability, DoctorMostAppointments, DoctorOverTime};
use crate::repository::AdminRepository;
use crate::service::Service;

#[derive(Clone)]
pub struct AdminUsecase {
    repo: Arc<dyn AdminRepository>,
}

impl AdminUsecase {
    pub fn new(repo: Arc<dyn AdminRepository>) -> Self {
        Self { repo }
    }

    pub async fn doctors_availability(
        &self,
        svc: &Service,
    ) -> Result<Vec<DoctorAvailability>, ApiError> {
        self.repo
            .doctors_availability(svc)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error getting doctor availability"))
    }

    pub async fn doctors_most_appointments(
        &self,
        svc: &Service,
        date: NaiveDate,
    ) -> Result<Vec<DoctorMostAppointments>, ApiError> {
        self.repo
            .doctors_most_appointments(svc, date)
            .await
            .inspect_err(|e| tracing::error!(error = %e, %date, "Error getting busiest doctors"))
    }

    pub async fn doctors_over_six_hours(
        &self,
        svc: &Service,
        date: NaiveDate,
    ) -> Result<Vec<DoctorOverTime>, ApiError> {
        self.repo
            .doctors_over_six_hours(svc, date)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, %date, "Error getting doctors over six hours")
            })
    }
}
