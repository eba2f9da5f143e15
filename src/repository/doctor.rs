use async_trait::async_trait;
use uuid::Uuid;

use super::{DoctorRepository, PgRepository};
use crate::error::ApiError;
use crate::models::{Doctor, DoctorSlot, PatientSlot, ScheduleRequest, ScheduleRow, SlotListing};
use crate::service::Service;

const GET_ALL_DOCTORS_QUERY: &str = r#"
SELECT
    u.user_id AS doctor_id,
    u.name,
    u.email,
    'available'::schedule_availability AS availability
FROM users u
WHERE u.role = 'doctor'
  AND EXISTS (
      SELECT 1 FROM schedules s
      WHERE s.doctor_id = u.user_id
        AND s.availability = 'available'
  )
ORDER BY u.name ASC
"#;

const GET_DOCTOR_BY_ID_QUERY: &str = r#"
SELECT
    u.user_id AS doctor_id,
    u.name,
    u.email,
    'available'::schedule_availability AS availability
FROM users u
WHERE u.user_id = $1
  AND u.role = 'doctor'
  AND EXISTS (
      SELECT 1 FROM schedules s
      WHERE s.doctor_id = u.user_id
        AND s.availability = 'available'
  )
"#;

const GET_SLOTS_FOR_DOCTOR_VIEW_QUERY: &str = r#"
SELECT
    s.slot_id,
    s.appointment_id,
    p.user_id AS patient_id,
    p.name AS patient_name,
    s.start_time,
    s.end_time,
    s.is_booked,
    s.duration::text AS duration
FROM slot s
LEFT JOIN appointment a ON a.appointment_id = s.appointment_id
LEFT JOIN users p ON p.user_id = a.patient_id
WHERE s.doctor_id = $1
ORDER BY s.start_time ASC
"#;

const GET_SLOTS_FOR_PATIENT_VIEW_QUERY: &str = r#"
SELECT
    s.slot_id,
    s.appointment_id,
    s.start_time,
    s.end_time,
    s.is_booked,
    s.duration::text AS duration
FROM slot s
WHERE s.doctor_id = $1
ORDER BY s.start_time ASC
"#;

// Only the availability flag is writable here; totals belong to the booking triggers.
const UPSERT_DATED_SCHEDULE_QUERY: &str = r#"
INSERT INTO schedules (doctor_id, date, availability)
SELECT u.user_id, $2, $3
FROM users u
WHERE u.user_id = $1
  AND u.role = 'doctor'
ON CONFLICT (doctor_id, date)
DO UPDATE SET availability = EXCLUDED.availability
RETURNING
    schedule_id,
    doctor_id,
    date,
    total_appointments,
    total_appointment_time::text AS total_time,
    availability
"#;

const UPSERT_DEFAULT_SCHEDULE_QUERY: &str = r#"
INSERT INTO schedules (doctor_id, date, availability)
SELECT u.user_id, NULL, $2
FROM users u
WHERE u.user_id = $1
  AND u.role = 'doctor'
ON CONFLICT (doctor_id) WHERE date IS NULL
DO UPDATE SET availability = EXCLUDED.availability
RETURNING
    schedule_id,
    doctor_id,
    date,
    total_appointments,
    total_appointment_time::text AS total_time,
    availability
"#;

#[async_trait]
impl DoctorRepository for PgRepository {
    async fn all_doctors(&self, svc: &Service) -> Result<Vec<Doctor>, ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;

        let doctors = match sqlx::query_as::<_, Doctor>(GET_ALL_DOCTORS_QUERY)
            .fetch_all(&mut *tx)
            .await
        {
            Ok(rows) => rows,
            Err(e) => return Err(trx.abort(tx, ApiError::db(e)).await),
        };

        trx.commit(tx).await?;
        tracing::info!(count = doctors.len(), "Successfully retrieved all doctors");
        Ok(doctors)
    }

    async fn doctor_by_id(&self, svc: &Service, doctor_id: Uuid) -> Result<Doctor, ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;

        let found = match sqlx::query_as::<_, Doctor>(GET_DOCTOR_BY_ID_QUERY)
            .bind(doctor_id)
            .fetch_optional(&mut *tx)
            .await
        {
            Ok(found) => found,
            Err(e) => return Err(trx.abort(tx, ApiError::db(e)).await),
        };

        trx.commit(tx).await?;
        found.ok_or(ApiError::NotFound)
    }

    async fn doctor_slots(
        &self,
        svc: &Service,
        doctor_id: Uuid,
        with_booking_details: bool,
    ) -> Result<SlotListing, ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;

        let listing = if with_booking_details {
            sqlx::query_as::<_, DoctorSlot>(GET_SLOTS_FOR_DOCTOR_VIEW_QUERY)
                .bind(doctor_id)
                .fetch_all(&mut *tx)
                .await
                .map(SlotListing::Doctor)
        } else {
            sqlx::query_as::<_, PatientSlot>(GET_SLOTS_FOR_PATIENT_VIEW_QUERY)
                .bind(doctor_id)
                .fetch_all(&mut *tx)
                .await
                .map(SlotListing::Patient)
        };

        let listing = match listing {
            Ok(listing) => listing,
            Err(e) => {
                tracing::error!(error = %e, "Query failed");
                return Err(trx.abort(tx, ApiError::db(e)).await);
            }
        };

        trx.commit(tx).await?;
        tracing::info!(%doctor_id, count = listing.len(), "Successfully retrieved slots");
        Ok(listing)
    }

    async fn upsert_schedule(
        &self,
        svc: &Service,
        doctor_id: Uuid,
        schedule: &ScheduleRequest,
    ) -> Result<ScheduleRow, ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;

        let query = match schedule.date {
            Some(date) => sqlx::query_as::<_, ScheduleRow>(UPSERT_DATED_SCHEDULE_QUERY)
                .bind(doctor_id)
                .bind(date)
                .bind(schedule.availability),
            None => sqlx::query_as::<_, ScheduleRow>(UPSERT_DEFAULT_SCHEDULE_QUERY)
                .bind(doctor_id)
                .bind(schedule.availability),
        };

        let saved = match query.fetch_optional(&mut *tx).await {
            Ok(saved) => saved,
            Err(e) => return Err(trx.abort(tx, ApiError::db(e)).await),
        };

        let Some(row) = saved else {
            return Err(trx.abort(tx, ApiError::NotFound).await);
        };

        trx.commit(tx).await?;
        tracing::info!(%doctor_id, date = ?row.date, "Schedule saved");
        Ok(row)
    }
}
