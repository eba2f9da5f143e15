use async_trait::async_trait;
use chrono::NaiveDate;

use super::{AdminRepository, PgRepository};
use crate::error::ApiError;
use crate::models::{DoctorAvailability, DoctorMostAppointments, DoctorOverTime};
use crate::service::Service;

const GET_ALL_DOCTORS_AVAILABILITY_QUERY: &str = r#"
SELECT
    u.user_id AS doctor_id,
    u.name AS doctor_name,
    u.email AS doctor_email,
    s.date AS appointment_date,
    s.total_appointments,
    s.total_appointment_time::text AS total_time,
    s.availability
FROM users u
JOIN schedules s ON s.doctor_id = u.user_id
ORDER BY u.name ASC, s.date ASC NULLS FIRST
"#;

const GET_DOCTORS_WITH_MOST_APPOINTMENTS_QUERY: &str = r#"
SELECT
    u.user_id AS doctor_id,
    u.name AS doctor_name,
    u.email AS doctor_email,
    s.total_appointments
FROM users u
JOIN schedules s ON s.doctor_id = u.user_id
WHERE s.date = $1
ORDER BY s.total_appointments DESC, u.name ASC
"#;

const GET_DOCTORS_WITH_OVER_SIX_HOURS_QUERY: &str = r#"
SELECT
    u.user_id AS doctor_id,
    u.name AS doctor_name,
    u.email AS doctor_email,
    s.total_appointment_time::text AS total_time
FROM users u
JOIN schedules s ON s.doctor_id = u.user_id
WHERE s.date = $1
  AND s.total_appointment_time > INTERVAL '6 hours'
ORDER BY s.total_appointment_time DESC
"#;

#[async_trait]
impl AdminRepository for PgRepository {
    async fn doctors_availability(
        &self,
        svc: &Service,
    ) -> Result<Vec<DoctorAvailability>, ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;

        let rows = match sqlx::query_as::<_, DoctorAvailability>(GET_ALL_DOCTORS_AVAILABILITY_QUERY)
            .fetch_all(&mut *tx)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(error = %e, "Could not retrieve doctor availability");
                return Err(trx.abort(tx, ApiError::db(e)).await);
            }
        };

        trx.commit(tx).await?;
        tracing::info!(count = rows.len(), "Successfully retrieved doctor availability");
        Ok(rows)
    }

    async fn doctors_most_appointments(
        &self,
        svc: &Service,
        date: NaiveDate,
    ) -> Result<Vec<DoctorMostAppointments>, ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;

        let rows = match sqlx::query_as::<_, DoctorMostAppointments>(
            GET_DOCTORS_WITH_MOST_APPOINTMENTS_QUERY,
        )
        .bind(date)
        .fetch_all(&mut *tx)
        .await
        {
            Ok(rows) => rows,
            Err(e) => return Err(trx.abort(tx, ApiError::db(e)).await),
        };

        trx.commit(tx).await?;
        Ok(rows)
    }

    async fn doctors_over_six_hours(
        &self,
        svc: &Service,
        date: NaiveDate,
    ) -> Result<Vec<DoctorOverTime>, ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;

        let rows = match sqlx::query_as::<_, DoctorOverTime>(GET_DOCTORS_WITH_OVER_SIX_HOURS_QUERY)
            .bind(date)
            .fetch_all(&mut *tx)
            .await
        {
            Ok(rows) => rows,
            Err(e) => return Err(trx.abort(tx, ApiError::db(e)).await),
        };

        trx.commit(tx).await?;
        Ok(rows)
    }
}
