use async_trait::async_trait;
use uuid::Uuid;

use super::{AppointmentRepository, PgRepository};
use crate::error::ApiError;
use crate::models::{Appointment, BookingDecision, BookingOutcome, NewAppointment};
use crate::service::Service;

/// Copies the doctor's default (NULL date) row onto the requested date when no
/// dated row exists yet. Runs before [`BOOK_APPOINTMENT_QUERY`] in the same
/// transaction so that every booking for a day locks, and the triggers update,
/// the same row.
const MATERIALIZE_DATED_SCHEDULE_QUERY: &str = r#"
INSERT INTO schedules (doctor_id, date, availability)
SELECT doctor_id, $2, availability
FROM schedules
WHERE doctor_id = $1
  AND date IS NULL
ON CONFLICT (doctor_id, date) DO NOTHING
"#;

/// Booking decision in one statement.
///
/// Precedence: existing start time, then missing schedule, then capacity
/// (12 appointments or 8 hours a day), then insert. The dated schedule row is
/// locked, so concurrent bookings for the same doctor and date queue behind
/// each other and the later one sees the updated totals.
const BOOK_APPOINTMENT_QUERY: &str = r#"
WITH check_appointment AS (
    SELECT 1
    FROM appointment
    WHERE doctor_id = $1
      AND appointment_date = $3
      AND start_time = $4
),
check_schedule AS (
    SELECT total_appointments, total_appointment_time
    FROM schedules
    WHERE doctor_id = $1
      AND date = $3
    FOR UPDATE
),
valid_duration AS (
    SELECT
        CASE
            WHEN COALESCE(total_appointments, 0) + 1 > 12 THEN FALSE
            WHEN COALESCE(total_appointment_time, INTERVAL '0') + ($5 - $4) > INTERVAL '8 hours' THEN FALSE
            ELSE TRUE
        END AS is_valid
    FROM check_schedule
),
insert_appointment AS (
    INSERT INTO appointment (doctor_id, patient_id, appointment_date, start_time, end_time)
    SELECT $1, $2, $3, $4, $5
    WHERE NOT EXISTS (SELECT 1 FROM check_appointment)
      AND EXISTS (SELECT 1 FROM check_schedule)
      AND EXISTS (SELECT 1 FROM valid_duration WHERE is_valid)
    RETURNING appointment_id
)
SELECT
    (SELECT appointment_id FROM insert_appointment) AS appointment_id,
    CASE
        WHEN EXISTS (SELECT 1 FROM check_appointment) THEN 'appointment_exists'
        WHEN NOT EXISTS (SELECT 1 FROM check_schedule) THEN 'schedule_not_found'
        WHEN NOT EXISTS (SELECT 1 FROM valid_duration WHERE is_valid) THEN 'doctor_overbooked'
        ELSE 'valid'
    END AS status
"#;

const GET_APPOINTMENT_BY_ID_QUERY: &str = r#"
SELECT
    a.appointment_id,
    a.patient_id,
    p.name AS patient_name,
    d.name AS doctor_name,
    a.start_time,
    a.end_time,
    a.status
FROM appointment a
JOIN users p ON p.user_id = a.patient_id
JOIN users d ON d.user_id = a.doctor_id
WHERE a.appointment_id = $1
  AND (a.patient_id = $2 OR a.doctor_id = $2)
"#;

const GET_PATIENT_HISTORY_QUERY: &str = r#"
SELECT
    a.appointment_id,
    a.patient_id,
    p.name AS patient_name,
    d.name AS doctor_name,
    a.start_time,
    a.end_time,
    a.status
FROM appointment a
JOIN users p ON p.user_id = a.patient_id
JOIN users d ON d.user_id = a.doctor_id
WHERE a.patient_id = $1
ORDER BY a.created_at DESC, a.start_time DESC
"#;

const CANCEL_APPOINTMENT_QUERY: &str = r#"
DELETE FROM appointment
WHERE appointment_id = $1
"#;

const DELETE_SLOT_QUERY: &str = r#"
DELETE FROM slot
WHERE appointment_id = $1
"#;

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    appointment_id: Option<Uuid>,
    status: String,
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl AppointmentRepository for PgRepository {
    async fn book_appointment(
        &self,
        svc: &Service,
        appointment: &NewAppointment,
    ) -> Result<BookingDecision, ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;
        tracing::info!(
            traceparent = %svc.trace_parent(),
            doctor_id = %appointment.doctor_id,
            date = %appointment.appointment_date,
            "Transaction started for booking appointment"
        );

        if let Err(e) = sqlx::query(MATERIALIZE_DATED_SCHEDULE_QUERY)
            .bind(appointment.doctor_id)
            .bind(appointment.appointment_date)
            .execute(&mut *tx)
            .await
        {
            tracing::error!(error = %e, "Could not prepare schedule row for booking");
            return Err(trx.abort(tx, ApiError::db(e)).await);
        }

        let row = match sqlx::query_as::<_, BookingRow>(BOOK_APPOINTMENT_QUERY)
            .bind(appointment.doctor_id)
            .bind(appointment.patient_id)
            .bind(appointment.appointment_date)
            .bind(appointment.start_time)
            .bind(appointment.end_time)
            .fetch_one(&mut *tx)
            .await
        {
            Ok(row) => row,
            // A concurrent booking for the same start committed between our
            // conflict check and our insert.
            Err(e) if is_unique_violation(&e) => {
                trx.rollback(tx).await;
                tracing::info!("Appointment already exists for this start time");
                return Ok(BookingDecision {
                    appointment_id: None,
                    outcome: BookingOutcome::AppointmentExists,
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "Error executing booking statement");
                return Err(trx.abort(tx, ApiError::db(e)).await);
            }
        };

        let Some(outcome) = BookingOutcome::from_tag(&row.status) else {
            let err = ApiError::Database(format!("unknown booking status: {}", row.status));
            return Err(trx.abort(tx, err).await);
        };

        // A rejected booking must not leave a copied schedule row behind.
        match outcome {
            BookingOutcome::Valid => {
                trx.commit(tx).await?;
                tracing::info!(
                    appointment_id = ?row.appointment_id,
                    "Successfully booked appointment"
                );
            }
            other => {
                trx.rollback(tx).await;
                tracing::info!(outcome = ?other, "Appointment not booked");
            }
        }

        Ok(BookingDecision {
            appointment_id: row.appointment_id,
            outcome,
        })
    }

    async fn appointment_by_id(
        &self,
        svc: &Service,
        appointment_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Appointment, ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;

        let found = match sqlx::query_as::<_, Appointment>(GET_APPOINTMENT_BY_ID_QUERY)
            .bind(appointment_id)
            .bind(viewer_id)
            .fetch_optional(&mut *tx)
            .await
        {
            Ok(found) => found,
            Err(e) => return Err(trx.abort(tx, ApiError::db(e)).await),
        };

        trx.commit(tx).await?;

        let appointment = found.ok_or(ApiError::NotFound)?;
        tracing::info!(%appointment_id, "Successfully retrieved appointment");
        Ok(appointment)
    }

    async fn patient_history(
        &self,
        svc: &Service,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;

        let rows = match sqlx::query_as::<_, Appointment>(GET_PATIENT_HISTORY_QUERY)
            .bind(patient_id)
            .fetch_all(&mut *tx)
            .await
        {
            Ok(rows) => rows,
            Err(e) => return Err(trx.abort(tx, ApiError::db(e)).await),
        };

        trx.commit(tx).await?;
        tracing::info!(%patient_id, count = rows.len(), "Successfully retrieved patient history");
        Ok(rows)
    }

    async fn cancel_appointment(
        &self,
        svc: &Service,
        appointment_id: Uuid,
    ) -> Result<(), ApiError> {
        let trx = svc.transaction_manager();
        let mut tx = trx.begin().await?;
        tracing::info!(%appointment_id, "Transaction started for cancelling appointment");

        let deleted = match sqlx::query(CANCEL_APPOINTMENT_QUERY)
            .bind(appointment_id)
            .execute(&mut *tx)
            .await
        {
            Ok(done) => done.rows_affected(),
            Err(e) => return Err(trx.abort(tx, ApiError::db(e)).await),
        };

        if deleted == 0 {
            tracing::info!(%appointment_id, "No appointment to cancel");
            return Err(trx.abort(tx, ApiError::NotFound).await);
        }

        if let Err(e) = sqlx::query(DELETE_SLOT_QUERY)
            .bind(appointment_id)
            .execute(&mut *tx)
            .await
        {
            return Err(trx.abort(tx, ApiError::db(e)).await);
        }

        trx.commit(tx).await?;
        tracing::info!(%appointment_id, "Successfully cancelled appointment");
        Ok(())
    }
}
