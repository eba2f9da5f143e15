//! In-process stand-in for Postgres, used by use case and router tests.
//! Mirrors the booking rules and trigger bookkeeping of the SQL layer.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::{AdminRepository, AppointmentRepository, AuthRepository, DoctorRepository};
use crate::auth::{generate_access_token, hash_access_token, hash_password, verify_password};
use crate::error::ApiError;
use crate::models::{
    Appointment, Availability, BookingDecision, BookingOutcome, Doctor, DoctorAvailability,
    DoctorMostAppointments, DoctorOverTime, DoctorSlot, NewAppointment, NewSession, NewUser,
    PatientSlot, Role, ScheduleRequest, ScheduleRow, SessionIdentity, SessionTokenRow,
    SlotListing, UserRow,
};
use crate::service::Service;

const MAX_DAILY_APPOINTMENTS: i32 = 12;
const MAX_DAILY_MINUTES: i64 = 8 * 60;

#[derive(Debug, Clone)]
struct MemSchedule {
    schedule_id: Uuid,
    doctor_id: Uuid,
    date: Option<NaiveDate>,
    total_appointments: i32,
    total_minutes: i64,
    availability: Availability,
}

impl MemSchedule {
    fn to_row(&self) -> ScheduleRow {
        ScheduleRow {
            schedule_id: self.schedule_id,
            doctor_id: self.doctor_id,
            date: self.date,
            total_appointments: self.total_appointments,
            total_time: interval_text(self.total_minutes),
            availability: self.availability,
        }
    }
}

#[derive(Debug, Clone)]
struct MemAppointment {
    appointment_id: Uuid,
    slot_id: Uuid,
    doctor_id: Uuid,
    patient_id: Uuid,
    appointment_date: NaiveDate,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    seq: u64,
}

impl MemAppointment {
    fn minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

#[derive(Debug, Clone)]
struct MemSession {
    identity: SessionIdentity,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, UserRow>,
    sessions: HashMap<String, MemSession>,
    schedules: Vec<MemSchedule>,
    appointments: Vec<MemAppointment>,
    seq: u64,
}

impl State {
    fn user(&self, user_id: Uuid) -> Option<&UserRow> {
        self.users.get(&user_id)
    }

    fn name_of(&self, user_id: Uuid) -> String {
        self.user(user_id).map(|u| u.name.clone()).unwrap_or_default()
    }

    fn is_doctor(&self, user_id: Uuid) -> bool {
        self.user(user_id).is_some_and(|u| u.role == Role::Doctor)
    }

    fn governing_schedule(&self, doctor_id: Uuid, date: NaiveDate) -> Option<usize> {
        self.schedules
            .iter()
            .position(|s| s.doctor_id == doctor_id && s.date == Some(date))
            .or_else(|| {
                self.schedules
                    .iter()
                    .position(|s| s.doctor_id == doctor_id && s.date.is_none())
            })
    }

    fn dated_schedule(&self, doctor_id: Uuid, date: NaiveDate) -> Option<usize> {
        self.schedules
            .iter()
            .position(|s| s.doctor_id == doctor_id && s.date == Some(date))
    }

    fn view(&self, apt: &MemAppointment) -> Appointment {
        Appointment {
            appointment_id: apt.appointment_id,
            patient_id: apt.patient_id,
            patient_name: self.name_of(apt.patient_id),
            doctor_name: self.name_of(apt.doctor_id),
            start_time: apt.start_time,
            end_time: apt.end_time,
            status: "scheduled".to_string(),
        }
    }

    fn doctor_row(&self, user: &UserRow) -> Option<Doctor> {
        let available = self
            .schedules
            .iter()
            .any(|s| s.doctor_id == user.user_id && s.availability == Availability::Available);
        (user.role == Role::Doctor && available).then(|| Doctor {
            doctor_id: user.user_id,
            name: user.name.clone(),
            email: user.email.clone(),
            availability: Availability::Available,
        })
    }
}

/// Renders minutes the way Postgres prints an `interval` under `::text`.
fn interval_text(minutes: i64) -> String {
    format!("{:02}:{:02}:00", minutes / 60, minutes % 60)
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn seed_user(&self, username: &str, role: Role, password: &str) -> Uuid {
        let user_id = Uuid::new_v4();
        let row = UserRow {
            user_id,
            username: username.to_string(),
            name: username.to_string(),
            email: format!("{username}@clinic.test"),
            password_hash: hash_password(password).expect("hash"),
            role,
        };
        self.lock().users.insert(user_id, row);
        user_id
    }

    pub fn seed_schedule(&self, doctor_id: Uuid, date: Option<NaiveDate>, availability: Availability) {
        self.lock().schedules.push(MemSchedule {
            schedule_id: Uuid::new_v4(),
            doctor_id,
            date,
            total_appointments: 0,
            total_minutes: 0,
            availability,
        });
    }

    /// Opens an hour-long session for a seeded user and returns its bearer token.
    pub fn seed_session(&self, user_id: Uuid) -> String {
        let token = generate_access_token();
        let mut state = self.lock();
        let role = state.user(user_id).map(|u| u.role).expect("seeded user");
        state.sessions.insert(
            hash_access_token(&token),
            MemSession {
                identity: SessionIdentity {
                    session_token_id: Uuid::new_v4(),
                    user_id,
                    role,
                },
                expires_at: Utc::now() + chrono::Duration::hours(1),
                revoked: false,
            },
        );
        token
    }

    /// Current totals of the dated row, if one exists.
    pub fn totals(&self, doctor_id: Uuid, date: NaiveDate) -> Option<(i32, String)> {
        let state = self.lock();
        state
            .dated_schedule(doctor_id, date)
            .map(|i| &state.schedules[i])
            .map(|s| (s.total_appointments, interval_text(s.total_minutes)))
    }

    pub fn appointment_count(&self) -> usize {
        self.lock().appointments.len()
    }
}

#[async_trait]
impl AuthRepository for MemoryRepository {
    async fn register_user(&self, _svc: &Service, user: &NewUser) -> Result<Uuid, ApiError> {
        let mut state = self.lock();
        if state.users.values().any(|u| u.username == user.username) {
            return Err(ApiError::BadRequest("username is already taken".into()));
        }
        let user_id = Uuid::new_v4();
        state.users.insert(
            user_id,
            UserRow {
                user_id,
                username: user.username.clone(),
                name: user.name.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
                role: user.role,
            },
        );
        Ok(user_id)
    }

    async fn login_user(
        &self,
        _svc: &Service,
        username: &str,
        password: &str,
    ) -> Result<UserRow, ApiError> {
        let state = self.lock();
        let user = state
            .users
            .values()
            .find(|u| u.username == username)
            .ok_or(ApiError::UserNotFound)?;
        if !verify_password(password, &user.password_hash) {
            return Err(ApiError::InvalidPassword);
        }
        Ok(user.clone())
    }

    async fn create_session(
        &self,
        _svc: &Service,
        session: &NewSession,
    ) -> Result<SessionTokenRow, ApiError> {
        let mut state = self.lock();
        let role = state
            .user(session.user_id)
            .map(|u| u.role)
            .ok_or(ApiError::UserNotFound)?;
        let session_token_id = Uuid::new_v4();
        state.sessions.insert(
            session.token_hash.clone(),
            MemSession {
                identity: SessionIdentity {
                    session_token_id,
                    user_id: session.user_id,
                    role,
                },
                expires_at: session.expires_at,
                revoked: false,
            },
        );
        Ok(SessionTokenRow {
            session_token_id,
            expires_at: session.expires_at,
        })
    }

    async fn resolve_session(
        &self,
        _svc: &Service,
        token_hash: &str,
    ) -> Result<Option<SessionIdentity>, ApiError> {
        let state = self.lock();
        let now = Utc::now();
        Ok(state
            .sessions
            .get(token_hash)
            .filter(|s| !s.revoked && s.expires_at > now)
            .map(|s| s.identity.clone()))
    }

    async fn revoke_session(
        &self,
        _svc: &Service,
        session_token_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, ApiError> {
        let mut state = self.lock();
        let found = state.sessions.values_mut().find(|s| {
            s.identity.session_token_id == session_token_id
                && s.identity.user_id == user_id
                && !s.revoked
        });
        Ok(match found {
            Some(session) => {
                session.revoked = true;
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl DoctorRepository for MemoryRepository {
    async fn all_doctors(&self, _svc: &Service) -> Result<Vec<Doctor>, ApiError> {
        let state = self.lock();
        let mut doctors: Vec<Doctor> = state
            .users
            .values()
            .filter_map(|u| state.doctor_row(u))
            .collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(doctors)
    }

    async fn doctor_by_id(&self, _svc: &Service, doctor_id: Uuid) -> Result<Doctor, ApiError> {
        let state = self.lock();
        state
            .user(doctor_id)
            .and_then(|u| state.doctor_row(u))
            .ok_or(ApiError::NotFound)
    }

    async fn doctor_slots(
        &self,
        _svc: &Service,
        doctor_id: Uuid,
        with_booking_details: bool,
    ) -> Result<SlotListing, ApiError> {
        let state = self.lock();
        let mut booked: Vec<&MemAppointment> = state
            .appointments
            .iter()
            .filter(|a| a.doctor_id == doctor_id)
            .collect();
        booked.sort_by_key(|a| a.start_time);

        let listing = if with_booking_details {
            SlotListing::Doctor(
                booked
                    .iter()
                    .map(|a| DoctorSlot {
                        slot_id: a.slot_id,
                        appointment_id: a.appointment_id,
                        patient_id: Some(a.patient_id),
                        patient_name: state.user(a.patient_id).map(|u| u.name.clone()),
                        start_time: a.start_time,
                        end_time: a.end_time,
                        is_booked: true,
                        duration: interval_text(a.minutes()),
                    })
                    .collect(),
            )
        } else {
            SlotListing::Patient(
                booked
                    .iter()
                    .map(|a| PatientSlot {
                        slot_id: a.slot_id,
                        appointment_id: a.appointment_id,
                        start_time: a.start_time,
                        end_time: a.end_time,
                        is_booked: true,
                        duration: interval_text(a.minutes()),
                    })
                    .collect(),
            )
        };
        Ok(listing)
    }

    async fn upsert_schedule(
        &self,
        _svc: &Service,
        doctor_id: Uuid,
        schedule: &ScheduleRequest,
    ) -> Result<ScheduleRow, ApiError> {
        let mut state = self.lock();
        if !state.is_doctor(doctor_id) {
            return Err(ApiError::NotFound);
        }
        let existing = state
            .schedules
            .iter()
            .position(|s| s.doctor_id == doctor_id && s.date == schedule.date);
        let idx = match existing {
            Some(i) => {
                state.schedules[i].availability = schedule.availability;
                i
            }
            None => {
                state.schedules.push(MemSchedule {
                    schedule_id: Uuid::new_v4(),
                    doctor_id,
                    date: schedule.date,
                    total_appointments: 0,
                    total_minutes: 0,
                    availability: schedule.availability,
                });
                state.schedules.len() - 1
            }
        };
        Ok(state.schedules[idx].to_row())
    }
}

#[async_trait]
impl AppointmentRepository for MemoryRepository {
    async fn book_appointment(
        &self,
        _svc: &Service,
        appointment: &NewAppointment,
    ) -> Result<BookingDecision, ApiError> {
        let mut state = self.lock();
        let rejected = |outcome| Ok(BookingDecision { appointment_id: None, outcome });

        let clash = state.appointments.iter().any(|a| {
            a.doctor_id == appointment.doctor_id
                && a.appointment_date == appointment.appointment_date
                && a.start_time == appointment.start_time
        });
        if clash {
            return rejected(BookingOutcome::AppointmentExists);
        }

        let Some(idx) = state.governing_schedule(appointment.doctor_id, appointment.appointment_date)
        else {
            return rejected(BookingOutcome::ScheduleNotFound);
        };

        let minutes = (appointment.end_time - appointment.start_time).num_minutes();
        let governing = &state.schedules[idx];
        if governing.total_appointments + 1 > MAX_DAILY_APPOINTMENTS
            || governing.total_minutes + minutes > MAX_DAILY_MINUTES
        {
            return rejected(BookingOutcome::DoctorOverbooked);
        }

        // Same bookkeeping as the appointment_booked trigger.
        let dated = match state.dated_schedule(appointment.doctor_id, appointment.appointment_date) {
            Some(i) => i,
            None => {
                let availability = state.schedules[idx].availability;
                state.schedules.push(MemSchedule {
                    schedule_id: Uuid::new_v4(),
                    doctor_id: appointment.doctor_id,
                    date: Some(appointment.appointment_date),
                    total_appointments: 0,
                    total_minutes: 0,
                    availability,
                });
                state.schedules.len() - 1
            }
        };
        state.schedules[dated].total_appointments += 1;
        state.schedules[dated].total_minutes += minutes;

        state.seq += 1;
        let appointment_id = Uuid::new_v4();
        let seq = state.seq;
        state.appointments.push(MemAppointment {
            appointment_id,
            slot_id: Uuid::new_v4(),
            doctor_id: appointment.doctor_id,
            patient_id: appointment.patient_id,
            appointment_date: appointment.appointment_date,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            seq,
        });

        Ok(BookingDecision {
            appointment_id: Some(appointment_id),
            outcome: BookingOutcome::Valid,
        })
    }

    async fn appointment_by_id(
        &self,
        _svc: &Service,
        appointment_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Appointment, ApiError> {
        let state = self.lock();
        state
            .appointments
            .iter()
            .find(|a| {
                a.appointment_id == appointment_id
                    && (a.patient_id == viewer_id || a.doctor_id == viewer_id)
            })
            .map(|a| state.view(a))
            .ok_or(ApiError::NotFound)
    }

    async fn patient_history(
        &self,
        _svc: &Service,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, ApiError> {
        let state = self.lock();
        let mut rows: Vec<&MemAppointment> = state
            .appointments
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .collect();
        rows.sort_by(|a, b| b.seq.cmp(&a.seq));
        Ok(rows.into_iter().map(|a| state.view(a)).collect())
    }

    async fn cancel_appointment(
        &self,
        _svc: &Service,
        appointment_id: Uuid,
    ) -> Result<(), ApiError> {
        let mut state = self.lock();
        let Some(pos) = state
            .appointments
            .iter()
            .position(|a| a.appointment_id == appointment_id)
        else {
            return Err(ApiError::NotFound);
        };
        let removed = state.appointments.remove(pos);

        if let Some(i) = state.dated_schedule(removed.doctor_id, removed.appointment_date) {
            let schedule = &mut state.schedules[i];
            schedule.total_appointments = (schedule.total_appointments - 1).max(0);
            schedule.total_minutes = (schedule.total_minutes - removed.minutes()).max(0);
        }
        Ok(())
    }
}

#[async_trait]
impl AdminRepository for MemoryRepository {
    async fn doctors_availability(
        &self,
        _svc: &Service,
    ) -> Result<Vec<DoctorAvailability>, ApiError> {
        let state = self.lock();
        Ok(state
            .schedules
            .iter()
            .filter_map(|s| {
                state.user(s.doctor_id).map(|u| DoctorAvailability {
                    doctor_id: u.user_id,
                    doctor_name: u.name.clone(),
                    doctor_email: u.email.clone(),
                    appointment_date: s.date,
                    total_appointments: s.total_appointments,
                    total_time: interval_text(s.total_minutes),
                    availability: s.availability,
                })
            })
            .collect())
    }

    async fn doctors_most_appointments(
        &self,
        _svc: &Service,
        date: NaiveDate,
    ) -> Result<Vec<DoctorMostAppointments>, ApiError> {
        let state = self.lock();
        let mut rows: Vec<DoctorMostAppointments> = state
            .schedules
            .iter()
            .filter(|s| s.date == Some(date))
            .filter_map(|s| {
                state.user(s.doctor_id).map(|u| DoctorMostAppointments {
                    doctor_id: u.user_id,
                    doctor_name: u.name.clone(),
                    doctor_email: u.email.clone(),
                    total_appointments: s.total_appointments,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.total_appointments.cmp(&a.total_appointments));
        Ok(rows)
    }

    async fn doctors_over_six_hours(
        &self,
        _svc: &Service,
        date: NaiveDate,
    ) -> Result<Vec<DoctorOverTime>, ApiError> {
        let state = self.lock();
        let mut over: Vec<(i64, DoctorOverTime)> = state
            .schedules
            .iter()
            .filter(|s| s.date == Some(date) && s.total_minutes > 6 * 60)
            .filter_map(|s| {
                state.user(s.doctor_id).map(|u| {
                    (
                        s.total_minutes,
                        DoctorOverTime {
                            doctor_id: u.user_id,
                            doctor_name: u.name.clone(),
                            doctor_email: u.email.clone(),
                            total_time: interval_text(s.total_minutes),
                        },
                    )
                })
            })
            .collect();
        over.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(over.into_iter().map(|(_, row)| row).collect())
    }
}
