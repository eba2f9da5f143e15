//! Thin application layer between handlers and repositories.
//!
//! Each use case holds its repository behind an `Arc<dyn ..>` so the router
//! can run against Postgres in production and an in-memory store in tests.

pub mod admin;
pub mod appointment;
pub mod auth;
pub mod doctor;

pub use admin::AdminUsecase;
pub use appointment::AppointmentUsecase;
pub use auth::AuthUsecase;
pub use doctor::DoctorUsecase;
