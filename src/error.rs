use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorObject,
}

#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub code: String,
    pub message: String,
}

/// Every failure a request can end in. Each kind maps to one fixed status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found")]
    NotFound,
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// Transport or transaction failure. The detail is logged, never sent.
    #[error("Database error: {0}")]
    Database(String),
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Unauthorized access")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Appointment duration is invalid. Minimum - 15 minutes, Maximum - 2 hours")]
    InvalidDuration,
    #[error("Appointment already exists for this time slot")]
    AppointmentExists,
    #[error("Schedule not found for Doctor")]
    NoSchedule,
    #[error("Cannot Schedule Appointment. All Appointments Booked")]
    DoctorOverbooked,
}

impl ApiError {
    pub fn db(e: sqlx::Error) -> Self {
        ApiError::Database(e.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound | ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidPassword | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::InvalidDuration | ApiError::NoSchedule | ApiError::DoctorOverbooked => {
                StatusCode::NOT_ACCEPTABLE
            }
            ApiError::AppointmentExists => StatusCode::CONFLICT,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound => "NOT_FOUND",
            ApiError::BadRequest(_) => "VALIDATION_ERROR",
            ApiError::Database(_) => "INTERNAL",
            ApiError::UserNotFound => "USER_NOT_FOUND",
            ApiError::InvalidPassword => "INVALID_PASSWORD",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::InvalidDuration => "INVALID_DURATION",
            ApiError::AppointmentExists => "APPOINTMENT_EXISTS",
            ApiError::NoSchedule => "SCHEDULE_NOT_FOUND",
            ApiError::DoctorOverbooked => "DOCTOR_OVERBOOKED",
        }
    }

    fn to_error_response(&self) -> Json<ErrorResponse> {
        let message = match self {
            ApiError::Database(_) => "Database error".to_string(),
            other => other.to_string(),
        };
        Json(ErrorResponse {
            error: ErrorObject {
                code: self.code().to_string(),
                message,
            },
        })
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Database(detail) = &self {
            tracing::error!(error = %detail, "request failed with database error");
        }
        (self.status(), self.to_error_response()).into_response()
    }
}
