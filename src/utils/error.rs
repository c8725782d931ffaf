use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::engine::EngineError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// One or more seats were not eligible for the requested transition.
    /// A 409, never a 500: the client re-renders availability from the ids.
    #[error("Seat conflict")]
    SeatConflict(Vec<Uuid>),

    #[error("Seats not found")]
    SeatsNotFound(Vec<Uuid>),

    /// Row-lock wait exceeded its bound; the request is safe to retry.
    #[error("Lock wait timed out")]
    LockTimeout,

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::SeatConflict(_) => StatusCode::CONFLICT,
            AppError::SeatsNotFound(_) => StatusCode::NOT_FOUND,
            AppError::LockTimeout => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::SeatConflict(_) => "SEAT_CONFLICT",
            AppError::SeatsNotFound(_) => "SEATS_NOT_FOUND",
            AppError::LockTimeout => "LOCK_TIMEOUT",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            AppError::SeatConflict(seat_ids) | AppError::SeatsNotFound(seat_ids) => {
                Some(json!({ "seat_ids": seat_ids }))
            }
            _ => None,
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg) | AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::SeatConflict(seat_ids) | AppError::SeatsNotFound(seat_ids) => {
                warn!(error = ?self, seats = seat_ids.len(), "Seat operation rejected");
            }
            AppError::LockTimeout => {
                warn!("Seat row lock wait timed out");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Conflict { seat_ids } => AppError::SeatConflict(seat_ids),
            EngineError::SeatsNotFound { seat_ids } => AppError::SeatsNotFound(seat_ids),
            EngineError::InvalidRequest(msg) => AppError::ValidationError(msg),
            EngineError::LockWaitTimeout => AppError::LockTimeout,
            EngineError::Database(e) => AppError::DatabaseError(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level messages to the client
        let public_message = match &self {
            AppError::ValidationError(msg) => msg.clone(),
            AppError::SeatConflict(_) => {
                "One or more seats are not available for this operation".to_string()
            }
            AppError::SeatsNotFound(_) => "One or more seats do not exist".to_string(),
            AppError::LockTimeout => {
                "Could not acquire the seat locks in time, please retry".to_string()
            }
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::InternalServerError(msg) => msg.clone(),
        };

        let details = self.details();

        error_response(code, public_message, details, status)
    }
}
