use thiserror::Error;
use uuid::Uuid;

/// Failures a seat transition can produce. Every multi-seat operation is
/// all-or-nothing: an error here means no seat was mutated.
#[derive(Debug, Error)]
pub enum EngineError {
    /// One or more seats are not eligible for the requested transition
    /// (held by another live lock, booked, or unavailable). Always carries
    /// the offending seat ids so clients can re-render availability.
    #[error("seats not eligible for the requested transition: {seat_ids:?}")]
    Conflict { seat_ids: Vec<Uuid> },

    #[error("seats do not exist: {seat_ids:?}")]
    SeatsNotFound { seat_ids: Vec<Uuid> },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Bounded row-lock wait exceeded; the caller may retry.
    #[error("timed out waiting for seat row locks")]
    LockWaitTimeout,

    #[error("database error")]
    Database(#[from] sqlx::Error),
}
