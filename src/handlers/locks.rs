//! Lock lifecycle endpoints: thin translation between validated requests
//! and the engine. Holder identity arrives from the auth layer (or the
//! client's anonymous locker id) as an opaque string; Conflicts come back
//! as 409s with the offending seat ids, never as 500s.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::HolderId;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Deserialize)]
pub struct LockSeatsRequest {
    pub seat_ids: Vec<Uuid>,
    pub holder_id: String,
    pub ttl_seconds: Option<u32>,
}

#[derive(Serialize)]
struct LockGrantPayload {
    locked: Vec<Uuid>,
    holder_id: HolderId,
    expires_at: DateTime<Utc>,
}

pub async fn lock_seats(
    State(state): State<AppState>,
    Json(req): Json<LockSeatsRequest>,
) -> Result<Response, AppError> {
    let holder = parse_holder(&req.holder_id)?;
    let grant = state
        .manager
        .lock_seats(&req.seat_ids, &holder, req.ttl_seconds)
        .await?;

    let payload = LockGrantPayload {
        locked: grant.seat_ids,
        holder_id: grant.holder_id,
        expires_at: grant.expires_at,
    };
    Ok(success(payload, "Seats locked").into_response())
}

#[derive(Deserialize)]
pub struct ReleaseSeatsRequest {
    pub seat_ids: Vec<Uuid>,
    pub holder_id: String,
}

#[derive(Serialize)]
struct ReleasedPayload {
    released: Vec<Uuid>,
}

pub async fn release_seats(
    State(state): State<AppState>,
    Json(req): Json<ReleaseSeatsRequest>,
) -> Result<Response, AppError> {
    let holder = parse_holder(&req.holder_id)?;
    let released = state.manager.release_seats(&req.seat_ids, &holder).await?;

    let payload = ReleasedPayload {
        released: released.seat_ids,
    };
    Ok(success(payload, "Seats released").into_response())
}

#[derive(Deserialize)]
pub struct ExtendLockRequest {
    pub seat_ids: Vec<Uuid>,
    pub holder_id: String,
    pub ttl_seconds: u32,
}

#[derive(Serialize)]
struct ExtendedPayload {
    extended: Vec<Uuid>,
    expires_at: DateTime<Utc>,
}

pub async fn extend_lock(
    State(state): State<AppState>,
    Json(req): Json<ExtendLockRequest>,
) -> Result<Response, AppError> {
    let holder = parse_holder(&req.holder_id)?;
    let extended = state
        .manager
        .extend_lock(&req.seat_ids, &holder, req.ttl_seconds)
        .await?;

    let payload = ExtendedPayload {
        extended: extended.seat_ids,
        expires_at: extended.expires_at,
    };
    Ok(success(payload, "Lock extended").into_response())
}

#[derive(Deserialize)]
pub struct ConfirmSeatsRequest {
    pub seat_ids: Vec<Uuid>,
    pub holder_id: String,
    pub booking_id: Uuid,
}

#[derive(Serialize)]
struct ConfirmedPayload {
    confirmed: Vec<Uuid>,
    booking_id: Uuid,
}

pub async fn confirm_seats(
    State(state): State<AppState>,
    Json(req): Json<ConfirmSeatsRequest>,
) -> Result<Response, AppError> {
    let holder = parse_holder(&req.holder_id)?;
    let confirmed = state
        .promoter
        .confirm_seats(&req.seat_ids, &holder, req.booking_id)
        .await?;

    let payload = ConfirmedPayload {
        confirmed: confirmed.seat_ids,
        booking_id: confirmed.booking_id,
    };
    Ok(success(payload, "Seats confirmed").into_response())
}

/// Compensation endpoint for the booking layer: undo a promotion whose
/// booking-creation step failed downstream.
pub async fn release_booking_seats(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let released = state.promoter.release_booking_seats(booking_id).await?;

    let payload = ReleasedPayload {
        released: released.seat_ids,
    };
    Ok(success(payload, "Booking seats released").into_response())
}

fn parse_holder(raw: &str) -> Result<HolderId, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(
            "holder_id must not be empty".to_string(),
        ));
    }
    Ok(HolderId::new(trimmed))
}
