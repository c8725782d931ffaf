//! Read-only seat queries. Lapsed locks read as available here even when
//! the sweeper has not cleared them yet, matching what a lock attempt would
//! find.

use std::collections::HashMap;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::SeatLockView;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Deserialize)]
pub struct SeatIdsRequest {
    pub seat_ids: Vec<Uuid>,
}

#[derive(Serialize)]
struct LockStatusPayload {
    seats: Vec<SeatLockView>,
}

pub async fn check_locks(
    State(state): State<AppState>,
    Json(req): Json<SeatIdsRequest>,
) -> Result<Response, AppError> {
    let seats = state.manager.check_locks(&req.seat_ids).await?;
    Ok(success(LockStatusPayload { seats }, "Seat lock status").into_response())
}

#[derive(Serialize)]
struct AvailabilityPayload {
    seats: HashMap<Uuid, bool>,
}

pub async fn bulk_check_availability(
    State(state): State<AppState>,
    Json(req): Json<SeatIdsRequest>,
) -> Result<Response, AppError> {
    let seats = state.manager.bulk_check_availability(&req.seat_ids).await?;
    Ok(success(AvailabilityPayload { seats }, "Seat availability").into_response())
}
