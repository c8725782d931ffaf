use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Owner of a seat lock: an authenticated user id or the anonymous locker id
/// a guest session carries. Ownership checks compare the opaque value only,
/// so both kinds of holder go through the same code paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct HolderId(String);

impl HolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HolderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "seat_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Locked,
    Booked,
    /// Administratively disabled via seat map tooling; never set by the engine.
    Unavailable,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "available",
            SeatStatus::Locked => "locked",
            SeatStatus::Booked => "booked",
            SeatStatus::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Seat {
    pub id: Uuid,
    pub event_id: Uuid,
    pub section: String,
    pub row_label: String,
    pub seat_number: i32,
    pub price: Decimal,
    pub currency: String,
    pub status: SeatStatus,
    pub holder_id: Option<HolderId>,
    pub lock_expires_at: Option<DateTime<Utc>>,
    pub booking_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Seat {
    /// The lock has logically lapsed, whether or not the sweeper has
    /// physically cleared it yet.
    pub fn lock_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.status == SeatStatus::Locked && self.lock_expires_at.map_or(true, |at| at <= now)
    }

    /// Status as callers should see it, with lazy expiry applied: a lapsed
    /// lock reads as available even before the sweeper runs.
    pub fn effective_status(&self, now: DateTime<Utc>) -> SeatStatus {
        if self.lock_lapsed(now) {
            SeatStatus::Available
        } else {
            self.status
        }
    }

    /// Live lock owned by `holder`.
    pub fn held_by(&self, holder: &HolderId, now: DateTime<Utc>) -> bool {
        self.status == SeatStatus::Locked
            && !self.lock_lapsed(now)
            && self.holder_id.as_ref() == Some(holder)
    }

    /// Whether `holder` may take a lock on this seat right now. A live lock
    /// held by the same holder counts: re-locking refreshes the hold.
    pub fn lockable_by(&self, holder: &HolderId, now: DateTime<Utc>) -> bool {
        match self.effective_status(now) {
            SeatStatus::Available => true,
            SeatStatus::Locked => self.holder_id.as_ref() == Some(holder),
            SeatStatus::Booked | SeatStatus::Unavailable => false,
        }
    }
}

/// Per-seat answer for lock status queries. Lapsed locks are reported as
/// available with no holder or expiry.
#[derive(Debug, Clone, Serialize)]
pub struct SeatLockView {
    pub seat_id: Uuid,
    pub status: SeatStatus,
    pub holder_id: Option<HolderId>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SeatLockView {
    pub fn of(seat: &Seat, now: DateTime<Utc>) -> Self {
        let status = seat.effective_status(now);
        let (holder_id, expires_at) = if status == SeatStatus::Locked {
            (seat.holder_id.clone(), seat.lock_expires_at)
        } else {
            (None, None)
        };
        Self {
            seat_id: seat.id,
            status,
            holder_id,
            expires_at,
        }
    }
}

/// Seed row for inserting seats (admin tooling, fixtures, tests).
#[derive(Debug, Clone, Deserialize)]
pub struct NewSeat {
    pub event_id: Uuid,
    pub section: String,
    pub row_label: String,
    pub seat_number: i32,
    pub price: Decimal,
    pub currency: String,
}
