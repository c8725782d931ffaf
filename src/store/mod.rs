//! Seat Store: the only place seat rows are read and written.
//!
//! Every mutating engine operation runs through [`SeatStore::transition`],
//! which loads exactly the targeted rows under exclusive row locks, hands an
//! immutable snapshot to a pure decision closure, and persists the changes
//! the closure returns in the same transaction. An `Err` from the closure
//! aborts the transaction, so all-or-nothing semantics are structural rather
//! than per-call-site discipline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::engine::error::EngineError;
use crate::models::{HolderId, NewSeat, Seat, SeatStatus};

pub mod memory;
pub mod postgres;

pub use memory::MemorySeatStore;
pub use postgres::PgSeatStore;

/// A single seat's new state, produced by a transition decision. Built only
/// through the constructors below, which keep the lock-field invariant
/// (locked if and only if holder and expiry are set) out of reach of call
/// sites.
#[derive(Debug, Clone)]
pub struct SeatChange {
    pub(crate) seat_id: Uuid,
    pub(crate) status: SeatStatus,
    pub(crate) holder_id: Option<HolderId>,
    pub(crate) lock_expires_at: Option<DateTime<Utc>>,
    pub(crate) booking_id: Option<Uuid>,
}

impl SeatChange {
    pub fn locked(seat_id: Uuid, holder: HolderId, expires_at: DateTime<Utc>) -> Self {
        Self {
            seat_id,
            status: SeatStatus::Locked,
            holder_id: Some(holder),
            lock_expires_at: Some(expires_at),
            booking_id: None,
        }
    }

    pub fn released(seat_id: Uuid) -> Self {
        Self {
            seat_id,
            status: SeatStatus::Available,
            holder_id: None,
            lock_expires_at: None,
            booking_id: None,
        }
    }

    pub fn booked(seat_id: Uuid, booking_id: Uuid) -> Self {
        Self {
            seat_id,
            status: SeatStatus::Booked,
            holder_id: None,
            lock_expires_at: None,
            booking_id: Some(booking_id),
        }
    }

    pub fn seat_id(&self) -> Uuid {
        self.seat_id
    }

    /// Mirror the change onto an in-memory row, the same write the backing
    /// store performs.
    pub(crate) fn apply_to(&self, seat: &mut Seat) {
        seat.status = self.status;
        seat.holder_id = self.holder_id.clone();
        seat.lock_expires_at = self.lock_expires_at;
        seat.booking_id = self.booking_id;
    }
}

/// What a committed transition did: the post-transition state of every
/// targeted seat (sorted by id) and the ids that were actually written.
#[derive(Debug)]
pub struct TransitionOutcome {
    pub seats: Vec<Seat>,
    pub changed_ids: Vec<Uuid>,
}

impl TransitionOutcome {
    pub fn changed_seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats
            .iter()
            .filter(|seat| self.changed_ids.contains(&seat.id))
    }
}

/// Decision closure for a transition: sees the locked rows (sorted by id),
/// returns the changes to persist, or an error to abort the transaction.
pub type TransitionFn =
    Box<dyn FnOnce(&[Seat]) -> Result<Vec<SeatChange>, EngineError> + Send>;

#[async_trait]
pub trait SeatStore: Send + Sync {
    /// Run `decide` over the targeted rows under exclusive row locks and
    /// persist its changes atomically. Rows are locked in ascending id
    /// order so transitions over overlapping seat sets serialize instead of
    /// deadlocking. Fails with `SeatsNotFound` if any id does not exist.
    async fn transition(
        &self,
        seat_ids: &[Uuid],
        decide: TransitionFn,
    ) -> Result<TransitionOutcome, EngineError>;

    /// Read-only snapshot of the targeted rows, no locks taken.
    async fn fetch(&self, seat_ids: &[Uuid]) -> Result<Vec<Seat>, EngineError>;

    /// Up to `limit` seats whose lock expired before `now`, oldest first.
    async fn expired_locks(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>, EngineError>;

    /// Seats currently associated with a booking.
    async fn seats_for_booking(&self, booking_id: Uuid) -> Result<Vec<Uuid>, EngineError>;

    /// Seed seats (admin tooling, fixtures). Returns the new ids.
    async fn insert_seats(&self, seats: &[NewSeat]) -> Result<Vec<Uuid>, EngineError>;
}

/// Request ids, deduplicated and in ascending order, which is the lock
/// acquisition order both backends use.
pub(crate) fn dedup_sorted(seat_ids: &[Uuid]) -> Vec<Uuid> {
    let mut ids = seat_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Missing ids, given the deduplicated request and the rows that came back.
pub(crate) fn missing_ids(requested: &[Uuid], found: &[Seat]) -> Vec<Uuid> {
    requested
        .iter()
        .filter(|id| !found.iter().any(|seat| seat.id == **id))
        .copied()
        .collect()
}
