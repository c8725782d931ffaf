//! Seat Lock Engine: transient, exclusive holds on seats during checkout.
//!
//! The engine keeps no in-process shared state. All coordination between
//! concurrent buyers happens through the Seat Store's transactional
//! guarantees; each public operation is one all-or-nothing transition over
//! exactly the rows it targets.

pub mod clock;
pub mod error;
pub mod events;
pub mod manager;
pub mod policy;
pub mod promoter;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::EngineError;
pub use events::{Notifier, SeatStatusEvent};
pub use manager::{Extended, LockGrant, LockManager, Released};
pub use policy::LockPolicy;
pub use promoter::{BookingReleased, Confirmed, ReservationPromoter};
pub use sweeper::{spawn_sweeper, ExpirySweeper};

use uuid::Uuid;

/// Validate and canonicalize a request's seat ids: non-empty, deduplicated,
/// ascending (the store's lock acquisition order).
pub(crate) fn normalize_ids(seat_ids: &[Uuid]) -> Result<Vec<Uuid>, EngineError> {
    if seat_ids.is_empty() {
        return Err(EngineError::InvalidRequest(
            "seat_ids must not be empty".to_string(),
        ));
    }
    let mut ids = seat_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}
