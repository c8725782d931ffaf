//! Reservation Promoter: converts a live hold into a permanent booking, and
//! undoes that promotion when the downstream booking-creation step fails.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::models::{HolderId, SeatStatus};
use crate::store::{SeatChange, SeatStore};

use super::clock::Clock;
use super::error::EngineError;
use super::events::Notifier;
use super::normalize_ids;

/// Result of a successful promotion.
#[derive(Debug, Clone)]
pub struct Confirmed {
    pub seat_ids: Vec<Uuid>,
    pub booking_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct BookingReleased {
    pub seat_ids: Vec<Uuid>,
}

pub struct ReservationPromoter {
    store: Arc<dyn SeatStore>,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
}

impl ReservationPromoter {
    pub fn new(store: Arc<dyn SeatStore>, clock: Arc<dyn Clock>, notifier: Notifier) -> Self {
        Self {
            store,
            clock,
            notifier,
        }
    }

    /// Promote the hold on every targeted seat into `booking_id`.
    ///
    /// The ownership and liveness check is the same as for extending: every
    /// seat must carry a live lock owned by `holder`. A booking must never
    /// be created over a subset the buyer did not actually hold, so one
    /// lapsed or stolen seat fails the whole confirmation.
    pub async fn confirm_seats(
        &self,
        seat_ids: &[Uuid],
        holder: &HolderId,
        booking_id: Uuid,
    ) -> Result<Confirmed, EngineError> {
        let ids = normalize_ids(seat_ids)?;
        let now = self.clock.now();

        let decide_holder = holder.clone();
        let outcome = self
            .store
            .transition(
                &ids,
                Box::new(move |seats| {
                    let not_held: Vec<Uuid> = seats
                        .iter()
                        .filter(|seat| !seat.held_by(&decide_holder, now))
                        .map(|seat| seat.id)
                        .collect();
                    if !not_held.is_empty() {
                        return Err(EngineError::Conflict { seat_ids: not_held });
                    }
                    Ok(seats
                        .iter()
                        .map(|seat| SeatChange::booked(seat.id, booking_id))
                        .collect())
                }),
            )
            .await?;

        self.notifier.publish_outcome(&outcome, now);
        info!(
            holder = %holder,
            %booking_id,
            seats = outcome.changed_ids.len(),
            "hold promoted to booking"
        );
        Ok(Confirmed {
            seat_ids: outcome.changed_ids,
            booking_id,
        })
    }

    /// Compensation for a failed booking-creation step: revert every seat
    /// still associated with `booking_id` to available. Idempotent, so the
    /// booking layer may retry after a partial failure.
    pub async fn release_booking_seats(
        &self,
        booking_id: Uuid,
    ) -> Result<BookingReleased, EngineError> {
        let ids = self.store.seats_for_booking(booking_id).await?;
        if ids.is_empty() {
            return Ok(BookingReleased { seat_ids: vec![] });
        }
        let now = self.clock.now();

        let outcome = self
            .store
            .transition(
                &ids,
                Box::new(move |seats| {
                    Ok(seats
                        .iter()
                        .filter(|seat| {
                            seat.status == SeatStatus::Booked
                                && seat.booking_id == Some(booking_id)
                        })
                        .map(|seat| SeatChange::released(seat.id))
                        .collect())
                }),
            )
            .await?;

        self.notifier.publish_outcome(&outcome, now);
        info!(
            %booking_id,
            released = outcome.changed_ids.len(),
            "booking seats released"
        );
        Ok(BookingReleased {
            seat_ids: outcome.changed_ids,
        })
    }
}
