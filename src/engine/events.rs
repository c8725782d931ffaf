use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{HolderId, SeatStatus};
use crate::store::TransitionOutcome;

/// Status-change notification, one per seat per transition. Consumed by the
/// SSE stream (and anything else downstream); delivery is fire-and-forget.
#[derive(Debug, Clone, Serialize)]
pub struct SeatStatusEvent {
    pub seat_id: Uuid,
    pub event_id: Uuid,
    pub status: SeatStatus,
    pub holder_id: Option<HolderId>,
    pub at: DateTime<Utc>,
}

/// Broadcast fan-out for seat status changes. A send failure (no live
/// subscriber, lagging receiver) must never fail the seat transition that
/// produced the event.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<SeatStatusEvent>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SeatStatusEvent> {
        self.tx.subscribe()
    }

    /// Emit one event per seat the transition actually changed.
    pub fn publish_outcome(&self, outcome: &TransitionOutcome, at: DateTime<Utc>) {
        for seat in outcome.changed_seats() {
            let event = SeatStatusEvent {
                seat_id: seat.id,
                event_id: seat.event_id,
                status: seat.status,
                holder_id: seat.holder_id.clone(),
                at,
            };
            if let Err(err) = self.tx.send(event) {
                tracing::debug!(seat_id = %seat.id, "no seat event subscribers: {err}");
            }
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(256)
    }
}
