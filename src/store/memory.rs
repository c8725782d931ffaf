//! In-memory seat store. The map mutex plays the role of the database's row
//! locks: every transition holds it for the duration of the decide-and-apply
//! step, so transitions serialize exactly like their Postgres counterparts.
//! Used by the integration tests and as a database-free dev backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::engine::error::EngineError;
use crate::models::{NewSeat, Seat, SeatStatus};

use super::{dedup_sorted, missing_ids, SeatStore, TransitionFn, TransitionOutcome};

#[derive(Debug, Default)]
pub struct MemorySeatStore {
    seats: Mutex<BTreeMap<Uuid, Seat>>,
}

impl MemorySeatStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(
        seats: &BTreeMap<Uuid, Seat>,
        seat_ids: &[Uuid],
    ) -> Result<Vec<Seat>, EngineError> {
        let rows: Vec<Seat> = seat_ids
            .iter()
            .filter_map(|id| seats.get(id).cloned())
            .collect();
        if rows.len() != seat_ids.len() {
            return Err(EngineError::SeatsNotFound {
                seat_ids: missing_ids(seat_ids, &rows),
            });
        }
        Ok(rows)
    }
}

#[async_trait]
impl SeatStore for MemorySeatStore {
    async fn transition(
        &self,
        seat_ids: &[Uuid],
        decide: TransitionFn,
    ) -> Result<TransitionOutcome, EngineError> {
        let seat_ids = dedup_sorted(seat_ids);
        let mut seats = self.seats.lock().await;
        let rows = Self::snapshot(&seats, &seat_ids)?;

        let changes = decide(&rows)?;

        for change in &changes {
            if let Some(seat) = seats.get_mut(&change.seat_id) {
                change.apply_to(seat);
                seat.updated_at = Utc::now();
            }
        }

        Ok(TransitionOutcome {
            seats: seat_ids
                .iter()
                .map(|id| seats[id].clone())
                .collect(),
            changed_ids: changes.iter().map(|c| c.seat_id).collect(),
        })
    }

    async fn fetch(&self, seat_ids: &[Uuid]) -> Result<Vec<Seat>, EngineError> {
        let seat_ids = dedup_sorted(seat_ids);
        let seats = self.seats.lock().await;
        Self::snapshot(&seats, &seat_ids)
    }

    async fn expired_locks(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>, EngineError> {
        let seats = self.seats.lock().await;
        let mut expired: Vec<&Seat> = seats
            .values()
            .filter(|seat| {
                seat.status == SeatStatus::Locked
                    && seat.lock_expires_at.map_or(false, |at| at < now)
            })
            .collect();
        expired.sort_by_key(|seat| seat.lock_expires_at);
        Ok(expired
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|seat| seat.id)
            .collect())
    }

    async fn seats_for_booking(&self, booking_id: Uuid) -> Result<Vec<Uuid>, EngineError> {
        let seats = self.seats.lock().await;
        Ok(seats
            .values()
            .filter(|seat| seat.booking_id == Some(booking_id))
            .map(|seat| seat.id)
            .collect())
    }

    async fn insert_seats(&self, new_seats: &[NewSeat]) -> Result<Vec<Uuid>, EngineError> {
        let mut seats = self.seats.lock().await;
        let now = Utc::now();
        let mut ids = Vec::with_capacity(new_seats.len());
        for new_seat in new_seats {
            let id = Uuid::new_v4();
            seats.insert(
                id,
                Seat {
                    id,
                    event_id: new_seat.event_id,
                    section: new_seat.section.clone(),
                    row_label: new_seat.row_label.clone(),
                    seat_number: new_seat.seat_number,
                    price: new_seat.price,
                    currency: new_seat.currency.clone(),
                    status: SeatStatus::Available,
                    holder_id: None,
                    lock_expires_at: None,
                    booking_id: None,
                    created_at: now,
                    updated_at: now,
                },
            );
            ids.push(id);
        }
        Ok(ids)
    }
}
