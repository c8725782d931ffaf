//! Postgres seat store. One `sqlx` transaction per transition: a bounded
//! `SET LOCAL lock_timeout`, `SELECT ... FOR UPDATE` over the targeted rows
//! in id order, the decision closure, and one batched `UPDATE`. Concurrent
//! transitions on overlapping seat sets serialize on the row locks; whoever
//! gets there second sees committed state and fails cleanly.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::engine::error::EngineError;
use crate::models::{NewSeat, Seat};

use super::{dedup_sorted, missing_ids, SeatStore, TransitionFn, TransitionOutcome};

const SEAT_COLUMNS: &str = "id, event_id, section, row_label, seat_number, price, currency, \
     status, holder_id, lock_expires_at, booking_id, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgSeatStore {
    pool: PgPool,
    lock_wait: Duration,
}

impl PgSeatStore {
    pub fn new(pool: PgPool, lock_wait: Duration) -> Self {
        Self { pool, lock_wait }
    }
}

#[async_trait]
impl SeatStore for PgSeatStore {
    async fn transition(
        &self,
        seat_ids: &[Uuid],
        decide: TransitionFn,
    ) -> Result<TransitionOutcome, EngineError> {
        let seat_ids = dedup_sorted(seat_ids);
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // SET LOCAL does not take bind parameters; the value is our own config.
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_wait.as_millis()
        ))
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let rows: Vec<Seat> = sqlx::query_as(&format!(
            "SELECT {SEAT_COLUMNS} FROM seats WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        ))
        .bind(&seat_ids[..])
        .fetch_all(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if rows.len() != seat_ids.len() {
            return Err(EngineError::SeatsNotFound {
                seat_ids: missing_ids(&seat_ids, &rows),
            });
        }

        // Dropping `tx` on the error path rolls the transaction back.
        let changes = decide(&rows)?;

        let mut seats = rows;
        if !changes.is_empty() {
            let mut ids = Vec::with_capacity(changes.len());
            let mut statuses = Vec::with_capacity(changes.len());
            let mut holders = Vec::with_capacity(changes.len());
            let mut expiries = Vec::with_capacity(changes.len());
            let mut bookings = Vec::with_capacity(changes.len());
            for change in &changes {
                ids.push(change.seat_id);
                statuses.push(change.status.as_str().to_string());
                holders.push(change.holder_id.as_ref().map(|h| h.as_str().to_string()));
                expiries.push(change.lock_expires_at);
                bookings.push(change.booking_id);
            }

            sqlx::query(
                "UPDATE seats AS s \
                 SET status = u.status::seat_status, \
                     holder_id = u.holder_id, \
                     lock_expires_at = u.lock_expires_at, \
                     booking_id = u.booking_id, \
                     updated_at = now() \
                 FROM unnest($1::uuid[], $2::text[], $3::text[], $4::timestamptz[], $5::uuid[]) \
                     AS u(id, status, holder_id, lock_expires_at, booking_id) \
                 WHERE s.id = u.id",
            )
            .bind(&ids)
            .bind(&statuses)
            .bind(&holders)
            .bind(&expiries)
            .bind(&bookings)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

            for change in &changes {
                if let Some(seat) = seats.iter_mut().find(|s| s.id == change.seat_id) {
                    change.apply_to(seat);
                }
            }
        }

        tx.commit().await.map_err(map_db_error)?;

        Ok(TransitionOutcome {
            seats,
            changed_ids: changes.iter().map(|c| c.seat_id).collect(),
        })
    }

    async fn fetch(&self, seat_ids: &[Uuid]) -> Result<Vec<Seat>, EngineError> {
        let seat_ids = dedup_sorted(seat_ids);
        let rows: Vec<Seat> = sqlx::query_as(&format!(
            "SELECT {SEAT_COLUMNS} FROM seats WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(&seat_ids[..])
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        if rows.len() != seat_ids.len() {
            return Err(EngineError::SeatsNotFound {
                seat_ids: missing_ids(&seat_ids, &rows),
            });
        }
        Ok(rows)
    }

    async fn expired_locks(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>, EngineError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM seats \
             WHERE status = 'locked' AND lock_expires_at < $1 \
             ORDER BY lock_expires_at \
             LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(ids)
    }

    async fn seats_for_booking(&self, booking_id: Uuid) -> Result<Vec<Uuid>, EngineError> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM seats WHERE booking_id = $1 ORDER BY id")
                .bind(booking_id)
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_error)?;
        Ok(ids)
    }

    async fn insert_seats(&self, seats: &[NewSeat]) -> Result<Vec<Uuid>, EngineError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        let mut ids = Vec::with_capacity(seats.len());
        for seat in seats {
            let id: Uuid = sqlx::query_scalar(
                "INSERT INTO seats (event_id, section, row_label, seat_number, price, currency) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING id",
            )
            .bind(seat.event_id)
            .bind(&seat.section)
            .bind(&seat.row_label)
            .bind(seat.seat_number)
            .bind(seat.price)
            .bind(&seat.currency)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;
            ids.push(id);
        }
        tx.commit().await.map_err(map_db_error)?;
        Ok(ids)
    }
}

/// Lock-wait failures get their own variant so the HTTP layer can answer
/// "retry" instead of "conflict". 55P03 is lock_not_available (lock_timeout),
/// 57014 is query_canceled (statement_timeout).
fn map_db_error(err: sqlx::Error) -> EngineError {
    if let sqlx::Error::Database(db) = &err {
        if let Some(code) = db.code() {
            if code == "55P03" || code == "57014" {
                return EngineError::LockWaitTimeout;
            }
        }
    }
    EngineError::Database(err)
}
