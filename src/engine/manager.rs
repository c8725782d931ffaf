//! Lock Manager: the only component that transitions seat status. Every
//! mutating call is a single store transition over exactly the targeted
//! rows; coordination between concurrent buyers comes entirely from the
//! store's row locks, never from in-process state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::models::{HolderId, SeatLockView, SeatStatus};
use crate::store::{SeatChange, SeatStore};

use super::clock::Clock;
use super::error::EngineError;
use super::events::Notifier;
use super::normalize_ids;
use super::policy::LockPolicy;

/// Result of a successful `lock_seats`: the hold. All seats share one expiry.
#[derive(Debug, Clone)]
pub struct LockGrant {
    pub seat_ids: Vec<Uuid>,
    pub holder_id: HolderId,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Released {
    pub seat_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct Extended {
    pub seat_ids: Vec<Uuid>,
    pub expires_at: DateTime<Utc>,
}

pub struct LockManager {
    store: Arc<dyn SeatStore>,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
    policy: LockPolicy,
}

impl LockManager {
    pub fn new(
        store: Arc<dyn SeatStore>,
        clock: Arc<dyn Clock>,
        notifier: Notifier,
        policy: LockPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            notifier,
            policy,
        }
    }

    /// Lock every requested seat for `holder`, or none of them.
    ///
    /// A seat is eligible if it is available, if its current lock has
    /// lapsed (lazy expiry: the sweeper need not have run), or if the
    /// live lock already belongs to `holder` (re-locking refreshes the
    /// hold). Any ineligible seat fails the whole request with a Conflict
    /// naming the offenders, so a buyer never ends up holding a partial,
    /// unusable subset.
    pub async fn lock_seats(
        &self,
        seat_ids: &[Uuid],
        holder: &HolderId,
        ttl_seconds: Option<u32>,
    ) -> Result<LockGrant, EngineError> {
        let ids = normalize_ids(seat_ids)?;
        let ttl = self.policy.resolve(ttl_seconds)?;
        let now = self.clock.now();
        let expires_at = now + ttl;

        let decide_holder = holder.clone();
        let outcome = self
            .store
            .transition(
                &ids,
                Box::new(move |seats| {
                    let conflicts: Vec<Uuid> = seats
                        .iter()
                        .filter(|seat| !seat.lockable_by(&decide_holder, now))
                        .map(|seat| seat.id)
                        .collect();
                    if !conflicts.is_empty() {
                        return Err(EngineError::Conflict {
                            seat_ids: conflicts,
                        });
                    }
                    Ok(seats
                        .iter()
                        .map(|seat| {
                            SeatChange::locked(seat.id, decide_holder.clone(), expires_at)
                        })
                        .collect())
                }),
            )
            .await?;

        self.notifier.publish_outcome(&outcome, now);
        info!(
            holder = %holder,
            seats = outcome.changed_ids.len(),
            %expires_at,
            "seats locked"
        );
        Ok(LockGrant {
            seat_ids: outcome.changed_ids,
            holder_id: holder.clone(),
            expires_at,
        })
    }

    /// Release the targeted seats that `holder` currently holds; skip the
    /// rest silently. Releasing is idempotent: a lock that already expired
    /// and was swept, or never existed, simply is not in the result.
    pub async fn release_seats(
        &self,
        seat_ids: &[Uuid],
        holder: &HolderId,
    ) -> Result<Released, EngineError> {
        let ids = normalize_ids(seat_ids)?;
        let now = self.clock.now();

        let decide_holder = holder.clone();
        let outcome = self
            .store
            .transition(
                &ids,
                Box::new(move |seats| {
                    Ok(seats
                        .iter()
                        // An expired-but-unswept lock still owned by the
                        // holder is released too; that just beats the sweeper.
                        .filter(|seat| {
                            seat.status == SeatStatus::Locked
                                && seat.holder_id.as_ref() == Some(&decide_holder)
                        })
                        .map(|seat| SeatChange::released(seat.id))
                        .collect())
                }),
            )
            .await?;

        self.notifier.publish_outcome(&outcome, now);
        info!(
            holder = %holder,
            released = outcome.changed_ids.len(),
            "seats released"
        );
        Ok(Released {
            seat_ids: outcome.changed_ids,
        })
    }

    /// Push the expiry of an existing hold forward. Fail-fast: if any
    /// targeted seat is not currently held by `holder` (lapsed, stolen, or
    /// never locked), nothing is extended and the Conflict names those
    /// seats, so the client re-fetches state instead of trusting a partial
    /// extension.
    pub async fn extend_lock(
        &self,
        seat_ids: &[Uuid],
        holder: &HolderId,
        ttl_seconds: u32,
    ) -> Result<Extended, EngineError> {
        let ids = normalize_ids(seat_ids)?;
        let ttl = self.policy.resolve(Some(ttl_seconds))?;
        let now = self.clock.now();
        let expires_at = now + ttl;

        let decide_holder = holder.clone();
        let outcome = self
            .store
            .transition(
                &ids,
                Box::new(move |seats| {
                    let lapsed: Vec<Uuid> = seats
                        .iter()
                        .filter(|seat| !seat.held_by(&decide_holder, now))
                        .map(|seat| seat.id)
                        .collect();
                    if !lapsed.is_empty() {
                        return Err(EngineError::Conflict { seat_ids: lapsed });
                    }
                    Ok(seats
                        .iter()
                        .map(|seat| {
                            SeatChange::locked(seat.id, decide_holder.clone(), expires_at)
                        })
                        .collect())
                }),
            )
            .await?;

        info!(
            holder = %holder,
            seats = outcome.changed_ids.len(),
            %expires_at,
            "lock extended"
        );
        Ok(Extended {
            seat_ids: outcome.changed_ids,
            expires_at,
        })
    }

    /// Read-only lock status for the targeted seats, lazy expiry applied.
    pub async fn check_locks(
        &self,
        seat_ids: &[Uuid],
    ) -> Result<Vec<SeatLockView>, EngineError> {
        let ids = normalize_ids(seat_ids)?;
        let now = self.clock.now();
        let seats = self.store.fetch(&ids).await?;
        Ok(seats
            .iter()
            .map(|seat| SeatLockView::of(seat, now))
            .collect())
    }

    /// Convenience wrapper over `check_locks`: true for each seat a lock
    /// attempt could take right now.
    pub async fn bulk_check_availability(
        &self,
        seat_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, bool>, EngineError> {
        let views = self.check_locks(seat_ids).await?;
        Ok(views
            .into_iter()
            .map(|view| (view.seat_id, view.status == SeatStatus::Available))
            .collect())
    }
}
