//! Expiry Sweeper: reverts lapsed locks to available in bounded batches.
//!
//! This is a safety net, not the expiry mechanism itself. Locking,
//! extending, and confirming all apply lazy expiry on their own, so
//! correctness never depends on sweep timing; the sweeper exists so seats
//! nobody re-requests do not sit as stale `locked` rows in listings.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::store::{SeatChange, SeatStore};

use super::clock::Clock;
use super::error::EngineError;
use super::events::Notifier;

pub const DEFAULT_BATCH_SIZE: i64 = 200;

pub struct ExpirySweeper {
    store: Arc<dyn SeatStore>,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
    batch_size: i64,
}

impl ExpirySweeper {
    pub fn new(
        store: Arc<dyn SeatStore>,
        clock: Arc<dyn Clock>,
        notifier: Notifier,
        batch_size: i64,
    ) -> Self {
        Self {
            store,
            clock,
            notifier,
            batch_size: batch_size.max(1),
        }
    }

    /// Sweep every lapsed lock, one short transaction per batch, and return
    /// the number of seats released. Expiry is re-checked under the row
    /// lock, so a lock refreshed between the scan and the transition
    /// survives the sweep.
    pub async fn sweep_expired_locks(&self) -> Result<u64, EngineError> {
        let mut released = 0u64;
        loop {
            let now = self.clock.now();
            let expired = self.store.expired_locks(now, self.batch_size).await?;
            if expired.is_empty() {
                break;
            }

            let outcome = self
                .store
                .transition(
                    &expired,
                    Box::new(move |seats| {
                        Ok(seats
                            .iter()
                            .filter(|seat| seat.lock_lapsed(now))
                            .map(|seat| SeatChange::released(seat.id))
                            .collect())
                    }),
                )
                .await?;

            released += outcome.changed_ids.len() as u64;
            self.notifier.publish_outcome(&outcome, now);
        }
        Ok(released)
    }
}

/// Periodic trigger for the sweeper. The engine does not schedule itself;
/// this is the in-process stand-in for the external cron the deployment
/// would otherwise provide.
pub fn spawn_sweeper(sweeper: Arc<ExpirySweeper>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match sweeper.sweep_expired_locks().await {
                Ok(0) => {}
                Ok(count) => info!(released = count, "swept expired seat locks"),
                Err(err) => error!(error = %err, "seat lock sweep failed"),
            }
        }
    })
}
