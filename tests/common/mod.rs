#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use parterre_server::engine::{
    ExpirySweeper, LockManager, LockPolicy, ManualClock, Notifier, ReservationPromoter,
};
use parterre_server::models::NewSeat;
use parterre_server::store::{MemorySeatStore, SeatStore};

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
}

pub struct TestEngine {
    pub store: Arc<MemorySeatStore>,
    pub clock: Arc<ManualClock>,
    pub notifier: Notifier,
    pub manager: Arc<LockManager>,
    pub promoter: Arc<ReservationPromoter>,
    pub sweeper: Arc<ExpirySweeper>,
    pub event_id: Uuid,
}

impl TestEngine {
    pub fn new(sweep_batch_size: i64) -> Self {
        let store = Arc::new(MemorySeatStore::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let notifier = Notifier::new(64);

        let store_dyn: Arc<dyn SeatStore> = store.clone();
        let clock_dyn: Arc<dyn parterre_server::engine::Clock> = clock.clone();

        let manager = Arc::new(LockManager::new(
            store_dyn.clone(),
            clock_dyn.clone(),
            notifier.clone(),
            LockPolicy::default(),
        ));
        let promoter = Arc::new(ReservationPromoter::new(
            store_dyn.clone(),
            clock_dyn.clone(),
            notifier.clone(),
        ));
        let sweeper = Arc::new(ExpirySweeper::new(
            store_dyn,
            clock_dyn,
            notifier.clone(),
            sweep_batch_size,
        ));

        Self {
            store,
            clock,
            notifier,
            manager,
            promoter,
            sweeper,
            event_id: Uuid::new_v4(),
        }
    }

    pub async fn seed_seats(&self, count: i32) -> Vec<Uuid> {
        let seats: Vec<NewSeat> = (1..=count)
            .map(|n| NewSeat {
                event_id: self.event_id,
                section: "Orchestra".to_string(),
                row_label: "A".to_string(),
                seat_number: n,
                price: Decimal::new(7500, 2),
                currency: "USD".to_string(),
            })
            .collect();
        self.store.insert_seats(&seats).await.unwrap()
    }
}

pub async fn engine_with_seats(count: i32) -> (TestEngine, Vec<Uuid>) {
    let engine = TestEngine::new(200);
    let ids = engine.seed_seats(count).await;
    (engine, ids)
}
