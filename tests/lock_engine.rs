//! End-to-end properties of the seat lock engine, driven against the
//! in-memory store with a manual clock so expiry is deterministic.

mod common;

use chrono::Duration;
use uuid::Uuid;

use common::{engine_with_seats, start_time};
use parterre_server::engine::EngineError;
use parterre_server::models::{HolderId, SeatStatus};
use parterre_server::store::SeatStore;

fn holder(id: &str) -> HolderId {
    HolderId::from(id)
}

#[tokio::test]
async fn checkout_scenario_end_to_end() {
    let (eng, ids) = engine_with_seats(3).await;
    let (s1, s2, s3) = (ids[0], ids[1], ids[2]);
    let (u1, u2) = (holder("U1"), holder("U2"));

    // U1 locks S1 and S2 for five minutes.
    let grant = eng.manager.lock_seats(&[s1, s2], &u1, Some(300)).await.unwrap();
    assert_eq!(grant.expires_at, start_time() + Duration::seconds(300));
    assert_eq!(grant.seat_ids.len(), 2);

    // U2 races for S2 and S3: the whole request fails, naming S2.
    let err = eng.manager.lock_seats(&[s2, s3], &u2, None).await.unwrap_err();
    match err {
        EngineError::Conflict { seat_ids } => assert_eq!(seat_ids, vec![s2]),
        other => panic!("expected Conflict, got {other:?}"),
    }

    // U1 extends the hold to ten minutes.
    let extended = eng.manager.extend_lock(&[s1, s2], &u1, 600).await.unwrap();
    assert_eq!(extended.expires_at, start_time() + Duration::seconds(600));

    // U2 cannot release U1's seats; the call is a silent no-op.
    let released = eng.manager.release_seats(&[s1], &u2).await.unwrap();
    assert!(released.seat_ids.is_empty());

    // Payment went through: U1's hold becomes booking B1.
    let booking_id = Uuid::new_v4();
    let confirmed = eng
        .promoter
        .confirm_seats(&[s1, s2], &u1, booking_id)
        .await
        .unwrap();
    assert_eq!(confirmed.seat_ids.len(), 2);

    // Booked seats refuse any further lock.
    let err = eng.manager.lock_seats(&[s1], &u2, None).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict { .. }));

    let seats = eng.store.fetch(&[s1, s2]).await.unwrap();
    for seat in &seats {
        assert_eq!(seat.status, SeatStatus::Booked);
        assert_eq!(seat.booking_id, Some(booking_id));
        assert!(seat.holder_id.is_none());
        assert!(seat.lock_expires_at.is_none());
    }
}

#[tokio::test]
async fn failed_lock_leaves_other_seats_untouched() {
    let (eng, ids) = engine_with_seats(3).await;
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    eng.manager.lock_seats(&[b], &holder("rival"), None).await.unwrap();

    let err = eng
        .manager
        .lock_seats(&[a, b, c], &holder("buyer"), None)
        .await
        .unwrap_err();
    match err {
        EngineError::Conflict { seat_ids } => assert_eq!(seat_ids, vec![b]),
        other => panic!("expected Conflict, got {other:?}"),
    }

    // a and c are exactly as they were before the failed call.
    let availability = eng.manager.bulk_check_availability(&[a, c]).await.unwrap();
    assert!(availability[&a]);
    assert!(availability[&c]);
}

#[tokio::test]
async fn expired_lock_is_lockable_without_sweeping() {
    let (eng, ids) = engine_with_seats(1).await;
    let seat = ids[0];

    eng.manager.lock_seats(&[seat], &holder("ghost"), Some(300)).await.unwrap();

    // Past expiry, nothing swept: the seat reads available...
    eng.clock.advance(Duration::seconds(301));
    let views = eng.manager.check_locks(&[seat]).await.unwrap();
    assert_eq!(views[0].status, SeatStatus::Available);
    assert!(views[0].holder_id.is_none());

    // ...and a new holder can take it.
    let grant = eng.manager.lock_seats(&[seat], &holder("buyer"), None).await.unwrap();
    assert_eq!(grant.seat_ids, vec![seat]);

    // The underlying row really changed hands.
    let seats = eng.store.fetch(&[seat]).await.unwrap();
    assert_eq!(seats[0].holder_id, Some(holder("buyer")));
}

#[tokio::test]
async fn foreign_holders_cannot_mutate_a_hold() {
    let (eng, ids) = engine_with_seats(2).await;
    let owner = holder("owner");
    let thief = holder("thief");

    eng.manager.lock_seats(&ids, &owner, None).await.unwrap();

    assert!(eng
        .manager
        .release_seats(&ids, &thief)
        .await
        .unwrap()
        .seat_ids
        .is_empty());
    assert!(matches!(
        eng.manager.extend_lock(&ids, &thief, 300).await.unwrap_err(),
        EngineError::Conflict { .. }
    ));
    assert!(matches!(
        eng.promoter
            .confirm_seats(&ids, &thief, Uuid::new_v4())
            .await
            .unwrap_err(),
        EngineError::Conflict { .. }
    ));

    // The owner's hold survived every attempt.
    let seats = eng.store.fetch(&ids).await.unwrap();
    for seat in &seats {
        assert_eq!(seat.status, SeatStatus::Locked);
        assert_eq!(seat.holder_id, Some(owner.clone()));
    }
}

#[tokio::test]
async fn release_is_idempotent() {
    let (eng, ids) = engine_with_seats(2).await;
    let buyer = holder("buyer");

    eng.manager.lock_seats(&ids, &buyer, None).await.unwrap();

    let first = eng.manager.release_seats(&ids, &buyer).await.unwrap();
    assert_eq!(first.seat_ids.len(), 2);

    let second = eng.manager.release_seats(&ids, &buyer).await.unwrap();
    assert!(second.seat_ids.is_empty());
}

#[tokio::test]
async fn extend_fails_whole_call_when_any_lock_lapsed() {
    let (eng, ids) = engine_with_seats(2).await;
    let buyer = holder("buyer");

    eng.manager.lock_seats(&[ids[0]], &buyer, Some(60)).await.unwrap();
    eng.clock.advance(Duration::seconds(30));
    eng.manager.lock_seats(&[ids[1]], &buyer, Some(60)).await.unwrap();

    // First lock lapses; second is still live.
    eng.clock.advance(Duration::seconds(45));
    let err = eng.manager.extend_lock(&ids, &buyer, 300).await.unwrap_err();
    match err {
        EngineError::Conflict { seat_ids } => assert_eq!(seat_ids, vec![ids[0]]),
        other => panic!("expected Conflict, got {other:?}"),
    }

    // The live lock kept its original expiry: no partial extension.
    let seats = eng.store.fetch(&[ids[1]]).await.unwrap();
    assert_eq!(
        seats[0].lock_expires_at,
        Some(start_time() + Duration::seconds(90))
    );
}

#[tokio::test]
async fn relock_by_same_holder_refreshes_the_hold() {
    let (eng, ids) = engine_with_seats(1).await;
    let buyer = holder("buyer");

    eng.manager.lock_seats(&ids, &buyer, Some(300)).await.unwrap();
    eng.clock.advance(Duration::seconds(200));

    let grant = eng.manager.lock_seats(&ids, &buyer, Some(300)).await.unwrap();
    assert_eq!(
        grant.expires_at,
        start_time() + Duration::seconds(200 + 300)
    );
}

#[tokio::test]
async fn ttl_is_clamped_to_policy_bounds() {
    let (eng, ids) = engine_with_seats(1).await;

    let grant = eng
        .manager
        .lock_seats(&ids, &holder("buyer"), Some(86_400))
        .await
        .unwrap();
    assert_eq!(grant.expires_at, start_time() + Duration::seconds(1800));

    assert!(matches!(
        eng.manager
            .lock_seats(&ids, &holder("buyer"), Some(0))
            .await
            .unwrap_err(),
        EngineError::InvalidRequest(_)
    ));
}

#[tokio::test]
async fn invalid_requests_are_rejected_before_touching_the_store() {
    let (eng, ids) = engine_with_seats(1).await;

    assert!(matches!(
        eng.manager
            .lock_seats(&[], &holder("buyer"), None)
            .await
            .unwrap_err(),
        EngineError::InvalidRequest(_)
    ));

    let unknown = Uuid::new_v4();
    match eng
        .manager
        .lock_seats(&[ids[0], unknown], &holder("buyer"), None)
        .await
        .unwrap_err()
    {
        EngineError::SeatsNotFound { seat_ids } => assert_eq!(seat_ids, vec![unknown]),
        other => panic!("expected SeatsNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn racing_lockers_produce_exactly_one_winner() {
    let (eng, ids) = engine_with_seats(1).await;
    let seat = ids[0];

    let mut handles = Vec::new();
    for i in 0..16 {
        let manager = eng.manager.clone();
        handles.push(tokio::spawn(async move {
            manager
                .lock_seats(&[seat], &HolderId::new(format!("buyer-{i}")), None)
                .await
        }));
    }

    let mut wins = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(EngineError::Conflict { seat_ids }) => {
                assert_eq!(seat_ids, vec![seat]);
                conflicts += 1;
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(conflicts, 15);
}

#[tokio::test]
async fn sweeper_releases_lapsed_locks_in_batches() {
    let eng = common::TestEngine::new(1);
    let ids = eng.seed_seats(4).await;

    eng.manager
        .lock_seats(&ids[..3], &holder("ghost"), Some(60))
        .await
        .unwrap();
    eng.clock.advance(Duration::seconds(45));
    eng.manager
        .lock_seats(&ids[3..], &holder("active"), Some(300))
        .await
        .unwrap();

    // Three locks lapsed, one is still live; batch size is 1, so the
    // sweeper loops until the scan comes back empty.
    eng.clock.advance(Duration::seconds(30));
    let released = eng.sweeper.sweep_expired_locks().await.unwrap();
    assert_eq!(released, 3);

    let views = eng.manager.check_locks(&ids).await.unwrap();
    let status_of = |id: Uuid| views.iter().find(|v| v.seat_id == id).unwrap().status;
    for id in &ids[..3] {
        assert_eq!(status_of(*id), SeatStatus::Available);
    }
    assert_eq!(status_of(ids[3]), SeatStatus::Locked);

    // Nothing left to sweep.
    assert_eq!(eng.sweeper.sweep_expired_locks().await.unwrap(), 0);
}

#[tokio::test]
async fn booking_compensation_reverts_and_is_idempotent() {
    let (eng, ids) = engine_with_seats(2).await;
    let buyer = holder("buyer");
    let booking_id = Uuid::new_v4();

    eng.manager.lock_seats(&ids, &buyer, None).await.unwrap();
    eng.promoter.confirm_seats(&ids, &buyer, booking_id).await.unwrap();

    // Downstream booking creation failed: compensate.
    let released = eng.promoter.release_booking_seats(booking_id).await.unwrap();
    assert_eq!(released.seat_ids.len(), 2);

    let availability = eng.manager.bulk_check_availability(&ids).await.unwrap();
    assert!(availability.values().all(|free| *free));

    let again = eng.promoter.release_booking_seats(booking_id).await.unwrap();
    assert!(again.seat_ids.is_empty());
}

#[tokio::test]
async fn transitions_emit_status_events() {
    let (eng, ids) = engine_with_seats(1).await;
    let seat = ids[0];
    let buyer = holder("buyer");
    let mut rx = eng.notifier.subscribe();

    eng.manager.lock_seats(&[seat], &buyer, None).await.unwrap();
    let locked = rx.recv().await.unwrap();
    assert_eq!(locked.seat_id, seat);
    assert_eq!(locked.event_id, eng.event_id);
    assert_eq!(locked.status, SeatStatus::Locked);
    assert_eq!(locked.holder_id, Some(buyer.clone()));

    eng.manager.release_seats(&[seat], &buyer).await.unwrap();
    let released = rx.recv().await.unwrap();
    assert_eq!(released.status, SeatStatus::Available);
    assert!(released.holder_id.is_none());

    let booking_id = Uuid::new_v4();
    eng.manager.lock_seats(&[seat], &buyer, None).await.unwrap();
    eng.promoter.confirm_seats(&[seat], &buyer, booking_id).await.unwrap();
    rx.recv().await.unwrap(); // locked again
    let booked = rx.recv().await.unwrap();
    assert_eq!(booked.status, SeatStatus::Booked);
}
