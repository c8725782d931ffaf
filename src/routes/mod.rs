use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{apply_security_headers, create_cors_layer};
use crate::handlers::locks::{
    confirm_seats, extend_lock, lock_seats, release_booking_seats, release_seats,
};
use crate::handlers::seats::{bulk_check_availability, check_locks};
use crate::handlers::stream::seat_status_stream;
use crate::handlers::health_check;
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/api/locks", post(lock_seats))
        .route("/api/locks/release", post(release_seats))
        .route("/api/locks/extend", post(extend_lock))
        .route("/api/locks/confirm", post(confirm_seats))
        .route("/api/bookings/:booking_id/release", post(release_booking_seats))
        .route("/api/seats/status", post(check_locks))
        .route("/api/seats/availability", post(bulk_check_availability))
        .route("/api/events/:event_id/stream", get(seat_status_stream));

    apply_security_headers(router)
        .layer(create_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
