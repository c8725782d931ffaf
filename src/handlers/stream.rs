//! Server-sent seat status changes, filtered per event. Delivery is
//! best-effort by design: a slow consumer that lags the broadcast buffer
//! just misses events and should re-fetch availability.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::state::AppState;

pub async fn seat_status_stream(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.notifier.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(seat_event) if seat_event.event_id == event_id => {
                let data = serde_json::to_string(&seat_event).ok()?;
                Some(Ok(Event::default().event("seat_status").data(data)))
            }
            // Other events' seats, or a lagged receiver: nothing to send.
            _ => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new())
}
