use std::sync::Arc;

use crate::engine::{LockManager, Notifier, ReservationPromoter};

/// Shared handler state. The sweeper lives outside: it is spawned by the
/// binary and never called from a request path.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<LockManager>,
    pub promoter: Arc<ReservationPromoter>,
    pub notifier: Notifier,
}
