use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use parterre_server::config::Config;
use parterre_server::engine::{
    spawn_sweeper, Clock, ExpirySweeper, LockManager, Notifier, ReservationPromoter, SystemClock,
};
use parterre_server::routes::create_routes;
use parterre_server::state::AppState;
use parterre_server::store::{PgSeatStore, SeatStore};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    let policy = config.lock_policy().expect("Invalid seat lock TTL policy");
    let store: Arc<dyn SeatStore> = Arc::new(PgSeatStore::new(
        pool,
        Duration::from_millis(config.lock_wait_timeout_ms),
    ));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifier = Notifier::new(config.seat_event_buffer);

    let manager = Arc::new(LockManager::new(
        store.clone(),
        clock.clone(),
        notifier.clone(),
        policy,
    ));
    let promoter = Arc::new(ReservationPromoter::new(
        store.clone(),
        clock.clone(),
        notifier.clone(),
    ));
    let sweeper = Arc::new(ExpirySweeper::new(
        store,
        clock,
        notifier.clone(),
        config.sweep_batch_size,
    ));
    let _sweeper_task = spawn_sweeper(sweeper, Duration::from_secs(config.sweep_interval_secs));

    let state = AppState {
        manager,
        promoter,
        notifier,
    };
    let app: Router = create_routes(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
