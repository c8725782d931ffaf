use std::env;
use std::str::FromStr;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::apply_security_headers;

use crate::engine::policy::LockPolicy;
use crate::engine::sweeper::DEFAULT_BATCH_SIZE;

pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub min_ttl_secs: u32,
    pub default_ttl_secs: u32,
    pub max_ttl_secs: u32,
    /// Bound on row-lock waits inside seat transactions.
    pub lock_wait_timeout_ms: u64,
    pub sweep_interval_secs: u64,
    pub sweep_batch_size: i64,
    /// Capacity of the seat status broadcast channel.
    pub seat_event_buffer: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/parterre".to_string()),
            port: env_or("PORT", 3001),
            min_ttl_secs: env_or("LOCK_MIN_TTL_SECS", LockPolicy::MIN_TTL_SECS),
            default_ttl_secs: env_or("LOCK_DEFAULT_TTL_SECS", LockPolicy::DEFAULT_TTL_SECS),
            max_ttl_secs: env_or("LOCK_MAX_TTL_SECS", LockPolicy::MAX_TTL_SECS),
            lock_wait_timeout_ms: env_or("LOCK_WAIT_TIMEOUT_MS", 2000),
            sweep_interval_secs: env_or("SWEEP_INTERVAL_SECS", 60),
            sweep_batch_size: env_or("SWEEP_BATCH_SIZE", DEFAULT_BATCH_SIZE),
            seat_event_buffer: env_or("SEAT_EVENT_BUFFER", 256),
        }
    }

    pub fn lock_policy(&self) -> Result<LockPolicy, String> {
        LockPolicy::new(self.min_ttl_secs, self.default_ttl_secs, self.max_ttl_secs)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Config: invalid value for {key}, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_on_missing_or_garbage() {
        env::remove_var("PARTERRE_TEST_MISSING");
        assert_eq!(env_or("PARTERRE_TEST_MISSING", 42u32), 42);

        env::set_var("PARTERRE_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("PARTERRE_TEST_GARBAGE", 7u32), 7);
        env::remove_var("PARTERRE_TEST_GARBAGE");
    }

    #[test]
    fn default_config_yields_a_valid_lock_policy() {
        let config = Config::from_env();
        assert!(config.lock_policy().is_ok());
    }
}
