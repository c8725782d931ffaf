use chrono::Duration;

use super::error::EngineError;

/// TTL policy for seat locks. The engine owns the bounds: callers may ask
/// for a TTL, but holds can never outlive `max_ttl_secs`, so an abandoned
/// checkout cannot pin a seat indefinitely.
#[derive(Debug, Clone, Copy)]
pub struct LockPolicy {
    min_ttl_secs: u32,
    default_ttl_secs: u32,
    max_ttl_secs: u32,
}

impl LockPolicy {
    pub const DEFAULT_TTL_SECS: u32 = 300;
    pub const MIN_TTL_SECS: u32 = 30;
    pub const MAX_TTL_SECS: u32 = 1800;

    pub fn new(min_ttl_secs: u32, default_ttl_secs: u32, max_ttl_secs: u32) -> Result<Self, String> {
        if min_ttl_secs == 0 {
            return Err("minimum lock TTL must be positive".to_string());
        }
        if !(min_ttl_secs..=max_ttl_secs).contains(&default_ttl_secs) {
            return Err(format!(
                "default lock TTL {default_ttl_secs}s must lie within [{min_ttl_secs}s, {max_ttl_secs}s]"
            ));
        }
        Ok(Self {
            min_ttl_secs,
            default_ttl_secs,
            max_ttl_secs,
        })
    }

    /// Turn a caller-supplied TTL into the one the engine will use: the
    /// default when omitted, clamped into the policy bounds otherwise.
    /// A zero TTL is a caller bug, not something to round up silently.
    pub fn resolve(&self, requested_secs: Option<u32>) -> Result<Duration, EngineError> {
        let secs = match requested_secs {
            None => self.default_ttl_secs,
            Some(0) => {
                return Err(EngineError::InvalidRequest(
                    "ttl_seconds must be positive".to_string(),
                ))
            }
            Some(secs) => secs.clamp(self.min_ttl_secs, self.max_ttl_secs),
        };
        Ok(Duration::seconds(i64::from(secs)))
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::seconds(i64::from(self.default_ttl_secs))
    }
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            min_ttl_secs: Self::MIN_TTL_SECS,
            default_ttl_secs: Self::DEFAULT_TTL_SECS,
            max_ttl_secs: Self::MAX_TTL_SECS,
        }
    }
}
