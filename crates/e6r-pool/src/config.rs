use std::time::Duration;

use tracing::warn;

use crate::error::PoolError;

/// Channels kept warm (default 1).
pub const ENV_POOL_MIN: &str = "E6DATA_POOL_MIN";

/// Hard ceiling on resident channels (default 5).
pub const ENV_POOL_MAX: &str = "E6DATA_POOL_MAX";

/// Ephemeral channels allowed beyond `max` under pressure (default 0).
pub const ENV_POOL_OVERFLOW: &str = "E6DATA_POOL_OVERFLOW";

/// Recycle age in seconds; `0` disables recycling (default 3600).
pub const ENV_POOL_RECYCLE: &str = "E6DATA_POOL_RECYCLE";

// ---------------------------------------------------------------------------
// PoolConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Channels kept warm; replenished when recycling shrinks the pool.
    pub min: usize,
    /// Hard ceiling on resident channels.
    pub max: usize,
    /// Ephemeral channels allowed beyond `max` while every resident is busy.
    pub overflow: usize,
    /// Longest a caller waits for a free channel before `PoolExhausted`.
    pub acquire_timeout: Duration,
    /// Age at which a channel is destroyed on return; `None` disables.
    pub recycle_age: Option<Duration>,
    /// Run a cheap liveness probe before handing a reused channel out.
    pub pre_ping: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            min: 1,
            max: 5,
            overflow: 0,
            acquire_timeout: Duration::from_secs(30),
            recycle_age: Some(Duration::from_secs(3600)),
            pre_ping: false,
        }
    }
}

impl PoolConfig {
    /// Defaults overridden by whatever the environment supplies; unusable
    /// values are logged and skipped. Bounds are still validated fatally at
    /// pool construction.
    pub fn from_env() -> PoolConfig {
        let mut cfg = PoolConfig::default();
        if let Some(v) = env_usize(ENV_POOL_MIN) {
            cfg.min = v;
        }
        if let Some(v) = env_usize(ENV_POOL_MAX) {
            cfg.max = v;
        }
        if let Some(v) = env_usize(ENV_POOL_OVERFLOW) {
            cfg.overflow = v;
        }
        if let Some(v) = env_usize(ENV_POOL_RECYCLE) {
            cfg.recycle_age = if v == 0 {
                None
            } else {
                Some(Duration::from_secs(v as u64))
            };
        }
        cfg
    }

    /// `min ≤ max` and `max ≥ 1`; violations are construction-time errors.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max == 0 {
            return Err(PoolError::Config("pool max must be at least 1".to_string()));
        }
        if self.min > self.max {
            return Err(PoolError::Config(format!(
                "pool min ({}) exceeds max ({})",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

fn env_usize(name: &str) -> Option<usize> {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(raw, name, "unparseable pool option; using default");
                None
            }
        },
        Err(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
