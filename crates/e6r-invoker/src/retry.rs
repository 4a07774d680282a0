use std::time::Duration;

use tracing::warn;

/// Total attempt budget per logical call (default 5).
pub const ENV_MAX_RETRY_ATTEMPTS: &str = "E6DATA_MAX_RETRY_ATTEMPTS";

/// Fixed backoff between attempts, in seconds (default 0.2).
pub const ENV_RETRY_BACKOFF: &str = "E6DATA_RETRY_BACKOFF";

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Attempt budget shared by both recoverable failure classes, plus the fixed
/// pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Policy from the environment; unusable values fall back to the
    /// defaults (configuration here is advisory, not fatal).
    pub fn from_env() -> RetryPolicy {
        let mut policy = RetryPolicy::default();
        if let Ok(raw) = std::env::var(ENV_MAX_RETRY_ATTEMPTS) {
            match raw.trim().parse::<u32>() {
                Ok(n) if n >= 1 => policy.max_attempts = n,
                _ => warn!(raw, "unparseable {ENV_MAX_RETRY_ATTEMPTS}; using default"),
            }
        }
        if let Ok(raw) = std::env::var(ENV_RETRY_BACKOFF) {
            match raw.trim().parse::<f64>() {
                Ok(secs) if secs.is_finite() && secs >= 0.0 => {
                    policy.backoff = Duration::from_secs_f64(secs)
                }
                _ => warn!(raw, "unparseable {ENV_RETRY_BACKOFF}; using default"),
            }
        }
        policy
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts, 5);
        assert_eq!(p.backoff, Duration::from_millis(200));
    }
}
