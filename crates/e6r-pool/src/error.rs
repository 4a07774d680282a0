use std::fmt;

use e6r_session::SessionError;

// ---------------------------------------------------------------------------
// PoolError
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum PoolError {
    /// Invalid pool bounds. Fatal at construction time.
    Config(String),
    /// Channel (session) creation failed; propagated from acquire.
    Create(SessionError),
    /// No channel became free within `acquire_timeout`.
    Exhausted,
    /// The pool was closed; waiters and late acquirers both see this.
    Closed,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Config(msg) => write!(f, "pool config error: {msg}"),
            PoolError::Create(e) => write!(f, "channel creation failed: {e}"),
            PoolError::Exhausted => write!(f, "pool exhausted: no channel within acquire timeout"),
            PoolError::Closed => write!(f, "pool closed"),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PoolError::Create(e) => Some(e),
            _ => None,
        }
    }
}
