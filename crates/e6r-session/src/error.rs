use std::fmt;

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Errors surfaced by session construction, channel building and
/// (re-)authentication.
///
/// `Config` is fatal at construction time; `Rpc` wraps the transport status
/// of a failed call after the recoverable classes have already been handled.
#[derive(Debug)]
pub enum SessionError {
    /// Invalid endpoint, TLS material or channel option. Not retryable.
    Config(String),
    /// The underlying RPC failed and was not recovered.
    Rpc(tonic::Status),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Config(msg) => write!(f, "session config error: {msg}"),
            SessionError::Rpc(status) => {
                write!(f, "session rpc error: {} ({})", status.message(), status.code())
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Config(_) => None,
            SessionError::Rpc(status) => Some(status),
        }
    }
}

impl From<tonic::Status> for SessionError {
    fn from(status: tonic::Status) -> Self {
        SessionError::Rpc(status)
    }
}
