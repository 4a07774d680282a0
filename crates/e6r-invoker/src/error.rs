use std::fmt;

use e6r_session::SessionError;

// ---------------------------------------------------------------------------
// InvokerError
// ---------------------------------------------------------------------------

/// What an invoked operation can fail with after recovery has been
/// exhausted (or was never applicable).
#[derive(Debug)]
pub enum InvokerError {
    /// Session construction / (re-)authentication failed.
    Session(SessionError),
    /// The RPC itself failed and the failure class is not recoverable, or
    /// the attempt budget ran out.
    Rpc(tonic::Status),
}

impl fmt::Display for InvokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokerError::Session(e) => write!(f, "{e}"),
            InvokerError::Rpc(status) => {
                write!(f, "rpc failed: {} ({})", status.message(), status.code())
            }
        }
    }
}

impl std::error::Error for InvokerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InvokerError::Session(e) => Some(e),
            InvokerError::Rpc(status) => Some(status),
        }
    }
}

impl From<SessionError> for InvokerError {
    fn from(e: SessionError) -> Self {
        InvokerError::Session(e)
    }
}
