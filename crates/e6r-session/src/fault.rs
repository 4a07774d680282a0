use tonic::Status;

use e6r_schemas::{ACCESS_DENIED_MARKER, WRONG_STRATEGY_MARKER};

// ---------------------------------------------------------------------------
// FaultClass
// ---------------------------------------------------------------------------

/// The three ways an engine RPC can fail, as far as recovery is concerned.
///
/// Only the first two are ever retried (by the invoker); `Other` covers
/// transport failures, deadlines and genuine query errors, all of which
/// surface to the caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// The session id (or the credentials behind it) was rejected.
    AccessDenied,
    /// The request carried a deployment tag the server no longer serves.
    WrongStrategy,
    Other,
}

/// Classify a failed RPC by the distinguished markers the engine embeds in
/// the error text. The wrong-strategy marker may appear bare (`"456"`) or as
/// `"status: 456"`; both the message and the binary details are searched.
pub fn classify(status: &Status) -> FaultClass {
    let details = String::from_utf8_lossy(status.details());
    if status.message().contains(ACCESS_DENIED_MARKER) || details.contains(ACCESS_DENIED_MARKER) {
        return FaultClass::AccessDenied;
    }
    if status.message().contains(WRONG_STRATEGY_MARKER) || details.contains(WRONG_STRATEGY_MARKER) {
        return FaultClass::WrongStrategy;
    }
    FaultClass::Other
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn access_denied_marker_in_message() {
        let s = Status::new(Code::Unauthenticated, "Access denied: session expired");
        assert_eq!(classify(&s), FaultClass::AccessDenied);
    }

    #[test]
    fn wrong_strategy_marker_in_details() {
        let s = Status::with_details(
            Code::Internal,
            "engine rejected request",
            "status: 456".as_bytes().to_vec().into(),
        );
        assert_eq!(classify(&s), FaultClass::WrongStrategy);
    }

    #[test]
    fn bare_marker_in_message() {
        let s = Status::new(Code::Internal, "456");
        assert_eq!(classify(&s), FaultClass::WrongStrategy);
    }

    #[test]
    fn access_denied_wins_over_wrong_strategy() {
        // Both markers present: auth recovery runs first; rediscovery would
        // fail anyway while the session is dead.
        let s = Status::new(Code::Internal, "Access denied (status: 456)");
        assert_eq!(classify(&s), FaultClass::AccessDenied);
    }

    #[test]
    fn everything_else_is_other() {
        let s = Status::new(Code::Unavailable, "connection reset by peer");
        assert_eq!(classify(&s), FaultClass::Other);
        let s = Status::new(Code::DeadlineExceeded, "deadline exceeded");
        assert_eq!(classify(&s), FaultClass::Other);
    }
}
