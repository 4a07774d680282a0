//! e6r-testkit
//!
//! Shared fixtures for the connector workspace: a scriptable in-memory
//! engine ([`MockEngine`]) implementing the full RPC surface, the matching
//! [`MockDial`], and byte-level encoders for the row-metadata stream so
//! decoder tests can build wire payloads without a live engine.
//!
//! The cross-crate scenario suite lives under this crate's `tests/`
//! directory.

mod encode;
mod mock;

pub use encode::{encode_batch, encode_result_meta, WireCell};
pub use mock::{CallRecord, MockDial, MockEngine};

use e6r_session::{ChannelOptions, Credentials, SessionConfig};

/// Route connector tracing into captured test output. Idempotent; scenario
/// rigs call it so `RUST_LOG=debug cargo test` shows the retry/pool story.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_test_writer()
        .try_init();
}

/// A session config that passes validation and points nowhere real — the
/// mock dial never opens a socket.
pub fn test_session_config() -> SessionConfig {
    SessionConfig {
        endpoint: "engine.test:50051".to_string(),
        cluster_uuid: None,
        credentials: Credentials {
            user: "alice@example.com".to_string(),
            token: "t0ken".to_string(),
        },
        options: ChannelOptions::default(),
    }
}
