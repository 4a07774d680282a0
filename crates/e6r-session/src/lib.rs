//! e6r-session
//!
//! Owns the authenticated engine session: one lazily-connected gRPC channel
//! at a time (plain or TLS), the session id obtained from `authenticate`,
//! strategy discovery over the fixed blue→green probe order, and serialized
//! re-authentication when the server rejects the session.
//!
//! The seam to the transport is the [`EngineRpc`] trait: the mechanically
//! generated gRPC stubs implement it over the [`tonic::transport::Channel`]
//! built here, and the test kit implements it in memory. Everything above
//! this crate (invoker, pool) is transport-agnostic.

mod channel;
mod error;
mod fault;
mod manager;
mod rpc;

pub use channel::{
    build_channel, build_endpoint, ChannelOptions, ResolvedKeepalive, TlsMaterial, ENV_TLS_CA,
};
pub use error::SessionError;
pub use fault::{classify, FaultClass};
pub use manager::{Credentials, SessionConfig, SessionManager};
pub use rpc::{EngineDial, EngineRpc};
