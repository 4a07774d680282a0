//! e6r-pool
//!
//! Bounded, caller-affine reuse of engine channels. Each pooled channel is a
//! [`e6r_session::SessionManager`] (one lazily-connected gRPC channel plus
//! its authenticated session); the pool hands them out with a non-binding
//! preference for giving the same caller the same channel back.
//!
//! # Acquire, in order
//!
//! 1. the caller's affine channel, if idle and healthy;
//! 2. the most-recently-used idle resident (warm sockets and TLS state);
//! 3. a new resident, while fewer than `max` exist;
//! 4. a new ephemeral overflow channel, while the overflow budget lasts —
//!    destroyed on return, never parked;
//! 5. otherwise wait, FIFO, up to `acquire_timeout`.
//!
//! Steps 1–4 never block; the waiter queue is only consulted when the pool
//! is saturated, and `release` hands a healthy channel directly to the
//! eldest waiter. Per-call RPC errors never evict a channel — only
//! auth-denial at the transport, a closed connection, or recycle age do.

mod channel;
mod config;
mod error;
mod key;
mod pool;

pub use channel::PooledChannel;
pub use config::{
    PoolConfig, ENV_POOL_MAX, ENV_POOL_MIN, ENV_POOL_OVERFLOW, ENV_POOL_RECYCLE,
};
pub use error::PoolError;
pub use key::AffinityKey;
pub use pool::{Pool, PoolGuard, PoolStats};
