//! e6r-strategy
//!
//! Single source of truth for which deployment tag each outbound RPC should
//! carry and when to switch. The server runs two parallel deployments
//! (blue/green); a request carrying the wrong tag is rejected with a
//! distinguished error, and the serving side can announce an upcoming switch
//! through a per-response hint.
//!
//! # State diagram
//!
//! ```text
//!              discovery succeeds under T
//!   Unset ───────────────────────────────► Active(T)
//!                                             │
//!                         hint(T'), T' ≠ T    │    wrong-tag error
//!                      ┌──────────────────────┤──────────────► Unset
//!                      ▼                      │
//!            Active(T) + Pending(T')          │
//!                      │                      │
//!     clear / cancel   │                      │  wrong-tag error
//!     (safe point)     ▼                      ▼
//!                 Active(T')               Unset
//! ```
//!
//! Two hard rules fall out of the diagram:
//!
//! 1. **Hints are deferred.** A hint only ever lands in `pending`; it becomes
//!    `active` at the next safe point (clear/cancel). A query that is in
//!    flight when a hint arrives keeps the tag it was registered with.
//! 2. **Queries pin their tag.** `tag_for_existing_query` answers from the
//!    per-query registry first, so follow-up RPCs for a query carry the tag
//!    it was prepared under even while `pending` changes around it.
//!
//! All mutating operations serialize through one mutex. The coordinator is
//! process-wide by default ([`StrategyCoordinator::global`]) but freshly
//! constructible for test isolation.

mod coordinator;

pub use coordinator::{StrategyCoordinator, ENV_STRATEGY_CACHE_TIMEOUT};

pub use e6r_schemas::DeploymentTag;
