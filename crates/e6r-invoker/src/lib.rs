//! e6r-invoker
//!
//! The single choke-point for outbound engine RPCs. Every call that leaves
//! the connector flows through [`Invoker::call`], which
//!
//! 1. attaches the metadata headers (deployment tag, engine endpoint for
//!    per-query follow-ups, cluster selector),
//! 2. recovers from exactly two failure classes — access-denied (serialized
//!    re-auth, then retry) and wrong-strategy (invalidate, rediscover, then
//!    retry) — within a bounded attempt budget, and
//! 3. feeds any next-tag hint back into the strategy coordinator from one
//!    site, whether the call succeeded or failed.
//!
//! Everything else — transport faults, deadlines, genuine query errors —
//! surfaces to the caller unchanged. No other component recovers from
//! errors.

mod error;
mod handle;
mod ops;
mod retry;

use std::future::Future;
use std::sync::Arc;

use tonic::{Code, Status};
use tracing::warn;

use e6r_schemas::{CallHeaders, DeploymentTag, ResponseHint, TRAILER_NEW_STRATEGY};
use e6r_session::{classify, EngineRpc, FaultClass, SessionManager};
use e6r_strategy::StrategyCoordinator;

pub use error::InvokerError;
pub use handle::QueryHandle;
pub use retry::{RetryPolicy, ENV_MAX_RETRY_ATTEMPTS, ENV_RETRY_BACKOFF};

// ---------------------------------------------------------------------------
// Invoker
// ---------------------------------------------------------------------------

pub struct Invoker {
    session: Arc<SessionManager>,
    coordinator: Arc<StrategyCoordinator>,
    retry: RetryPolicy,
}

impl Invoker {
    pub fn new(
        session: Arc<SessionManager>,
        coordinator: Arc<StrategyCoordinator>,
        retry: RetryPolicy,
    ) -> Self {
        Invoker {
            session,
            coordinator,
            retry,
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn coordinator(&self) -> &Arc<StrategyCoordinator> {
        &self.coordinator
    }

    /// Run one logical RPC with header stamping, bounded recovery and hint
    /// feedback. `query_id` selects the tag source (registered tag vs the
    /// tag for new work); `planner_ip` is set on per-query follow-ups.
    pub(crate) async fn call<T, F, Fut>(
        &self,
        op: &'static str,
        query_id: Option<&str>,
        planner_ip: Option<&str>,
        f: F,
    ) -> Result<T, InvokerError>
    where
        T: ResponseHint,
        F: Fn(Arc<dyn EngineRpc>, String, CallHeaders) -> Fut,
        Fut: Future<Output = Result<T, Status>>,
    {
        Ok(self.call_tagged(op, query_id, planner_ip, f).await?.0)
    }

    /// Like [`Invoker::call`] but also reports the tag the successful
    /// attempt carried — prepare uses it to register the new query.
    pub(crate) async fn call_tagged<T, F, Fut>(
        &self,
        op: &'static str,
        query_id: Option<&str>,
        planner_ip: Option<&str>,
        f: F,
    ) -> Result<(T, Option<DeploymentTag>), InvokerError>
    where
        T: ResponseHint,
        F: Fn(Arc<dyn EngineRpc>, String, CallHeaders) -> Fut,
        Fut: Future<Output = Result<T, Status>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            // ensure_ready dials, authenticates and (re)discovers the tag as
            // needed; after it returns the coordinator has an answer for new
            // work and the session id is live.
            let (rpc, session_id) = self.session.ensure_ready().await?;
            let epoch = self.session.epoch();
            let tag = match query_id {
                Some(q) => self.coordinator.tag_for_existing_query(q),
                None => self.coordinator.tag_for_new_query(),
            };
            let headers = CallHeaders {
                strategy: tag,
                planner_ip: planner_ip.map(str::to_string),
                cluster_uuid: self.session.cluster_uuid(),
            };

            match f(rpc, session_id, headers).await {
                Ok(response) => {
                    if let Some(hint) = response.new_strategy_hint() {
                        self.coordinator.observe_hint(hint);
                    }
                    return Ok((response, tag));
                }
                Err(status) => {
                    // Failed responses can still announce the next tag via a
                    // trailer; the hint intake does not care how the call went.
                    if let Some(hint) = trailer_hint(&status) {
                        self.coordinator.observe_hint(&hint);
                    }
                    if status.code() == Code::Unavailable {
                        self.session.mark_broken();
                    }

                    let class = classify(&status);
                    let recoverable =
                        matches!(class, FaultClass::AccessDenied | FaultClass::WrongStrategy);
                    if !recoverable || attempt >= self.retry.max_attempts {
                        return Err(InvokerError::Rpc(status));
                    }

                    if class == FaultClass::AccessDenied {
                        warn!(op, attempt, "access denied; re-authenticating");
                        self.session.reauthenticate(epoch).await?;
                    } else {
                        warn!(op, attempt, "wrong deployment tag; rediscovering");
                        self.coordinator.invalidate();
                        self.session.reauthenticate(epoch).await?;
                        // The server declared the old tag dead: re-pin the
                        // query to whatever discovery just published so the
                        // retry (and every later follow-up) uses it.
                        if let Some(q) = query_id {
                            if let Some(t) = self.coordinator.active() {
                                self.coordinator.register_query(q, t);
                            }
                        }
                    }
                    tokio::time::sleep(self.retry.backoff).await;
                }
            }
        }
    }
}

fn trailer_hint(status: &Status) -> Option<String> {
    status
        .metadata()
        .get(TRAILER_NEW_STRATEGY)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
