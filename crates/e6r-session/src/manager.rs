//! Session ownership and (re-)authentication.
//!
//! One `SessionManager` owns one channel and one session id at a time. The
//! session id is only ever replaced atomically, under a single async lock
//! that also serializes strategy discovery — concurrent callers observing an
//! auth failure converge on one `authenticate` RPC and then all proceed with
//! the fresh id (the epoch counter tells late arrivals their re-auth already
//! happened).

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use e6r_schemas::{AuthenticateRequest, CallHeaders, DeploymentTag, ResponseHint};
use e6r_strategy::StrategyCoordinator;

use crate::channel::{build_endpoint, ChannelOptions};
use crate::error::SessionError;
use crate::fault::{classify, FaultClass};
use crate::rpc::{EngineDial, EngineRpc};

// ---------------------------------------------------------------------------
// Credentials / SessionConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Engine endpoint as `host:port`.
    pub endpoint: String,
    /// Cluster selector forwarded on every call when targeting a
    /// multi-cluster control plane.
    pub cluster_uuid: Option<String>,
    pub credentials: Credentials,
    pub options: ChannelOptions,
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

struct SessionState {
    rpc: Option<Arc<dyn EngineRpc>>,
    session_id: Option<String>,
    /// Bumped on every successful (re-)authentication.
    epoch: u64,
    /// Transport declared dead (connection refused / reset). The pool evicts
    /// broken channels on return.
    broken: bool,
}

pub struct SessionManager {
    endpoint: String,
    cluster_uuid: Option<String>,
    options: ChannelOptions,
    dial: Arc<dyn EngineDial>,
    coordinator: Arc<StrategyCoordinator>,
    credentials: Mutex<Credentials>,
    /// Serializes dialing, discovery and re-authentication.
    auth: tokio::sync::Mutex<()>,
    state: Mutex<SessionState>,
}

impl SessionManager {
    /// Validates the endpoint and TLS material up front — configuration
    /// errors are fatal at construction time, not at first call.
    pub fn new(
        config: SessionConfig,
        dial: Arc<dyn EngineDial>,
        coordinator: Arc<StrategyCoordinator>,
    ) -> Result<Self, SessionError> {
        build_endpoint(&config.endpoint, &config.options)?;
        Ok(SessionManager {
            endpoint: config.endpoint,
            cluster_uuid: config.cluster_uuid,
            options: config.options,
            dial,
            coordinator,
            credentials: Mutex::new(config.credentials),
            auth: tokio::sync::Mutex::new(()),
            state: Mutex::new(SessionState {
                rpc: None,
                session_id: None,
                epoch: 0,
                broken: false,
            }),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn cluster_uuid(&self) -> Option<String> {
        self.cluster_uuid.clone()
    }

    /// Epoch of the current session id. Callers snapshot this before an RPC
    /// so a later [`SessionManager::reauthenticate`] can tell whether someone
    /// else already replaced the session.
    pub fn epoch(&self) -> u64 {
        self.state.lock().expect("session mutex poisoned").epoch
    }

    pub fn session_id(&self) -> Option<String> {
        self.state
            .lock()
            .expect("session mutex poisoned")
            .session_id
            .clone()
    }

    /// Swap the token used by subsequent (re-)authentication. In-flight
    /// calls keep the session they started with.
    pub fn rotate_credentials(&self, credentials: Credentials) {
        *self.credentials.lock().expect("session mutex poisoned") = credentials;
    }

    /// Transport-level death sentence; the pool destroys broken channels on
    /// return instead of parking them idle.
    pub fn mark_broken(&self) {
        self.state.lock().expect("session mutex poisoned").broken = true;
    }

    pub fn is_broken(&self) -> bool {
        self.state.lock().expect("session mutex poisoned").broken
    }

    /// Cheap liveness check for the pool's pre-ping. A session that has not
    /// dialed yet has nothing to check and reports alive.
    pub async fn probe(&self) -> bool {
        let rpc = {
            let state = self.state.lock().expect("session mutex poisoned");
            if state.broken {
                return false;
            }
            state.rpc.clone()
        };
        match rpc {
            Some(rpc) => rpc.probe().await,
            None => true,
        }
    }

    /// The workhorse: returns a live `(rpc, session_id)` pair, dialing and
    /// authenticating on first use and re-running discovery when the
    /// coordinator has no usable tag (initial state, invalidation, or cache
    /// expiry).
    pub async fn ensure_ready(&self) -> Result<(Arc<dyn EngineRpc>, String), SessionError> {
        if let Some(ready) = self.ready_pair() {
            return Ok(ready);
        }
        let _guard = self.auth.lock().await;
        // Someone else may have finished the work while we waited.
        if let Some(ready) = self.ready_pair() {
            return Ok(ready);
        }
        let rpc = self.ensure_rpc_locked().await?;
        let session_id = self.authenticate_locked(&rpc).await?;
        Ok((rpc, session_id))
    }

    /// Replace the session id after an auth-denied failure. `seen_epoch` is
    /// the epoch the caller observed before its failed call; if the epoch
    /// has already advanced, another caller re-authenticated for us.
    pub async fn reauthenticate(&self, seen_epoch: u64) -> Result<String, SessionError> {
        let _guard = self.auth.lock().await;
        {
            let state = self.state.lock().expect("session mutex poisoned");
            if state.epoch != seen_epoch {
                if let Some(id) = &state.session_id {
                    debug!("re-auth already performed by a concurrent caller");
                    return Ok(id.clone());
                }
            }
        }
        let rpc = self.ensure_rpc_locked().await?;
        self.authenticate_locked(&rpc).await
    }

    fn ready_pair(&self) -> Option<(Arc<dyn EngineRpc>, String)> {
        let state = self.state.lock().expect("session mutex poisoned");
        match (&state.rpc, &state.session_id) {
            (Some(rpc), Some(id)) if self.coordinator.tag_for_new_query().is_some() => {
                Some((Arc::clone(rpc), id.clone()))
            }
            _ => None,
        }
    }

    /// Dial exactly once; must hold the auth lock.
    async fn ensure_rpc_locked(&self) -> Result<Arc<dyn EngineRpc>, SessionError> {
        if let Some(rpc) = self
            .state
            .lock()
            .expect("session mutex poisoned")
            .rpc
            .clone()
        {
            return Ok(rpc);
        }
        let rpc = self.dial.dial(&self.endpoint, &self.options).await?;
        let mut state = self.state.lock().expect("session mutex poisoned");
        state.rpc = Some(Arc::clone(&rpc));
        Ok(rpc)
    }

    /// Authenticate, discovering the deployment tag when necessary; must
    /// hold the auth lock.
    ///
    /// When the coordinator already knows a tag, one attempt is made under
    /// it; a wrong-tag rejection invalidates the cache and falls into the
    /// fixed blue→green probe sequence. If every probe is rejected for the
    /// wrong-tag reason, the underlying error surfaces (no endless cycling).
    async fn authenticate_locked(
        &self,
        rpc: &Arc<dyn EngineRpc>,
    ) -> Result<String, SessionError> {
        let request = {
            let creds = self.credentials.lock().expect("session mutex poisoned");
            AuthenticateRequest {
                user: creds.user.clone(),
                password: creds.token.clone(),
            }
        };

        if let Some(tag) = self.coordinator.tag_for_new_query() {
            match self.try_authenticate(rpc, tag, request.clone()).await {
                Ok(id) => return Ok(id),
                Err(status) if classify(&status) == FaultClass::WrongStrategy => {
                    info!(tag = %tag, "cached strategy rejected; rediscovering");
                    self.coordinator.invalidate();
                }
                Err(status) => return Err(SessionError::Rpc(status)),
            }
        }

        let mut rejected: Option<tonic::Status> = None;
        for tag in DeploymentTag::DISCOVERY_ORDER {
            match self.try_authenticate(rpc, tag, request.clone()).await {
                Ok(id) => return Ok(id),
                Err(status) if classify(&status) == FaultClass::WrongStrategy => {
                    debug!(tag = %tag, "strategy probe rejected");
                    rejected = Some(status);
                }
                Err(status) => return Err(SessionError::Rpc(status)),
            }
        }
        // Both tags rejected as wrong: surface the last rejection as-is.
        Err(SessionError::Rpc(rejected.unwrap_or_else(|| {
            tonic::Status::internal("strategy discovery produced no attempts")
        })))
    }

    async fn try_authenticate(
        &self,
        rpc: &Arc<dyn EngineRpc>,
        tag: DeploymentTag,
        request: AuthenticateRequest,
    ) -> Result<String, tonic::Status> {
        let mut headers = CallHeaders::with_strategy(tag);
        headers.cluster_uuid = self.cluster_uuid.clone();
        let response = rpc.authenticate(&headers, request).await?;

        self.coordinator.publish_active(tag);
        if let Some(hint) = response.new_strategy_hint() {
            self.coordinator.observe_hint(hint);
        }
        let mut state = self.state.lock().expect("session mutex poisoned");
        state.session_id = Some(response.session_id.clone());
        state.epoch += 1;
        info!(endpoint = %self.endpoint, tag = %tag, "session established");
        Ok(response.session_id)
    }
}
