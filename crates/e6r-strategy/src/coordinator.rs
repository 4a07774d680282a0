use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use e6r_schemas::DeploymentTag;

/// Rediscovery TTL in seconds for a cached active tag. `0` disables expiry.
pub const ENV_STRATEGY_CACHE_TIMEOUT: &str = "E6DATA_STRATEGY_CACHE_TIMEOUT";

const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// CoordinatorState
// ---------------------------------------------------------------------------

/// Everything behind the single mutex.
///
/// Invariants:
/// - `pending != active` whenever `pending` is set.
/// - An entry in `query_tags` survives until the query is cleared/cancelled.
struct CoordinatorState {
    active: Option<DeploymentTag>,
    pending: Option<DeploymentTag>,
    query_tags: HashMap<String, DeploymentTag>,
    /// When `active` was last (re)discovered or promoted; `None` while unset.
    refreshed_at: Option<Instant>,
}

impl CoordinatorState {
    fn active_is_fresh(&self, ttl: Option<Duration>) -> bool {
        match (self.active, ttl, self.refreshed_at) {
            (None, _, _) => false,
            (Some(_), None, _) => true,
            (Some(_), Some(ttl), Some(at)) => at.elapsed() < ttl,
            (Some(_), Some(_), None) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// StrategyCoordinator
// ---------------------------------------------------------------------------

pub struct StrategyCoordinator {
    state: Mutex<CoordinatorState>,
    /// `None` disables expiry; the cached tag then lives until invalidation.
    cache_timeout: Option<Duration>,
}

impl StrategyCoordinator {
    /// Coordinator with the TTL taken from `E6DATA_STRATEGY_CACHE_TIMEOUT`
    /// (seconds, default 300, `0` disables).
    pub fn new() -> Self {
        Self::with_cache_timeout(cache_timeout_from_env())
    }

    /// Coordinator with an explicit TTL. Tests use this to force expiry.
    pub fn with_cache_timeout(cache_timeout: Option<Duration>) -> Self {
        StrategyCoordinator {
            state: Mutex::new(CoordinatorState {
                active: None,
                pending: None,
                query_tags: HashMap::new(),
                refreshed_at: None,
            }),
            cache_timeout,
        }
    }

    /// Process-wide default instance.
    pub fn global() -> Arc<StrategyCoordinator> {
        static GLOBAL: OnceLock<Arc<StrategyCoordinator>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(StrategyCoordinator::new())))
    }

    /// Tag a brand-new query should carry: `pending` wins over `active`.
    /// `None` means no usable tag — the caller must run discovery (an
    /// authenticate probe) before sending anything.
    ///
    /// A cached `active` older than the TTL is deliberately not returned, so
    /// new queries trigger rediscovery while in-flight ones keep their tags.
    pub fn tag_for_new_query(&self) -> Option<DeploymentTag> {
        let state = self.state.lock().expect("coordinator mutex poisoned");
        if let Some(p) = state.pending {
            return Some(p);
        }
        if state.active_is_fresh(self.cache_timeout) {
            return state.active;
        }
        None
    }

    /// Tag for a follow-up RPC of a known query: the registered tag if the
    /// query is still tracked, otherwise the current active tag (fresh or
    /// not — an established query never triggers rediscovery by itself).
    pub fn tag_for_existing_query(&self, query_id: &str) -> Option<DeploymentTag> {
        let state = self.state.lock().expect("coordinator mutex poisoned");
        state.query_tags.get(query_id).copied().or(state.active)
    }

    /// Record the tag a query was prepared under.
    pub fn register_query(&self, query_id: &str, tag: DeploymentTag) {
        let mut state = self.state.lock().expect("coordinator mutex poisoned");
        state.query_tags.insert(query_id.to_string(), tag);
    }

    /// Drop the registry entry for a terminated query.
    pub fn forget_query(&self, query_id: &str) {
        let mut state = self.state.lock().expect("coordinator mutex poisoned");
        state.query_tags.remove(query_id);
    }

    /// Intake for the `new_strategy` hint field observed on a response.
    ///
    /// Unparseable values are ignored (logged, never an error). A hint equal
    /// to `active` clears any stale `pending`; a differing hint becomes the
    /// new `pending`. `active` itself is never touched here — promotion
    /// happens only at a safe point.
    pub fn observe_hint(&self, raw: &str) {
        let tag = match raw.parse::<DeploymentTag>() {
            Ok(t) => t,
            Err(e) => {
                debug!(raw, %e, "ignoring unusable strategy hint");
                return;
            }
        };
        let mut state = self.state.lock().expect("coordinator mutex poisoned");
        if state.active == Some(tag) {
            if state.pending.take().is_some() {
                info!(tag = %tag, "strategy hint re-confirmed active tag; pending cleared");
            }
        } else if state.pending != Some(tag) {
            info!(tag = %tag, "strategy transition announced; deferred to next safe point");
            state.pending = Some(tag);
        }
    }

    /// Safe point (clear/cancel just succeeded): promote `pending` to
    /// `active`, if set.
    pub fn apply_pending_at_safe_point(&self) {
        let mut state = self.state.lock().expect("coordinator mutex poisoned");
        if let Some(next) = state.pending.take() {
            info!(tag = %next, "strategy transition applied");
            state.active = Some(next);
            state.refreshed_at = Some(Instant::now());
        }
    }

    /// Publish a freshly discovered (or re-discovered) active tag.
    pub fn publish_active(&self, tag: DeploymentTag) {
        let mut state = self.state.lock().expect("coordinator mutex poisoned");
        info!(tag = %tag, "active strategy discovered");
        state.active = Some(tag);
        state.refreshed_at = Some(Instant::now());
        if state.pending == Some(tag) {
            state.pending = None;
        }
    }

    /// Forget both tags. Next `tag_for_new_query` returns `None`, forcing
    /// rediscovery. Invoked when the server rejects our tag outright.
    pub fn invalidate(&self) {
        let mut state = self.state.lock().expect("coordinator mutex poisoned");
        info!("strategy cache invalidated");
        state.active = None;
        state.pending = None;
        state.refreshed_at = None;
    }

    /// Current active tag (observability / tests).
    pub fn active(&self) -> Option<DeploymentTag> {
        self.state.lock().expect("coordinator mutex poisoned").active
    }

    /// Current pending tag (observability / tests).
    pub fn pending(&self) -> Option<DeploymentTag> {
        self.state.lock().expect("coordinator mutex poisoned").pending
    }

    /// Number of queries currently pinned to a tag (observability / tests).
    pub fn tracked_queries(&self) -> usize {
        self.state
            .lock()
            .expect("coordinator mutex poisoned")
            .query_tags
            .len()
    }
}

impl Default for StrategyCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

fn cache_timeout_from_env() -> Option<Duration> {
    match std::env::var(ENV_STRATEGY_CACHE_TIMEOUT) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(0) => None,
            Ok(secs) => Some(Duration::from_secs(secs)),
            Err(_) => {
                tracing::warn!(
                    raw,
                    "unparseable {ENV_STRATEGY_CACHE_TIMEOUT}; using default"
                );
                Some(DEFAULT_CACHE_TIMEOUT)
            }
        },
        Err(_) => Some(DEFAULT_CACHE_TIMEOUT),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> StrategyCoordinator {
        StrategyCoordinator::with_cache_timeout(None)
    }

    #[test]
    fn unset_coordinator_demands_discovery() {
        let c = fresh();
        assert_eq!(c.tag_for_new_query(), None);
        assert_eq!(c.tag_for_existing_query("q1"), None);
    }

    #[test]
    fn discovery_publishes_active() {
        let c = fresh();
        c.publish_active(DeploymentTag::Green);
        assert_eq!(c.tag_for_new_query(), Some(DeploymentTag::Green));
        assert_eq!(c.active(), Some(DeploymentTag::Green));
        assert_eq!(c.pending(), None);
    }

    #[test]
    fn hint_becomes_pending_and_wins_for_new_queries() {
        let c = fresh();
        c.publish_active(DeploymentTag::Green);
        c.observe_hint("blue");
        assert_eq!(c.active(), Some(DeploymentTag::Green));
        assert_eq!(c.pending(), Some(DeploymentTag::Blue));
        // New queries adopt the announced tag immediately.
        assert_eq!(c.tag_for_new_query(), Some(DeploymentTag::Blue));
    }

    #[test]
    fn registered_query_keeps_its_tag_across_a_hint() {
        let c = fresh();
        c.publish_active(DeploymentTag::Green);
        c.register_query("q1", DeploymentTag::Green);
        c.observe_hint("blue");
        assert_eq!(c.tag_for_existing_query("q1"), Some(DeploymentTag::Green));
    }

    #[test]
    fn safe_point_promotes_pending() {
        let c = fresh();
        c.publish_active(DeploymentTag::Green);
        c.observe_hint("blue");
        c.apply_pending_at_safe_point();
        assert_eq!(c.active(), Some(DeploymentTag::Blue));
        assert_eq!(c.pending(), None);
    }

    #[test]
    fn safe_point_without_pending_is_a_no_op() {
        let c = fresh();
        c.publish_active(DeploymentTag::Blue);
        c.apply_pending_at_safe_point();
        assert_eq!(c.active(), Some(DeploymentTag::Blue));
    }

    #[test]
    fn hint_equal_to_active_clears_stale_pending() {
        let c = fresh();
        c.publish_active(DeploymentTag::Green);
        c.observe_hint("blue");
        c.observe_hint("green");
        assert_eq!(c.pending(), None);
        assert_eq!(c.active(), Some(DeploymentTag::Green));
    }

    #[test]
    fn unusable_hint_is_ignored() {
        let c = fresh();
        c.publish_active(DeploymentTag::Green);
        c.observe_hint("purple");
        c.observe_hint("");
        assert_eq!(c.pending(), None);
    }

    #[test]
    fn invalidate_forces_rediscovery() {
        let c = fresh();
        c.publish_active(DeploymentTag::Green);
        c.observe_hint("blue");
        c.invalidate();
        assert_eq!(c.tag_for_new_query(), None);
        assert_eq!(c.active(), None);
        assert_eq!(c.pending(), None);
    }

    #[test]
    fn stale_active_expires_for_new_queries_only() {
        let c = StrategyCoordinator::with_cache_timeout(Some(Duration::ZERO));
        c.publish_active(DeploymentTag::Green);
        c.register_query("q1", DeploymentTag::Green);
        // New queries must rediscover...
        assert_eq!(c.tag_for_new_query(), None);
        // ...but in-flight queries keep answering from the registry.
        assert_eq!(c.tag_for_existing_query("q1"), Some(DeploymentTag::Green));
        // And an unregistered follow-up still uses the stale active tag.
        assert_eq!(c.tag_for_existing_query("q2"), Some(DeploymentTag::Green));
    }

    #[test]
    fn forget_query_releases_the_registry_entry() {
        let c = fresh();
        c.publish_active(DeploymentTag::Blue);
        c.register_query("q1", DeploymentTag::Blue);
        assert_eq!(c.tracked_queries(), 1);
        c.forget_query("q1");
        assert_eq!(c.tracked_queries(), 0);
    }

    #[test]
    fn publish_active_matching_pending_collapses_the_transition() {
        let c = fresh();
        c.publish_active(DeploymentTag::Green);
        c.observe_hint("blue");
        c.publish_active(DeploymentTag::Blue);
        assert_eq!(c.active(), Some(DeploymentTag::Blue));
        assert_eq!(c.pending(), None);
    }
}
