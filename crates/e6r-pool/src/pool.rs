use std::collections::{HashMap, VecDeque};
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use e6r_session::{EngineDial, SessionConfig, SessionManager};
use e6r_strategy::StrategyCoordinator;

use crate::channel::PooledChannel;
use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::key::AffinityKey;

// ---------------------------------------------------------------------------
// PoolStats
// ---------------------------------------------------------------------------

/// Read-only snapshot of pool occupancy and lifetime counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub active: usize,
    pub idle: usize,
    pub total_created: u64,
    pub failed_creations: u64,
    pub waiters_now: usize,
    pub total_acquires: u64,
}

// ---------------------------------------------------------------------------
// Interior state
// ---------------------------------------------------------------------------

struct Waiter {
    id: u64,
    key: AffinityKey,
    tx: oneshot::Sender<Arc<PooledChannel>>,
}

struct PoolInner {
    residents: Vec<Arc<PooledChannel>>,
    /// Overflow channels are never parked, so a count is all we keep.
    overflow_in_use: usize,
    /// Creation slots handed out while a caller builds a session outside
    /// the lock; counted against `max` (residents) / `overflow` (ephemeral).
    reserved_residents: usize,
    reserved_overflow: usize,
    affinity: HashMap<AffinityKey, Uuid>,
    waiters: VecDeque<Waiter>,
    next_waiter_id: u64,
    closed: bool,
    total_created: u64,
    failed_creations: u64,
    total_acquires: u64,
}

enum Plan {
    Ready(Arc<PooledChannel>),
    Create { ephemeral: bool },
    Wait {
        id: u64,
        rx: oneshot::Receiver<Arc<PooledChannel>>,
    },
}

struct PoolShared {
    config: PoolConfig,
    session_config: SessionConfig,
    dial: Arc<dyn EngineDial>,
    coordinator: Arc<StrategyCoordinator>,
    inner: Mutex<PoolInner>,
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// The pool itself. Cheap to clone; all clones share one interior state.
#[derive(Clone)]
pub struct Pool {
    shared: Arc<PoolShared>,
}

impl Pool {
    /// Validates the bounds, then warms `min` channels. Configuration
    /// problems (bad bounds, bad endpoint/TLS material in the session
    /// template) surface here, not at first acquire.
    pub fn new(
        config: PoolConfig,
        session_config: SessionConfig,
        dial: Arc<dyn EngineDial>,
        coordinator: Arc<StrategyCoordinator>,
    ) -> Result<Pool, PoolError> {
        config.validate()?;
        let shared = Arc::new(PoolShared {
            config,
            session_config,
            dial,
            coordinator,
            inner: Mutex::new(PoolInner {
                residents: Vec::new(),
                overflow_in_use: 0,
                reserved_residents: 0,
                reserved_overflow: 0,
                affinity: HashMap::new(),
                waiters: VecDeque::new(),
                next_waiter_id: 0,
                closed: false,
                total_created: 0,
                failed_creations: 0,
                total_acquires: 0,
            }),
        });

        {
            let mut inner = shared.inner.lock().expect("pool mutex poisoned");
            for _ in 0..shared.config.min {
                let session = shared.new_session()?;
                inner.total_created += 1;
                inner
                    .residents
                    .push(Arc::new(PooledChannel::new(session, false)));
            }
        }
        Ok(Pool { shared })
    }

    /// Steps 1–4 are non-blocking; step 5 waits FIFO up to
    /// `acquire_timeout` and then fails with [`PoolError::Exhausted`]
    /// without leaking a channel.
    pub async fn acquire(&self, key: AffinityKey) -> Result<PoolGuard, PoolError> {
        let shared = &self.shared;
        {
            let mut inner = shared.inner.lock().expect("pool mutex poisoned");
            if inner.closed {
                return Err(PoolError::Closed);
            }
            inner.total_acquires += 1;
        }

        loop {
            match shared.plan_acquire(key)? {
                Plan::Ready(ch) => {
                    if shared.config.pre_ping && !ch.session().probe().await {
                        warn!(channel = %ch.id(), "pre-ping failed; destroying channel");
                        shared.discard(&ch);
                        continue;
                    }
                    return Ok(PoolGuard::new(Arc::clone(shared), ch));
                }
                Plan::Create { ephemeral } => {
                    return PoolShared::finish_create(shared, key, ephemeral);
                }
                Plan::Wait { id, rx } => {
                    return match timeout(shared.config.acquire_timeout, rx).await {
                        Ok(Ok(ch)) => Ok(PoolGuard::new(Arc::clone(shared), ch)),
                        // Sender dropped without a hand-off: the pool closed.
                        Ok(Err(_)) => Err(PoolError::Closed),
                        Err(_) => {
                            shared.remove_waiter(id);
                            Err(PoolError::Exhausted)
                        }
                    };
                }
            }
        }
    }

    /// Drain the pool. Idle channels are destroyed now, in-use channels on
    /// return; every queued waiter fails with [`PoolError::Closed`].
    pub fn close(&self) {
        let mut inner = self.shared.inner.lock().expect("pool mutex poisoned");
        if inner.closed {
            return;
        }
        inner.closed = true;
        let abandoned: Vec<Waiter> = inner.waiters.drain(..).collect();
        inner.residents.retain(|c| c.is_in_use());
        inner.affinity.clear();
        let remaining = inner.residents.len();
        drop(inner);
        // Dropping the senders wakes every waiter with a recv error.
        info!(
            waiters = abandoned.len(),
            in_use = remaining,
            "pool closed"
        );
    }

    pub fn stats(&self) -> PoolStats {
        let inner = self.shared.inner.lock().expect("pool mutex poisoned");
        let active_residents = inner.residents.iter().filter(|c| c.is_in_use()).count();
        PoolStats {
            active: active_residents + inner.overflow_in_use,
            idle: inner.residents.len() - active_residents,
            total_created: inner.total_created,
            failed_creations: inner.failed_creations,
            waiters_now: inner.waiters.len(),
            total_acquires: inner.total_acquires,
        }
    }
}

impl PoolShared {
    fn new_session(&self) -> Result<SessionManager, PoolError> {
        SessionManager::new(
            self.session_config.clone(),
            Arc::clone(&self.dial),
            Arc::clone(&self.coordinator),
        )
        .map_err(PoolError::Create)
    }

    /// The ordered, non-blocking selection. Runs entirely under the pool
    /// mutex and never awaits.
    fn plan_acquire(&self, key: AffinityKey) -> Result<Plan, PoolError> {
        let mut inner = self.inner.lock().expect("pool mutex poisoned");
        if inner.closed {
            return Err(PoolError::Closed);
        }
        let recycle = self.config.recycle_age;

        // 1. The caller's affine channel, if idle and healthy. A channel
        //    held by a reentering caller falls through to general selection.
        if let Some(id) = inner.affinity.get(&key).copied() {
            match inner.residents.iter().position(|c| c.id() == id) {
                Some(pos) => {
                    let ch = Arc::clone(&inner.residents[pos]);
                    if !ch.is_in_use() {
                        if ch.is_healthy(recycle) {
                            ch.mark_in_use();
                            return Ok(Plan::Ready(ch));
                        }
                        inner.residents.remove(pos);
                        inner.affinity.remove(&key);
                    }
                }
                None => {
                    inner.affinity.remove(&key);
                }
            }
        }

        // 2. Most-recently-used idle resident (warmest socket / TLS state).
        //    Unhealthy idles found along the way are destroyed.
        inner
            .residents
            .retain(|c| c.is_in_use() || c.is_healthy(recycle));
        if let Some(ch) = inner
            .residents
            .iter()
            .filter(|c| !c.is_in_use())
            .max_by_key(|c| c.last_used())
            .map(Arc::clone)
        {
            ch.mark_in_use();
            inner.affinity.insert(key, ch.id());
            return Ok(Plan::Ready(ch));
        }

        // 3. New resident, while under the ceiling.
        if inner.residents.len() + inner.reserved_residents < self.config.max {
            inner.reserved_residents += 1;
            return Ok(Plan::Create { ephemeral: false });
        }

        // 4. Ephemeral overflow under pressure.
        if inner.overflow_in_use + inner.reserved_overflow < self.config.overflow {
            inner.reserved_overflow += 1;
            return Ok(Plan::Create { ephemeral: true });
        }

        // 5. Queue up.
        let (tx, rx) = oneshot::channel();
        let id = inner.next_waiter_id;
        inner.next_waiter_id += 1;
        inner.waiters.push_back(Waiter { id, key, tx });
        Ok(Plan::Wait { id, rx })
    }

    /// Complete a `Plan::Create` reservation (session construction happens
    /// outside the lock; it is cheap but can touch the filesystem for TLS
    /// material).
    fn finish_create(
        shared: &Arc<PoolShared>,
        key: AffinityKey,
        ephemeral: bool,
    ) -> Result<PoolGuard, PoolError> {
        match shared.new_session() {
            Ok(session) => {
                let ch = Arc::new(PooledChannel::new(session, ephemeral));
                ch.mark_in_use();
                let mut inner = shared.inner.lock().expect("pool mutex poisoned");
                inner.total_created += 1;
                if ephemeral {
                    inner.reserved_overflow -= 1;
                    inner.overflow_in_use += 1;
                    debug!(channel = %ch.id(), "overflow channel created");
                } else {
                    inner.reserved_residents -= 1;
                    inner.affinity.insert(key, ch.id());
                    inner.residents.push(Arc::clone(&ch));
                    debug!(channel = %ch.id(), residents = inner.residents.len(), "resident channel created");
                }
                drop(inner);
                Ok(PoolGuard::new(Arc::clone(shared), ch))
            }
            Err(e) => {
                let mut inner = shared.inner.lock().expect("pool mutex poisoned");
                if ephemeral {
                    inner.reserved_overflow -= 1;
                } else {
                    inner.reserved_residents -= 1;
                }
                inner.failed_creations += 1;
                Err(e)
            }
        }
    }

    /// Return a channel to the pool. Never required to run on the acquiring
    /// thread.
    fn release(&self, ch: Arc<PooledChannel>) {
        let mut inner = self.inner.lock().expect("pool mutex poisoned");

        if ch.is_ephemeral() {
            inner.overflow_in_use = inner.overflow_in_use.saturating_sub(1);
            debug!(channel = %ch.id(), "overflow channel destroyed on return");
            return;
        }
        if inner.closed {
            inner.residents.retain(|c| c.id() != ch.id());
            return;
        }

        if !ch.is_healthy(self.config.recycle_age) {
            info!(
                channel = %ch.id(),
                age_secs = ch.age().as_secs(),
                "destroying channel on return"
            );
            inner.residents.retain(|c| c.id() != ch.id());
            inner.affinity.retain(|_, v| *v != ch.id());
            // Opportunistically restore the warm floor.
            while inner.residents.len() + inner.reserved_residents < self.config.min {
                match self.new_session() {
                    Ok(session) => {
                        inner.total_created += 1;
                        inner
                            .residents
                            .push(Arc::new(PooledChannel::new(session, false)));
                    }
                    Err(e) => {
                        inner.failed_creations += 1;
                        warn!(error = %e, "failed to replace destroyed channel");
                        break;
                    }
                }
            }
        } else {
            ch.mark_idle();
        }

        Self::serve_waiters(&mut inner);
    }

    /// Hand idle channels to queued waiters, eldest first. A waiter whose
    /// receiver is already gone (timeout, cancellation) is skipped.
    fn serve_waiters(inner: &mut PoolInner) {
        loop {
            if inner.waiters.is_empty() {
                return;
            }
            let Some(candidate) = inner
                .residents
                .iter()
                .filter(|c| !c.is_in_use())
                .max_by_key(|c| c.last_used())
                .map(Arc::clone)
            else {
                return;
            };
            candidate.mark_in_use();
            let mut handed = false;
            while let Some(waiter) = inner.waiters.pop_front() {
                match waiter.tx.send(Arc::clone(&candidate)) {
                    Ok(()) => {
                        inner.affinity.insert(waiter.key, candidate.id());
                        handed = true;
                        break;
                    }
                    Err(_) => continue,
                }
            }
            if !handed {
                candidate.mark_idle();
                return;
            }
        }
    }

    /// Drop a resident that failed its pre-use probe. Only residents are
    /// probed — freshly created channels have nothing to check yet.
    fn discard(&self, ch: &Arc<PooledChannel>) {
        let mut inner = self.inner.lock().expect("pool mutex poisoned");
        inner.residents.retain(|c| c.id() != ch.id());
        inner.affinity.retain(|_, v| *v != ch.id());
    }

    fn remove_waiter(&self, id: u64) {
        let mut inner = self.inner.lock().expect("pool mutex poisoned");
        inner.waiters.retain(|w| w.id != id);
    }
}

// ---------------------------------------------------------------------------
// PoolGuard
// ---------------------------------------------------------------------------

/// An acquired channel. Returning it to the pool is the drop behavior, so
/// release happens deterministically on any thread; [`PoolGuard::release`]
/// makes the return explicit when that reads better.
pub struct PoolGuard {
    shared: Arc<PoolShared>,
    channel: Option<Arc<PooledChannel>>,
}

impl std::fmt::Debug for PoolGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolGuard").finish_non_exhaustive()
    }
}

impl PoolGuard {
    fn new(shared: Arc<PoolShared>, channel: Arc<PooledChannel>) -> Self {
        PoolGuard {
            shared,
            channel: Some(channel),
        }
    }

    pub fn channel(&self) -> &Arc<PooledChannel> {
        self.channel.as_ref().expect("guard already released")
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        self.channel().session()
    }

    /// Return the channel now.
    pub fn release(mut self) {
        if let Some(ch) = self.channel.take() {
            self.shared.release(ch);
        }
    }
}

impl Deref for PoolGuard {
    type Target = PooledChannel;

    fn deref(&self) -> &PooledChannel {
        self.channel()
    }
}

impl Drop for PoolGuard {
    fn drop(&mut self) {
        if let Some(ch) = self.channel.take() {
            self.shared.release(ch);
        }
    }
}
