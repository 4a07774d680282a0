use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

use e6r_session::SessionManager;

// ---------------------------------------------------------------------------
// PooledChannel
// ---------------------------------------------------------------------------

/// One pool slot: a session manager plus the bookkeeping the pool needs to
/// decide reuse, recycling and overflow teardown.
///
/// The `in_use` / `last_used` fields are only ever flipped while the pool's
/// own mutex is held; they live here (instead of in the pool's interior
/// state) so a handed-out `Arc<PooledChannel>` is self-describing.
pub struct PooledChannel {
    id: Uuid,
    session: Arc<SessionManager>,
    created_at: Instant,
    /// Overflow channels are destroyed on return, never parked.
    ephemeral: bool,
    in_use: AtomicBool,
    last_used: Mutex<Instant>,
}

impl PooledChannel {
    pub(crate) fn new(session: SessionManager, ephemeral: bool) -> Self {
        PooledChannel {
            id: Uuid::new_v4(),
            session: Arc::new(session),
            created_at: Instant::now(),
            ephemeral,
            in_use: AtomicBool::new(false),
            last_used: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Healthy = transport not declared dead and younger than the recycle
    /// limit. The optional pre-use probe happens separately (it is async).
    pub(crate) fn is_healthy(&self, recycle_age: Option<Duration>) -> bool {
        if self.session.is_broken() {
            return false;
        }
        match recycle_age {
            Some(limit) => self.age() < limit,
            None => true,
        }
    }

    pub(crate) fn is_in_use(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }

    pub(crate) fn mark_in_use(&self) {
        self.in_use.store(true, Ordering::Release);
        *self.last_used.lock().expect("channel mutex poisoned") = Instant::now();
    }

    pub(crate) fn mark_idle(&self) {
        *self.last_used.lock().expect("channel mutex poisoned") = Instant::now();
        self.in_use.store(false, Ordering::Release);
    }

    pub(crate) fn last_used(&self) -> Instant {
        *self.last_used.lock().expect("channel mutex poisoned")
    }
}
