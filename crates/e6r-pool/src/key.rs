use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

// ---------------------------------------------------------------------------
// AffinityKey
// ---------------------------------------------------------------------------

/// Opaque caller identity for channel affinity.
///
/// Thread-per-request hosts derive the key from the OS thread; cooperative
/// runtimes mint one token per logical caller (task, connection, cursor) and
/// carry it themselves. The pool only ever compares keys — affinity is a
/// hint, not a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AffinityKey(u64);

impl AffinityKey {
    /// Key for the current OS thread.
    pub fn of_thread() -> AffinityKey {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        std::thread::current().id().hash(&mut hasher);
        AffinityKey(hasher.finish())
    }

    /// A fresh process-unique token for cooperative callers.
    pub fn token() -> AffinityKey {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        AffinityKey(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a host-supplied identity.
    pub fn from_raw(raw: u64) -> AffinityKey {
        AffinityKey(raw)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_thread_same_key() {
        assert_eq!(AffinityKey::of_thread(), AffinityKey::of_thread());
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(AffinityKey::token(), AffinityKey::token());
    }

    #[test]
    fn different_threads_different_keys() {
        let here = AffinityKey::of_thread();
        let there = std::thread::spawn(AffinityKey::of_thread)
            .join()
            .expect("thread join");
        assert_ne!(here, there);
    }
}
