//! Active-work registry — serializes work per (provider, fingerprint).
//!
//! The only mutable state shared between the job scheduler and the
//! monitoring manager. Acquisition is a single locked check-and-insert,
//! so at most one unit of work holds a given key at any instant.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

/// Tracks which (provider, fingerprint) pairs have work in flight.
#[derive(Clone, Default)]
pub struct ActiveSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

/// RAII guard; dropping it releases the pair.
pub struct ActiveGuard {
    key: String,
    inner: Arc<Mutex<HashSet<String>>>,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a (provider, fingerprint) pair. `None` if already claimed.
    pub fn try_acquire(&self, provider: &str, fingerprint: &str) -> Option<ActiveGuard> {
        let key = format!("{}/{}", provider, fingerprint);
        let mut set = self.inner.lock();
        if !set.insert(key.clone()) {
            return None;
        }
        Some(ActiveGuard {
            key,
            inner: self.inner.clone(),
        })
    }

    pub fn is_active(&self, provider: &str, fingerprint: &str) -> bool {
        self.inner
            .lock()
            .contains(&format!("{}/{}", provider, fingerprint))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.inner.lock().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails() {
        let set = ActiveSet::new();
        let guard = set.try_acquire("claude", "fp-1");
        assert!(guard.is_some());
        assert!(set.try_acquire("claude", "fp-1").is_none());
        assert!(set.is_active("claude", "fp-1"));
    }

    #[test]
    fn test_different_pairs_are_independent() {
        let set = ActiveSet::new();
        let _a = set.try_acquire("claude", "fp-1").unwrap();
        assert!(set.try_acquire("claude", "fp-2").is_some());
        assert!(set.try_acquire("chatgpt", "fp-1").is_some());
    }

    #[test]
    fn test_drop_releases() {
        let set = ActiveSet::new();
        {
            let _guard = set.try_acquire("claude", "fp-1").unwrap();
            assert!(set.is_active("claude", "fp-1"));
        }
        assert!(!set.is_active("claude", "fp-1"));
        assert!(set.try_acquire("claude", "fp-1").is_some());
    }

    #[test]
    fn test_concurrent_acquire_only_one_wins() {
        let set = ActiveSet::new();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let set = set.clone();
                std::thread::spawn(move || set.try_acquire("claude", "fp-race").is_some())
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(wins, 1);
    }
}
