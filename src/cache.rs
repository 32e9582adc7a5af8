//! Cache collaborator for guards
//!
//! Guards that remember expensive lookups (roles, permissions, sessions) own an
//! injected [`GuardCache`] instead of hiding state in statics, so every test
//! can hand a guard its own cache and every guard can invalidate explicitly.

use std::time::Duration;

/// Key/value cache with per-entry expiry
///
/// Implementations must be safe to share between concurrent navigations.
pub trait GuardCache<V>: Send + Sync {
    /// Get a live entry
    fn get(&self, key: &str) -> Option<V>;

    /// Store an entry; `None` keeps it until evicted or invalidated
    fn set(&self, key: &str, value: V, ttl: Option<Duration>);

    /// Drop one entry
    fn invalidate(&self, key: &str);

    /// Drop every entry
    fn clear(&self);
}

#[cfg(feature = "cache")]
pub use lru_cache::{CacheStats, LruGuardCache};

#[cfg(feature = "cache")]
mod lru_cache {
    use super::GuardCache;
    use crate::trace_log;
    use lru::LruCache;
    use parking_lot::Mutex;
    use std::num::NonZeroUsize;
    use std::time::{Duration, Instant};

    /// Cache performance statistics
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct CacheStats {
        pub hits: usize,
        pub misses: usize,
        pub expirations: usize,
        pub invalidations: usize,
    }

    impl CacheStats {
        pub fn hit_rate(&self) -> f64 {
            let total = self.hits + self.misses;
            if total == 0 {
                0.0
            } else {
                self.hits as f64 / total as f64
            }
        }
    }

    #[derive(Debug)]
    struct Entry<V> {
        value: V,
        expires_at: Option<Instant>,
    }

    impl<V> Entry<V> {
        fn is_expired(&self, now: Instant) -> bool {
            self.expires_at.is_some_and(|at| now >= at)
        }
    }

    #[derive(Debug)]
    struct State<V> {
        entries: LruCache<String, Entry<V>>,
        stats: CacheStats,
    }

    /// In-memory [`GuardCache`] with LRU eviction
    ///
    /// Default capacity: 256 entries.
    ///
    /// # Example
    ///
    /// ```
    /// use navigator_guards::{GuardCache, LruGuardCache};
    /// use std::time::Duration;
    ///
    /// let cache = LruGuardCache::new();
    /// cache.set("roles", vec!["admin".to_string()], Some(Duration::from_secs(60)));
    /// assert_eq!(cache.get("roles"), Some(vec!["admin".to_string()]));
    /// ```
    ///
    /// Handing one to a guard:
    ///
    /// ```
    /// use navigator_guards::{LruGuardCache, RoleGuard};
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// let cache = Arc::new(LruGuardCache::<Vec<String>>::new());
    /// let guard = RoleGuard::new(|_state| async { vec!["editor".to_string()] }, ["editor"])
    ///     .with_cache(cache.clone(), Some(Duration::from_secs(30)));
    /// guard.invalidate_cache();
    /// ```
    #[derive(Debug)]
    pub struct LruGuardCache<V> {
        state: Mutex<State<V>>,
    }

    impl<V: Clone + Send> LruGuardCache<V> {
        const DEFAULT_CAPACITY: usize = 256;

        pub fn new() -> Self {
            Self::with_capacity(Self::DEFAULT_CAPACITY)
        }

        /// Create a cache holding at most `capacity` entries (minimum 1)
        pub fn with_capacity(capacity: usize) -> Self {
            let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
            Self {
                state: Mutex::new(State {
                    entries: LruCache::new(cap),
                    stats: CacheStats::default(),
                }),
            }
        }

        pub fn stats(&self) -> CacheStats {
            self.state.lock().stats.clone()
        }

        pub fn reset_stats(&self) {
            self.state.lock().stats = CacheStats::default();
        }

        pub fn len(&self) -> usize {
            self.state.lock().entries.len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    impl<V: Clone + Send> Default for LruGuardCache<V> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<V: Clone + Send> GuardCache<V> for LruGuardCache<V> {
        fn get(&self, key: &str) -> Option<V> {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let now = Instant::now();

            let expired = match state.entries.get(key) {
                Some(entry) if entry.is_expired(now) => true,
                Some(entry) => {
                    let value = entry.value.clone();
                    state.stats.hits += 1;
                    trace_log!("Guard cache hit for '{}'", key);
                    return Some(value);
                }
                None => false,
            };

            if expired {
                state.entries.pop(key);
                state.stats.expirations += 1;
                trace_log!("Guard cache entry '{}' expired", key);
            }
            state.stats.misses += 1;
            None
        }

        fn set(&self, key: &str, value: V, ttl: Option<Duration>) {
            let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
            trace_log!("Caching '{}' (ttl {:?})", key, ttl);
            self.state
                .lock()
                .entries
                .put(key.to_string(), Entry { value, expires_at });
        }

        fn invalidate(&self, key: &str) {
            let mut state = self.state.lock();
            if state.entries.pop(key).is_some() {
                state.stats.invalidations += 1;
            }
        }

        fn clear(&self) {
            trace_log!("Clearing guard cache");
            let mut state = self.state.lock();
            state.entries.clear();
            state.stats.invalidations += 1;
        }
    }
}

#[cfg(all(test, feature = "cache"))]
mod tests {
    use super::*;

    #[test]
    fn test_cache_miss_then_hit() {
        let cache = LruGuardCache::new();
        assert_eq!(cache.get("roles"), None::<Vec<String>>);

        cache.set("roles", vec!["admin".to_string()], None);
        assert_eq!(cache.get("roles"), Some(vec!["admin".to_string()]));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache = LruGuardCache::new();
        cache.set("session", true, Some(Duration::ZERO));

        assert_eq!(cache.get("session"), None);
        assert_eq!(cache.stats().expirations, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_long_ttl_survives() {
        let cache = LruGuardCache::new();
        cache.set("session", true, Some(Duration::from_secs(3600)));
        assert_eq!(cache.get("session"), Some(true));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = LruGuardCache::new();
        cache.set("a", 1, None);
        cache.set("b", 2, None);

        cache.invalidate("a");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().invalidations, 2);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = LruGuardCache::with_capacity(2);
        cache.set("a", 1, None);
        cache.set("b", 2, None);
        cache.get("a");
        cache.set("c", 3, None);

        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = LruGuardCache::with_capacity(0);
        cache.set("a", 1, None);
        assert_eq!(cache.len(), 1);
    }
}
