//! Adaptive replacement cache (ARC).
//!
//! Four LRU lists share a directory of at most `2 * capacity` keys:
//!
//! ```text
//!   B1 (ghosts) ◀── T1 (seen once) │ T2 (seen twice+) ──▶ B2 (ghosts)
//!                  ◀──── p ────▶
//! ```
//!
//! A hit in T1 promotes the entry to T2. Evicted keys are remembered in the
//! matching ghost list; a later insert of a ghost key moves the target `p`
//! toward the list that would have kept it, so the split between recency and
//! frequency adapts to the workload.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::error::CacheError;

/// Bounded cache with ARC eviction. Not synchronized.
pub struct ArcCache<K: Hash + Eq, V> {
    capacity: usize,
    /// Target size of T1.
    p: usize,
    t1: LruCache<K, V>,
    b1: LruCache<K, ()>,
    t2: LruCache<K, V>,
    b2: LruCache<K, ()>,
}

impl<K: Hash + Eq + Clone, V> ArcCache<K, V> {
    /// Create a cache holding at most `capacity` live entries.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        let size = NonZeroUsize::new(capacity).ok_or(CacheError::InvalidCapacity(capacity))?;
        Ok(Self {
            capacity,
            p: 0,
            t1: LruCache::new(size),
            b1: LruCache::new(size),
            t2: LruCache::new(size),
            b2: LruCache::new(size),
        })
    }

    /// Look up `key`, promoting it to the frequent list.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some((k, v)) = self.t1.pop_entry(key) {
            self.t2.put(k, v);
        }
        self.t2.get(key)
    }

    /// Look up `key` without touching recency or frequency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.t1.peek(key).or_else(|| self.t2.peek(key))
    }

    /// Whether `key` is live in the cache. Ghost entries do not count.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.t1.contains(key) || self.t2.contains(key)
    }

    /// Insert or overwrite `key`.
    pub fn put(&mut self, key: K, value: V) {
        // Live entry: a second touch always lands in T2.
        if self.t1.pop(&key).is_some() || self.t2.contains(&key) {
            self.t2.put(key, value);
            return;
        }

        if self.b1.contains(&key) {
            let (b1, b2) = (self.b1.len(), self.b2.len());
            let delta = if b2 > b1 { b2 / b1 } else { 1 };
            self.p = (self.p + delta).min(self.capacity);

            if self.is_full() {
                self.replace(false);
            }
            self.b1.pop(&key);
            self.t2.put(key, value);
            return;
        }

        if self.b2.contains(&key) {
            let (b1, b2) = (self.b1.len(), self.b2.len());
            let delta = if b1 > b2 { b1 / b2 } else { 1 };
            self.p = self.p.saturating_sub(delta);

            if self.is_full() {
                self.replace(true);
            }
            self.b2.pop(&key);
            self.t2.put(key, value);
            return;
        }

        if self.is_full() {
            self.replace(false);
        }

        // Keep the ghost lists within their share of the directory.
        if self.b1.len() > self.capacity - self.p {
            self.b1.pop_lru();
        }
        if self.b2.len() > self.p {
            self.b2.pop_lru();
        }

        self.t1.put(key, value);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.t1.len() + self.t2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of live entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries seen once since admission.
    pub fn recent_len(&self) -> usize {
        self.t1.len()
    }

    /// Entries seen at least twice.
    pub fn frequent_len(&self) -> usize {
        self.t2.len()
    }

    fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Evict one live entry into its ghost list.
    fn replace(&mut self, b2_contains_key: bool) {
        let t1 = self.t1.len();
        let prefer_t1 = t1 > 0 && (t1 > self.p || (t1 == self.p && b2_contains_key));

        if prefer_t1 || self.t2.is_empty() {
            if let Some((k, _)) = self.t1.pop_lru() {
                self.b1.put(k, ());
            }
        } else if let Some((k, _)) = self.t2.pop_lru() {
            self.b2.put(k, ());
        }
    }
}

impl<K: Hash + Eq, V> fmt::Debug for ArcCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArcCache")
            .field("capacity", &self.capacity)
            .field("p", &self.p)
            .field("t1", &self.t1.len())
            .field("t2", &self.t2.len())
            .field("b1", &self.b1.len())
            .field("b2", &self.b2.len())
            .finish()
    }
}
