use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::crypto::Hash;
use crate::storage::trie::node::Node;

/// Default number of decoded nodes kept per store
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Bounded cache of decoded nodes keyed by content hash.
///
/// Least recently used entries are evicted first. Cached nodes keep their
/// own children as references, so an entry costs one decoded node.
pub struct NodeCache {
    entries: Mutex<LruCache<Hash, Arc<Node>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl NodeCache {
    /// Create a cache holding at most `capacity` nodes
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a node, marking it most recently used
    pub fn get(&self, hash: &Hash) -> Option<Arc<Node>> {
        let found = self.entries.lock().get(hash).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Insert a decoded node
    pub fn put(&self, hash: Hash, node: Arc<Node>) {
        self.entries.lock().put(hash, node);
    }

    /// Whether `hash` is cached, without touching recency or counters
    pub fn contains(&self, hash: &Hash) -> bool {
        self.entries.lock().contains(hash)
    }

    /// Number of cached nodes
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached nodes
    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        self.entries.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for NodeCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}
