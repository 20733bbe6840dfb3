use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use log::{debug, error, trace};

use crate::config::{ConfigError, TrieConfig};
use crate::crypto::Hash;
use crate::storage::kv_store::{KVStore, WriteBatchOperation, WriteBatchOperationExt};
use crate::storage::trie::cache::NodeCache;
use crate::storage::trie::encode::decode_node;
use crate::storage::trie::error::{TrieError, TrieResult};
use crate::storage::trie::node::Node;

/// A backing table together with the cache of nodes decoded from it.
///
/// One `NodeStore` is shared by every trie version rooted in the same table.
pub struct NodeStore {
    kv: Arc<dyn KVStore>,
    cache: NodeCache,
}

impl NodeStore {
    /// Create a store with the default cache size
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self { kv, cache: NodeCache::default() }
    }

    /// Create a store caching at most `capacity` decoded nodes
    pub fn with_cache_capacity(kv: Arc<dyn KVStore>, capacity: NonZeroUsize) -> Self {
        Self { kv, cache: NodeCache::new(capacity) }
    }

    /// Create a store from trie configuration
    pub fn from_config(kv: Arc<dyn KVStore>, config: &TrieConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_cache_capacity(kv, config.cache_capacity()?))
    }

    /// The backing table
    pub fn kv(&self) -> &Arc<dyn KVStore> {
        &self.kv
    }

    /// The decoded-node cache
    pub fn cache(&self) -> &NodeCache {
        &self.cache
    }

    /// Load the node committed under `hash`.
    ///
    /// The returned node's own children stay unexpanded.
    pub fn expand(&self, hash: &Hash) -> TrieResult<Arc<Node>> {
        if let Some(node) = self.cache.get(hash) {
            trace!("Reference cache hit for {}", hash);
            return Ok(node);
        }

        let bytes = match self.kv.get(&hash.to_hex())? {
            Some(bytes) => bytes,
            None => {
                error!("Committed node {} is missing from the backing table", hash);
                return Err(TrieError::NodeNotFound(*hash));
            },
        };

        let node = Arc::new(decode_node(&bytes)?);
        trace!("Expanded {} node {}", node.node_type(), hash);
        self.cache.put(*hash, node.clone());
        Ok(node)
    }

    /// The node itself, or its expansion if it is a reference
    pub fn resolve(&self, node: &Arc<Node>) -> TrieResult<Arc<Node>> {
        match node.as_ref() {
            Node::Reference { hash } => self.expand(hash),
            _ => Ok(node.clone()),
        }
    }

    /// Write every not-yet-committed node under `root` in one batch and
    /// return the root hash. Subtrees that are already references are
    /// neither re-encoded nor re-written.
    pub fn commit(&self, root: &Node) -> TrieResult<Hash> {
        let mut batch: Vec<WriteBatchOperation> = Vec::new();
        let mut written = HashSet::new();

        let root_hash = root.seal(&mut |hash, bytes| {
            // Anything in the cache was read from the table, so it is stored
            if !self.cache.contains(&hash) && written.insert(hash) {
                batch.put(hash.to_hex(), bytes);
            }
        })?;

        let root_hash = root_hash.unwrap_or(Hash::ZERO);
        if !batch.is_empty() {
            let count = batch.len();
            self.kv.write_batch(batch)?;
            debug!("Committed {} trie nodes, root {}", count, root_hash);
        }
        Ok(root_hash)
    }
}
