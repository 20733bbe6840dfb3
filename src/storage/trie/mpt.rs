use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::crypto::Hash;
use crate::storage::trie::error::{TrieError, TrieResult};
use crate::storage::trie::insert::insert;
use crate::storage::trie::iter::TrieIter;
use crate::storage::trie::node::Node;
use crate::storage::trie::node_store::NodeStore;
use crate::storage::trie::path::{bytes_to_nibbles, NibbleCursor};
use crate::storage::trie::proof::{self, Proof};
use crate::storage::trie::remove::remove;
use crate::storage::trie::resolve::{resolve_node, resolve_value};

/// Merkle Patricia Trie over a shared `NodeStore`.
///
/// A trie is an immutable value: `set` and `remove` return a new trie and
/// leave `self` untouched, sharing every unchanged subtree with it. Cloning is
/// cheap. `commit` writes the new parts to the backing table and yields a
/// trie whose root is a single hash reference, which is how one world state
/// per block stays affordable.
#[derive(Clone)]
pub struct MerklePatriciaTrie {
    /// Root node of the trie
    root: Arc<Node>,
    /// Backing table and reference cache
    store: Arc<NodeStore>,
}

impl MerklePatriciaTrie {
    /// Create a new empty trie
    pub fn new(store: Arc<NodeStore>) -> Self {
        Self { root: Arc::new(Node::Empty), store }
    }

    /// Reopen a committed trie by its root hash.
    ///
    /// `Hash::ZERO` is the empty trie. Other roots are expanded lazily, so a
    /// missing root only surfaces on first access.
    pub fn from_root(store: Arc<NodeStore>, root_hash: Hash) -> Self {
        let root = if root_hash.is_zero() {
            Node::Empty
        } else {
            Node::reference(root_hash)
        };
        Self { root: Arc::new(root), store }
    }

    /// Root node
    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// The store this trie reads from and commits to
    pub fn store(&self) -> &Arc<NodeStore> {
        &self.store
    }

    /// Root hash.
    ///
    /// Free for committed and empty tries. For an uncommitted root the whole
    /// uncommitted part is encoded and hashed, so hot paths should commit
    /// first.
    pub fn hash(&self) -> TrieResult<Hash> {
        self.root.hash()
    }

    /// True when the root is a reference or empty
    pub fn is_committed(&self) -> bool {
        matches!(self.root.as_ref(), Node::Reference { .. } | Node::Empty)
    }

    /// True when the trie holds no entries
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Get a value, failing with `KeyNotFound` when absent
    pub fn get<K: AsRef<[u8]>>(&self, key: K) -> TrieResult<Vec<u8>> {
        self.try_get(key)?.ok_or(TrieError::KeyNotFound)
    }

    /// Get a value if present
    pub fn try_get<K: AsRef<[u8]>>(&self, key: K) -> TrieResult<Option<Vec<u8>>> {
        let nibbles = bytes_to_nibbles(key.as_ref());
        resolve_value(&self.store, &self.root, NibbleCursor::new(&nibbles))
    }

    /// Check if a key has a value
    pub fn contains_key<K: AsRef<[u8]>>(&self, key: K) -> TrieResult<bool> {
        Ok(self.try_get(key)?.is_some())
    }

    /// Subtree addressed by the full key, expanded.
    ///
    /// Fails with `KeyNotFound` when nothing hangs at that path.
    pub fn get_node<K: AsRef<[u8]>>(&self, key: K) -> TrieResult<Arc<Node>> {
        let nibbles = bytes_to_nibbles(key.as_ref());
        let node = resolve_node(&self.store, &self.root, NibbleCursor::new(&nibbles))?;
        if node.is_empty() {
            return Err(TrieError::KeyNotFound);
        }
        Ok(node)
    }

    /// A new trie with `value` stored at `key`
    pub fn set<K: AsRef<[u8]>, V: Into<Vec<u8>>>(&self, key: K, value: V) -> TrieResult<Self> {
        let nibbles = bytes_to_nibbles(key.as_ref());
        let root = insert(&self.store, &self.root, NibbleCursor::new(&nibbles), value.into())?;
        Ok(self.with_root(root))
    }

    /// A new trie without `key`.
    ///
    /// Fails with `EmptyTrie` on an empty trie and `KeyNotFound` when the key
    /// has no value.
    pub fn remove<K: AsRef<[u8]>>(&self, key: K) -> TrieResult<Self> {
        if self.root.is_empty() {
            return Err(TrieError::EmptyTrie);
        }
        let nibbles = bytes_to_nibbles(key.as_ref());
        let root = remove(&self.store, &self.root, NibbleCursor::new(&nibbles))?;
        Ok(self.with_root(root))
    }

    /// Write all uncommitted nodes to the backing table.
    ///
    /// The returned trie's root is a reference (or empty). Committing an
    /// already committed trie writes nothing.
    pub fn commit(&self) -> TrieResult<Self> {
        if self.is_committed() {
            return Ok(self.clone());
        }
        let root_hash = self.store.commit(&self.root)?;
        debug!("Trie committed with root {}", root_hash);
        Ok(Self::from_root(self.store.clone(), root_hash))
    }

    /// Lazily iterate every key/value pair in key order
    pub fn iter(&self) -> TrieIter {
        self.iter_prefix(b"")
    }

    /// Lazily iterate the pairs whose key starts with `prefix`, in key order
    pub fn iter_prefix<P: AsRef<[u8]>>(&self, prefix: P) -> TrieIter {
        TrieIter::new(self.store.clone(), self.root.clone(), prefix.as_ref())
    }

    /// Generate a proof for a key
    pub fn generate_proof<K: AsRef<[u8]>>(&self, key: K) -> TrieResult<Proof> {
        proof::generate_proof(&self.store, &self.root, key.as_ref())
    }

    /// Verify a proof against a root hash, returning the proven value
    pub fn verify_proof<K: AsRef<[u8]>>(root_hash: &Hash, key: K, proof: &Proof) -> TrieResult<Option<Vec<u8>>> {
        proof::verify_proof(root_hash, key.as_ref(), proof)
    }

    fn with_root(&self, root: Node) -> Self {
        Self { root: Arc::new(root), store: self.store.clone() }
    }
}

impl fmt::Debug for MerklePatriciaTrie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root.as_ref() {
            Node::Reference { hash } => write!(f, "MerklePatriciaTrie({})", hash),
            Node::Empty => write!(f, "MerklePatriciaTrie(empty)"),
            other => write!(f, "MerklePatriciaTrie(uncommitted {})", other.node_type()),
        }
    }
}
