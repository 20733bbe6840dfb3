use thiserror::Error;

use crate::crypto::Hash;
use crate::storage::kv_store::KVStoreError;

/// Errors surfaced by trie operations
#[derive(Debug, Error)]
pub enum TrieError {
    /// No value is mapped at the requested key
    #[error("Key not found")]
    KeyNotFound,

    /// Removal was attempted on a trie with no entries
    #[error("Trie is empty")]
    EmptyTrie,

    /// A reference points at a hash the backing table does not hold.
    /// Indicates store corruption; never retried.
    #[error("Node not found in backing table: {0}")]
    NodeNotFound(Hash),

    /// Stored bytes could not be decoded into a node
    #[error("Decode error: {0}")]
    Decode(String),

    /// A node could not be encoded
    #[error("Encode error: {0}")]
    Encode(String),

    /// Backing table failure
    #[error("Storage error: {0}")]
    Store(#[from] KVStoreError),

    /// A Merkle proof did not verify against its root
    #[error("Invalid proof: {0}")]
    InvalidProof(String),
}

/// Result type for trie operations
pub type TrieResult<T> = Result<T, TrieError>;
