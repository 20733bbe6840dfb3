// Storage module for the Vibecoin state trie
// Key-value backing tables and the Merkle Patricia Trie built on them

pub mod kv_store;
pub mod trie;

// Re-export main components
pub use kv_store::{KVStore, KVStoreError, MemoryStore, WriteBatchOperation};
#[cfg(feature = "rocksdb")]
pub use kv_store::RocksDBStore;
pub use trie::{MerklePatriciaTrie, NodeStore, Proof, TrieError, TrieResult};
