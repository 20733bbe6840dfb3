// Vibecoin state trie - persistent Merkle Patricia Trie for the world state

pub mod config;
pub mod crypto;
pub mod storage;

pub use config::{Config, ConfigError};
pub use crypto::Hash;
pub use storage::{KVStore, MemoryStore, MerklePatriciaTrie, NodeStore, Proof, TrieError, TrieResult};

// Initialize logging
pub fn init_logger() {
    env_logger::init();
}
