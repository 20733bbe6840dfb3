//! Merkle Patricia Trie for the Vibecoin world state
//!
//! A persistent, content-addressed radix-16 trie. Every update yields a new
//! trie that shares all untouched structure with the old one, and committed
//! subtrees live in a key-value table under the SHA-256 hash of their
//! encoding, so one root hash identifies a whole state.
//!
//! Nodes come in five kinds: empty, leaf, extension (a shared path
//! fragment), branch (16 children plus an optional value) and reference (a
//! committed node known only by hash, loaded on first touch).

pub mod error;
pub mod path;
pub mod node;
pub mod encode;
pub mod cache;
pub mod node_store;
pub mod resolve;
pub mod insert;
pub mod remove;
pub mod iter;
pub mod proof;
pub mod mpt;

// Re-export main components
pub use error::{TrieError, TrieResult};
pub use path::NibbleCursor;
pub use node::Node;
pub use cache::NodeCache;
pub use node_store::NodeStore;
pub use iter::TrieIter;
pub use proof::Proof;
pub use mpt::MerklePatriciaTrie;
