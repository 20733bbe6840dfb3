// VibeCoin Trie Cryptography Module
//
// Content addressing for trie nodes: every committed node is identified by
// the SHA-256 digest of its encoded bytes.

pub mod hash;

pub use hash::{sha256, Hash, HASH_SIZE};
