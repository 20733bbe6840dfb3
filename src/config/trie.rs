use std::num::NonZeroUsize;

use serde::{Serialize, Deserialize};

use super::ConfigError;
use crate::storage::trie::cache::DEFAULT_CACHE_CAPACITY;

/// Trie configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrieConfig {
    /// Maximum number of decoded nodes kept in the reference cache
    pub cache_capacity: usize,
}

impl TrieConfig {
    /// The cache capacity, rejecting zero
    pub fn cache_capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.cache_capacity)
            .ok_or_else(|| ConfigError::Invalid("trie.cache_capacity must be at least 1".to_string()))
    }
}

impl Default for TrieConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}
