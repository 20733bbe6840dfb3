use serde::{Serialize, Deserialize};

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database path
    pub db_path: String,

    /// Create the database if it does not exist
    pub create_if_missing: bool,

    /// Enable compression
    pub enable_compression: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "./data/vibecoin/state".to_string(),
            create_if_missing: true,
            enable_compression: true,
        }
    }
}
