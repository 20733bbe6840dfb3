use dashmap::DashMap;
use thiserror::Error;

#[cfg(feature = "rocksdb")]
use rocksdb::{DB, Options, WriteBatch};
#[cfg(feature = "rocksdb")]
use std::path::Path;

#[cfg(feature = "rocksdb")]
use crate::config::StorageConfig;

/// Error type for KVStore operations
#[derive(Debug, Error)]
pub enum KVStoreError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDBError(String),

    /// Batch operation failed
    #[error("Batch operation failed: {0}")]
    BatchOperationFailed(String),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

#[cfg(feature = "rocksdb")]
impl From<rocksdb::Error> for KVStoreError {
    fn from(err: rocksdb::Error) -> Self {
        KVStoreError::RocksDBError(err.to_string())
    }
}

/// Write batch operation for atomic updates
#[derive(Debug, Clone)]
pub enum WriteBatchOperation {
    /// Put operation
    Put { key: String, value: Vec<u8> },
    /// Delete operation
    Delete { key: String },
}

/// Extension trait for Vec<WriteBatchOperation>
pub trait WriteBatchOperationExt {
    /// Add a put operation to the batch
    fn put(&mut self, key: String, value: Vec<u8>);

    /// Add a delete operation to the batch
    fn delete(&mut self, key: String);
}

impl WriteBatchOperationExt for Vec<WriteBatchOperation> {
    fn put(&mut self, key: String, value: Vec<u8>) {
        self.push(WriteBatchOperation::Put { key, value });
    }

    fn delete(&mut self, key: String) {
        self.push(WriteBatchOperation::Delete { key });
    }
}

/// Backing table for committed trie nodes.
///
/// Keys are the hex encoding of a node hash, values are encoded node bytes.
/// Implementations must be safe to share between threads; the trie only ever
/// performs point lookups and puts.
pub trait KVStore: Send + Sync {
    /// Put a key-value pair
    fn put(&self, key: &str, value: &[u8]) -> Result<(), KVStoreError>;

    /// Get a value by key
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Delete a key-value pair
    fn delete(&self, key: &str) -> Result<(), KVStoreError>;

    /// Check if a key exists
    fn exists(&self, key: &str) -> Result<bool, KVStoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Write a batch of operations atomically
    fn write_batch(&self, operations: Vec<WriteBatchOperation>) -> Result<(), KVStoreError>;

    /// Flush any pending writes to disk
    fn flush(&self) -> Result<(), KVStoreError>;
}

/// In-memory KVStore, used for tests and ephemeral world states
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KVStore for MemoryStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), KVStoreError> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn delete(&self, key: &str) -> Result<(), KVStoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, KVStoreError> {
        Ok(self.entries.contains_key(key))
    }

    fn write_batch(&self, operations: Vec<WriteBatchOperation>) -> Result<(), KVStoreError> {
        for op in operations {
            match op {
                WriteBatchOperation::Put { key, value } => {
                    self.entries.insert(key, value);
                },
                WriteBatchOperation::Delete { key } => {
                    self.entries.remove(&key);
                },
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), KVStoreError> {
        Ok(())
    }
}

/// RocksDB implementation of KVStore
#[cfg(feature = "rocksdb")]
pub struct RocksDBStore {
    /// RocksDB instance
    db: DB,
}

#[cfg(feature = "rocksdb")]
impl RocksDBStore {
    /// Create a new RocksDBStore
    pub fn new(path: &Path) -> Result<Self, KVStoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        Self::with_options(path, opts)
    }

    /// Create a new RocksDBStore with custom options
    pub fn with_options(path: &Path, options: Options) -> Result<Self, KVStoreError> {
        let db = DB::open(&options, path)
            .map_err(|e| KVStoreError::RocksDBError(format!("Failed to open RocksDB: {}", e)))?;
        Ok(Self { db })
    }

    /// Open the database described by a storage configuration
    pub fn from_config(config: &StorageConfig) -> Result<Self, KVStoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        if config.enable_compression {
            opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        } else {
            opts.set_compression_type(rocksdb::DBCompressionType::None);
        }
        Self::with_options(Path::new(&config.db_path), opts)
    }
}

#[cfg(feature = "rocksdb")]
impl KVStore for RocksDBStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), KVStoreError> {
        self.db.put(key.as_bytes(), value)
            .map_err(|e| KVStoreError::RocksDBError(format!("Failed to put key: {}", e)))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.db.get(key.as_bytes())
            .map_err(|e| KVStoreError::RocksDBError(format!("Failed to get key: {}", e)))
    }

    fn delete(&self, key: &str) -> Result<(), KVStoreError> {
        self.db.delete(key.as_bytes())
            .map_err(|e| KVStoreError::RocksDBError(format!("Failed to delete key: {}", e)))
    }

    fn write_batch(&self, operations: Vec<WriteBatchOperation>) -> Result<(), KVStoreError> {
        let mut batch = WriteBatch::default();

        for op in operations {
            match op {
                WriteBatchOperation::Put { key, value } => {
                    batch.put(key.as_bytes(), &value);
                },
                WriteBatchOperation::Delete { key } => {
                    batch.delete(key.as_bytes());
                },
            }
        }

        self.db.write(batch)
            .map_err(|e| KVStoreError::BatchOperationFailed(format!("Failed to write batch: {}", e)))
    }

    fn flush(&self) -> Result<(), KVStoreError> {
        self.db.flush()
            .map_err(|e| KVStoreError::RocksDBError(format!("Failed to flush: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_basic_operations() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.put("test_key", b"test_value").unwrap();
        assert_eq!(store.get("test_key").unwrap(), Some(b"test_value".to_vec()));
        assert!(store.exists("test_key").unwrap());
        assert!(!store.exists("nonexistent_key").unwrap());

        store.delete("test_key").unwrap();
        assert_eq!(store.get("test_key").unwrap(), None);
    }

    #[test]
    fn test_memory_store_batch_operations() {
        let store = MemoryStore::new();

        let mut batch = Vec::new();
        batch.put("key1".to_string(), b"value1".to_vec());
        batch.put("key2".to_string(), b"value2".to_vec());
        store.write_batch(batch).unwrap();
        assert_eq!(store.len(), 2);

        let mut batch = Vec::new();
        batch.delete("key1".to_string());
        batch.put("key2".to_string(), b"updated".to_vec());
        store.write_batch(batch).unwrap();

        assert_eq!(store.get("key1").unwrap(), None);
        assert_eq!(store.get("key2").unwrap(), Some(b"updated".to_vec()));
    }

    #[cfg(feature = "rocksdb")]
    #[test]
    fn test_rocksdb_store_batch_and_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        {
            let store = RocksDBStore::new(temp_dir.path()).unwrap();
            let mut batch = Vec::new();
            batch.put("key1".to_string(), b"value1".to_vec());
            batch.put("key2".to_string(), b"value2".to_vec());
            store.write_batch(batch).unwrap();
            store.flush().unwrap();
        }

        let store = RocksDBStore::new(temp_dir.path()).unwrap();
        assert_eq!(store.get("key1").unwrap(), Some(b"value1".to_vec()));
        assert!(store.exists("key2").unwrap());
        assert!(!store.exists("key3").unwrap());
    }
}
