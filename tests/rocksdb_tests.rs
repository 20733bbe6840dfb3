#![cfg(feature = "rocksdb")]

use std::sync::Arc;
use tempfile::tempdir;

use vibecoin_trie::config::{Config, StorageConfig};
use vibecoin_trie::storage::kv_store::{KVStore, RocksDBStore, WriteBatchOperation};
use vibecoin_trie::storage::trie::{MerklePatriciaTrie, NodeStore};

#[test]
fn test_rocksdb_store_operations() {
    // Create a temporary directory for the database
    let temp_dir = tempdir().unwrap();
    let store = RocksDBStore::new(temp_dir.path()).unwrap();

    store.put("test_key", b"test_value").unwrap();
    assert_eq!(store.get("test_key").unwrap().unwrap(), b"test_value");
    assert!(store.exists("test_key").unwrap());

    store.delete("test_key").unwrap();
    assert!(store.get("test_key").unwrap().is_none());

    let batch = vec![
        WriteBatchOperation::Put { key: "batch_key1".to_string(), value: b"batch_value1".to_vec() },
        WriteBatchOperation::Put { key: "batch_key2".to_string(), value: b"batch_value2".to_vec() },
        WriteBatchOperation::Delete { key: "batch_key1".to_string() },
    ];
    store.write_batch(batch).unwrap();
    assert!(store.get("batch_key1").unwrap().is_none());
    assert_eq!(store.get("batch_key2").unwrap().unwrap(), b"batch_value2");
    store.flush().unwrap();
}

#[test]
fn test_trie_survives_reopen() {
    let temp_dir = tempdir().unwrap();
    let storage = StorageConfig {
        db_path: temp_dir.path().join("state").to_string_lossy().into_owned(),
        ..StorageConfig::default()
    };
    let config = Config { storage, ..Config::default() };

    let root_hash = {
        let kv = Arc::new(RocksDBStore::from_config(&config.storage).unwrap());
        let store = Arc::new(NodeStore::from_config(kv.clone(), &config.trie).unwrap());
        let trie = MerklePatriciaTrie::new(store)
            .set("account1", "balance:100").unwrap()
            .set("account2", "balance:200").unwrap()
            .set("account3", "balance:300").unwrap()
            .commit().unwrap();
        kv.flush().unwrap();
        trie.hash().unwrap()
    };

    // Reopen the database and load the committed root
    let kv = Arc::new(RocksDBStore::from_config(&config.storage).unwrap());
    let store = Arc::new(NodeStore::from_config(kv, &config.trie).unwrap());
    let trie = MerklePatriciaTrie::from_root(store, root_hash);

    assert_eq!(trie.get("account2").unwrap(), b"balance:200".to_vec());
    assert_eq!(trie.iter().count(), 3);

    let updated = trie.remove("account1").unwrap().commit().unwrap();
    assert!(!updated.contains_key("account1").unwrap());
    assert_eq!(trie.get("account1").unwrap(), b"balance:100".to_vec());
}
