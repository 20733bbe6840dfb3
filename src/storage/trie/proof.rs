use std::sync::Arc;

use serde::{Serialize, Deserialize};

use crate::crypto::Hash;
use crate::storage::trie::encode::{compact_decode, StoredNode};
use crate::storage::trie::error::{TrieError, TrieResult};
use crate::storage::trie::node::Node;
use crate::storage::trie::node_store::NodeStore;
use crate::storage::trie::path::{bytes_to_nibbles, NibbleCursor};

/// Merkle proof of a key's value (or absence) under a root hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    /// The key being proven
    pub key: Vec<u8>,
    /// The value being proven (if found)
    pub value: Option<Vec<u8>>,
    /// Encoded nodes along the lookup path, root first
    pub nodes: Vec<Vec<u8>>,
    /// The root hash the proof chains to
    pub root_hash: Hash,
}

/// Encoded bytes of a single node, children referenced by hash
fn encode_single(node: &Node) -> TrieResult<Vec<u8>> {
    let mut last = None;
    node.seal(&mut |_, bytes| last = Some(bytes))?;
    last.ok_or_else(|| TrieError::Encode("empty node has no encoding".to_string()))
}

/// Collect the nodes on the lookup path of `key`
pub fn generate_proof(store: &NodeStore, root: &Arc<Node>, key: &[u8]) -> TrieResult<Proof> {
    let root_hash = root.hash()?;
    let nibbles = bytes_to_nibbles(key);
    let mut path = NibbleCursor::new(&nibbles);
    let mut nodes = Vec::new();
    let mut current = root.clone();

    let value = loop {
        let node = store.resolve(&current)?;
        if node.is_empty() {
            break None;
        }
        nodes.push(encode_single(&node)?);

        match node.as_ref() {
            Node::Leaf { value } => break path.is_end().then(|| value.clone()),
            Node::Extension { key, child } => {
                if !path.starts_with(key) {
                    break None;
                }
                path = path.advance(key.len());
                current = child.clone();
            },
            Node::Branch { children, value } => {
                if path.is_end() {
                    break value.clone();
                }
                match &children[path.current() as usize] {
                    Some(child) => {
                        current = child.clone();
                        path = path.advance(1);
                    },
                    None => break None,
                }
            },
            Node::Empty | Node::Reference { .. } => unreachable!("resolved node is concrete and non-empty"),
        }
    };

    Ok(Proof { key: key.to_vec(), value, nodes, root_hash })
}

/// Check `proof` against `root_hash` for `key`.
///
/// Returns the proven value, or `None` for proven absence. Fails with
/// `InvalidProof` when the nodes do not chain to the root, the walk ends
/// early or late, or the claimed value disagrees with the proven one.
pub fn verify_proof(root_hash: &Hash, key: &[u8], proof: &Proof) -> TrieResult<Option<Vec<u8>>> {
    if proof.key != key {
        return Err(TrieError::InvalidProof("proof is for a different key".to_string()));
    }
    if proof.root_hash != *root_hash {
        return Err(TrieError::InvalidProof("proof is for a different root".to_string()));
    }

    let proven = walk_proof(root_hash, key, &proof.nodes)?;
    if proven != proof.value {
        return Err(TrieError::InvalidProof("claimed value does not match the proven value".to_string()));
    }
    Ok(proven)
}

fn walk_proof(root_hash: &Hash, key: &[u8], nodes: &[Vec<u8>]) -> TrieResult<Option<Vec<u8>>> {
    if root_hash.is_zero() {
        return if nodes.is_empty() {
            Ok(None)
        } else {
            Err(TrieError::InvalidProof("nodes supplied for the empty root".to_string()))
        };
    }

    let nibbles = bytes_to_nibbles(key);
    let mut path = NibbleCursor::new(&nibbles);
    let mut expected = *root_hash;

    for (depth, bytes) in nodes.iter().enumerate() {
        if Hash::from_data(bytes) != expected {
            return Err(TrieError::InvalidProof(format!("node {} does not match its parent's hash", depth)));
        }
        let stored = StoredNode::decode(bytes)
            .map_err(|e| TrieError::InvalidProof(format!("node {}: {}", depth, e)))?;

        let next = match stored {
            StoredNode::Leaf { value } => Err(path.is_end().then_some(value)),
            StoredNode::Extension { key, child } => {
                let fragment = compact_decode(&key)
                    .map_err(|e| TrieError::InvalidProof(format!("node {}: {}", depth, e)))?;
                if path.starts_with(&fragment) {
                    path = path.advance(fragment.len());
                    Ok(child)
                } else {
                    Err(None)
                }
            },
            StoredNode::Branch { children, value } => {
                if path.is_end() {
                    Err(value)
                } else {
                    let index = path.current() as usize;
                    path = path.advance(1);
                    children[index].ok_or(None)
                }
            },
        };

        match next {
            Ok(child) => expected = child,
            Err(outcome) => {
                if depth + 1 != nodes.len() {
                    return Err(TrieError::InvalidProof("nodes after the end of the lookup path".to_string()));
                }
                return Ok(outcome);
            },
        }
    }

    Err(TrieError::InvalidProof("proof ends before the lookup path does".to_string()))
}
