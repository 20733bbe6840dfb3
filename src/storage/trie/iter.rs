use std::sync::Arc;

use crate::storage::trie::error::TrieResult;
use crate::storage::trie::node::{Node, BRANCH_WIDTH};
use crate::storage::trie::node_store::NodeStore;
use crate::storage::trie::path::{bytes_to_nibbles, nibbles_to_bytes, Nibble};

/// Lazy depth-first walk over the key/value pairs of a trie.
///
/// Pairs come out in nibble order, which for byte keys is lexicographic
/// order. References are expanded one node at a time as the walk reaches
/// them, so dropping the iterator early leaves the rest of the trie unread.
/// After the first error the iterator is exhausted.
pub struct TrieIter {
    store: Arc<NodeStore>,
    prefix: Vec<Nibble>,
    stack: Vec<(Arc<Node>, Vec<Nibble>)>,
    failed: bool,
}

impl TrieIter {
    /// Iterate every pair whose key starts with `prefix`
    pub(crate) fn new(store: Arc<NodeStore>, root: Arc<Node>, prefix: &[u8]) -> Self {
        Self {
            store,
            prefix: bytes_to_nibbles(prefix),
            stack: vec![(root, Vec::new())],
            failed: false,
        }
    }

    fn step(&mut self) -> TrieResult<Option<(Vec<u8>, Vec<u8>)>> {
        while let Some((node, path)) = self.stack.pop() {
            // Part of the prefix the walk has not matched yet
            let pending = &self.prefix[path.len().min(self.prefix.len())..];

            match node.as_ref() {
                Node::Empty => {},

                Node::Leaf { value } => {
                    if pending.is_empty() {
                        return Ok(Some((nibbles_to_bytes(&path), value.clone())));
                    }
                },

                Node::Extension { key, child } => {
                    if key.starts_with(pending) || pending.starts_with(key) {
                        let mut child_path = path;
                        child_path.extend_from_slice(key);
                        self.stack.push((child.clone(), child_path));
                    }
                },

                Node::Branch { children, value } => {
                    if let Some(&nibble) = pending.first() {
                        if let Some(child) = &children[nibble as usize] {
                            let mut child_path = path;
                            child_path.push(nibble);
                            self.stack.push((child.clone(), child_path));
                        }
                        continue;
                    }

                    for index in (0..BRANCH_WIDTH).rev() {
                        if let Some(child) = &children[index] {
                            let mut child_path = path.clone();
                            child_path.push(index as Nibble);
                            self.stack.push((child.clone(), child_path));
                        }
                    }
                    if let Some(value) = value {
                        return Ok(Some((nibbles_to_bytes(&path), value.clone())));
                    }
                },

                Node::Reference { hash } => {
                    let expanded = self.store.expand(hash)?;
                    self.stack.push((expanded, path));
                },
            }
        }
        Ok(None)
    }
}

impl Iterator for TrieIter {
    type Item = TrieResult<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.step() {
            Ok(pair) => pair.map(Ok),
            Err(e) => {
                self.failed = true;
                self.stack.clear();
                Some(Err(e))
            },
        }
    }
}
