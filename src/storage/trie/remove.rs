//! Write path: removal.
//!
//! The structural inverse of insertion. Branches left with a single entry
//! collapse and adjacent extensions coalesce, so removing a key restores the
//! exact shape the tree had before that key was inserted.

use std::sync::Arc;

use crate::storage::trie::error::{TrieError, TrieResult};
use crate::storage::trie::node::{Children, Node};
use crate::storage::trie::node_store::NodeStore;
use crate::storage::trie::path::NibbleCursor;

/// Return a new tree equal to `node` without the mapping at `path`.
///
/// Fails with `KeyNotFound` when no value is stored at `path`. The result is
/// never a bare reference.
pub fn remove(store: &NodeStore, node: &Node, path: NibbleCursor<'_>) -> TrieResult<Node> {
    match node {
        Node::Empty => Err(TrieError::KeyNotFound),

        Node::Leaf { .. } => {
            if path.is_end() {
                Ok(Node::Empty)
            } else {
                Err(TrieError::KeyNotFound)
            }
        },

        Node::Extension { key, child } => {
            if !path.starts_with(key) {
                return Err(TrieError::KeyNotFound);
            }
            let new_child = remove(store, child, path.advance(key.len()))?;
            Ok(prepend_fragment(key, new_child))
        },

        Node::Branch { children, value } => {
            if path.is_end() {
                if value.is_none() {
                    return Err(TrieError::KeyNotFound);
                }
                return reduce_branch(store, children.clone(), None);
            }

            let index = path.current() as usize;
            let child = children[index].as_ref().ok_or(TrieError::KeyNotFound)?;
            let new_child = remove(store, child, path.advance(1))?;

            let mut children = children.clone();
            children[index] = if new_child.is_empty() { None } else { Some(Arc::new(new_child)) };
            reduce_branch(store, children, value.clone())
        },

        Node::Reference { hash } => {
            let expanded = store.expand(hash)?;
            remove(store, &expanded, path)
        },
    }
}

/// Put `fragment` in front of `node`, merging with it when it is an
/// extension itself.
fn prepend_fragment(fragment: &[u8], node: Node) -> Node {
    match node {
        Node::Empty => Node::Empty,
        Node::Extension { key, child } => {
            let mut merged = Vec::with_capacity(fragment.len() + key.len());
            merged.extend_from_slice(fragment);
            merged.extend_from_slice(&key);
            Node::extension(merged, child)
        },
        other => Node::extension(fragment.to_vec(), Arc::new(other)),
    }
}

/// Restore canonical form after a branch lost an entry.
///
/// - no entries: `Empty` (only reachable when the whole trie empties)
/// - only the value: `Leaf(value)`
/// - only child `i`: the child behind a one-nibble extension, merged into
///   the child's own fragment when it is an extension
/// - two or more: the branch itself
pub fn reduce_branch(store: &NodeStore, children: Children, value: Option<Vec<u8>>) -> TrieResult<Node> {
    let (first, more) = {
        let mut populated = children.iter().enumerate().filter_map(|(i, c)| c.clone().map(|c| (i, c)));
        (populated.next(), populated.next().is_some())
    };

    match (first, value, more) {
        (None, None, _) => Ok(Node::Empty),
        (None, Some(value), _) => Ok(Node::leaf(value)),
        (Some((index, child)), None, false) => {
            // A committed child has to be opened to learn whether it is an
            // extension that must absorb the nibble
            let resolved = store.resolve(&child)?;
            let nibble = [index as u8];
            Ok(match resolved.as_ref() {
                Node::Extension { .. } => prepend_fragment(&nibble, resolved.as_ref().clone()),
                _ => Node::extension(nibble.to_vec(), child),
            })
        },
        (_, value, _) => Ok(Node::branch(children, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv_store::MemoryStore;
    use crate::storage::trie::insert::insert;
    use crate::storage::trie::path::bytes_to_nibbles;
    use array_init::array_init;

    fn store() -> NodeStore {
        NodeStore::new(Arc::new(MemoryStore::new()))
    }

    fn put(store: &NodeStore, root: &Node, key: &[u8], value: &[u8]) -> Node {
        let nibbles = bytes_to_nibbles(key);
        insert(store, root, NibbleCursor::new(&nibbles), value.to_vec()).unwrap()
    }

    fn del(store: &NodeStore, root: &Node, key: &[u8]) -> TrieResult<Node> {
        let nibbles = bytes_to_nibbles(key);
        remove(store, root, NibbleCursor::new(&nibbles))
    }

    #[test]
    fn test_remove_only_key() {
        let store = store();
        let root = put(&store, &Node::Empty, b"key", b"v");
        assert_eq!(del(&store, &root, b"key").unwrap(), Node::Empty);
    }

    #[test]
    fn test_remove_missing_key() {
        let store = store();
        let root = put(&store, &Node::Empty, b"key", b"v");
        assert!(matches!(del(&store, &root, b"ke"), Err(TrieError::KeyNotFound)));
        assert!(matches!(del(&store, &root, b"keys"), Err(TrieError::KeyNotFound)));
        assert!(matches!(del(&store, &root, b"other"), Err(TrieError::KeyNotFound)));
        assert!(matches!(del(&store, &Node::Empty, b"key"), Err(TrieError::KeyNotFound)));
    }

    #[test]
    fn test_remove_restores_previous_shape() {
        let store = store();
        let base = put(&store, &Node::Empty, b"a", b"1");
        let grown = put(&store, &base, b"ab", b"2");
        assert_eq!(del(&store, &grown, b"ab").unwrap(), base);

        let only_ab = put(&store, &Node::Empty, b"ab", b"2");
        assert_eq!(del(&store, &grown, b"a").unwrap(), only_ab);
    }

    #[test]
    fn test_remove_collapses_split_extension() {
        let store = store();
        let base = put(&store, &Node::Empty, b"ab", b"1");
        let grown = put(&store, &base, b"ar", b"2");
        assert_eq!(del(&store, &grown, b"ar").unwrap(), base);

        let base = put(&store, &Node::Empty, b"a", b"1");
        let grown = put(&store, &base, b"q", b"2");
        assert_eq!(del(&store, &grown, b"q").unwrap(), base);
    }

    #[test]
    fn test_reduce_branch_cases() {
        let store = store();
        let leaf = Arc::new(Node::leaf(b"x".to_vec()));

        let empty: Children = array_init(|_| None);
        assert_eq!(reduce_branch(&store, empty.clone(), None).unwrap(), Node::Empty);
        assert_eq!(reduce_branch(&store, empty, Some(b"v".to_vec())).unwrap(), Node::leaf(b"v".to_vec()));

        let mut single: Children = array_init(|_| None);
        single[4] = Some(leaf.clone());
        assert_eq!(
            reduce_branch(&store, single, None).unwrap(),
            Node::extension(vec![4], leaf.clone())
        );

        let mut single_ext: Children = array_init(|_| None);
        single_ext[4] = Some(Arc::new(Node::extension(vec![7, 8], leaf.clone())));
        assert_eq!(
            reduce_branch(&store, single_ext, None).unwrap(),
            Node::extension(vec![4, 7, 8], leaf.clone())
        );

        let mut pair: Children = array_init(|_| None);
        pair[4] = Some(leaf.clone());
        assert!(matches!(reduce_branch(&store, pair, Some(b"v".to_vec())).unwrap(), Node::Branch { .. }));
    }

    #[test]
    fn test_reduce_merges_committed_extension_child() {
        let store = store();
        let child = Node::extension(vec![7, 8], Arc::new(Node::leaf(b"x".to_vec())));
        let hash = store.commit(&child).unwrap();

        let mut single: Children = array_init(|_| None);
        single[4] = Some(Arc::new(Node::reference(hash)));
        let reduced = reduce_branch(&store, single, None).unwrap();

        let Node::Extension { key, .. } = &reduced else { panic!("expected extension, got {:?}", reduced) };
        assert_eq!(key, &vec![4, 7, 8]);
        assert_eq!(reduced.hash().unwrap(), Node::extension(vec![4, 7, 8], Arc::new(Node::leaf(b"x".to_vec()))).hash().unwrap());
    }

    #[test]
    fn test_remove_through_committed_tree() {
        let store = store();
        let mut root = Node::Empty;
        for key in [&b"do"[..], b"dog", b"doge", b"horse"] {
            root = put(&store, &root, key, key);
        }
        let without_doge = del(&store, &root, b"doge").unwrap();

        let hash = store.commit(&root).unwrap();
        let removed = del(&store, &Node::reference(hash), b"doge").unwrap();
        assert_eq!(removed.hash().unwrap(), without_doge.hash().unwrap());
    }
}
