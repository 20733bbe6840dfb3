//! Read path: locate a value or subtree by walking a nibble path.
//!
//! References met on the way are expanded through the `NodeStore`, so
//! callers never see one as a result.

use std::sync::Arc;

use crate::storage::trie::error::TrieResult;
use crate::storage::trie::node::Node;
use crate::storage::trie::node_store::NodeStore;
use crate::storage::trie::path::NibbleCursor;

/// Value stored at exactly `path` below `node`, if any
pub fn resolve_value(store: &NodeStore, node: &Node, path: NibbleCursor<'_>) -> TrieResult<Option<Vec<u8>>> {
    match node {
        Node::Empty => Ok(None),

        Node::Leaf { value } => Ok(path.is_end().then(|| value.clone())),

        Node::Extension { key, child } => {
            if path.starts_with(key) {
                resolve_value(store, child, path.advance(key.len()))
            } else {
                Ok(None)
            }
        },

        Node::Branch { children, value } => {
            if path.is_end() {
                return Ok(value.clone());
            }
            match &children[path.current() as usize] {
                Some(child) => resolve_value(store, child, path.advance(1)),
                None => Ok(None),
            }
        },

        Node::Reference { hash } => {
            let expanded = store.expand(hash)?;
            resolve_value(store, &expanded, path)
        },
    }
}

/// Subtree rooted at exactly `path` below `node`, or `Empty` when the path
/// leads nowhere. A reference at the destination is returned expanded.
pub fn resolve_node(store: &NodeStore, node: &Arc<Node>, path: NibbleCursor<'_>) -> TrieResult<Arc<Node>> {
    if path.is_end() {
        return store.resolve(node);
    }

    match node.as_ref() {
        Node::Empty | Node::Leaf { .. } => Ok(Arc::new(Node::Empty)),

        Node::Extension { key, child } => {
            if path.starts_with(key) {
                resolve_node(store, child, path.advance(key.len()))
            } else {
                Ok(Arc::new(Node::Empty))
            }
        },

        Node::Branch { children, .. } => match &children[path.current() as usize] {
            Some(child) => resolve_node(store, child, path.advance(1)),
            None => Ok(Arc::new(Node::Empty)),
        },

        Node::Reference { hash } => {
            let expanded = store.expand(hash)?;
            resolve_node(store, &expanded, path)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv_store::MemoryStore;
    use crate::storage::trie::node::Children;
    use crate::storage::trie::path::bytes_to_nibbles;
    use array_init::array_init;

    /// "a" -> 1, "ab" -> 2, built by hand
    fn sample() -> Arc<Node> {
        let mut children: Children = array_init(|_| None);
        children[6] = Some(Arc::new(Node::extension(vec![2], Arc::new(Node::leaf(vec![2])))));
        let branch = Node::branch(children, Some(vec![1]));
        Arc::new(Node::extension(vec![6, 1], Arc::new(branch)))
    }

    fn store() -> NodeStore {
        NodeStore::new(Arc::new(MemoryStore::new()))
    }

    fn value(store: &NodeStore, root: &Node, key: &[u8]) -> Option<Vec<u8>> {
        let nibbles = bytes_to_nibbles(key);
        resolve_value(store, root, NibbleCursor::new(&nibbles)).unwrap()
    }

    #[test]
    fn test_resolve_value() {
        let store = store();
        let root = sample();
        assert_eq!(value(&store, &root, b"a"), Some(vec![1]));
        assert_eq!(value(&store, &root, b"ab"), Some(vec![2]));
        assert_eq!(value(&store, &root, b"b"), None);
        assert_eq!(value(&store, &root, b"abc"), None);
        assert_eq!(value(&store, &root, b""), None);
    }

    #[test]
    fn test_resolve_value_through_references() {
        let store = store();
        let hash = store.commit(&sample()).unwrap();
        let root = Node::reference(hash);

        assert_eq!(value(&store, &root, b"a"), Some(vec![1]));
        assert_eq!(value(&store, &root, b"ab"), Some(vec![2]));
        assert_eq!(value(&store, &root, b"ac"), None);
    }

    #[test]
    fn test_resolve_node() {
        let store = store();
        let hash = store.commit(&sample()).unwrap();
        let root = Arc::new(Node::reference(hash));

        let nibbles = bytes_to_nibbles(b"a");
        let subtree = resolve_node(&store, &root, NibbleCursor::new(&nibbles)).unwrap();
        assert!(matches!(subtree.as_ref(), Node::Branch { value: Some(v), .. } if v == &vec![1]));

        let nibbles = bytes_to_nibbles(b"ab");
        let subtree = resolve_node(&store, &root, NibbleCursor::new(&nibbles)).unwrap();
        assert_eq!(subtree.as_ref(), &Node::leaf(vec![2]));

        let nibbles = bytes_to_nibbles(b"z");
        let subtree = resolve_node(&store, &root, NibbleCursor::new(&nibbles)).unwrap();
        assert!(subtree.is_empty());
    }
}
