use std::sync::Arc;

use array_init::array_init;

use crate::crypto::Hash;
use crate::storage::trie::encode::{compact_encode, StoredNode};
use crate::storage::trie::error::TrieResult;
use crate::storage::trie::path::{format_nibbles, Nibble};

/// Fan-out of a branch node, one slot per nibble
pub const BRANCH_WIDTH: usize = 16;

/// Child slots of a branch node
pub type Children = [Option<Arc<Node>>; BRANCH_WIDTH];

/// Node types in the Merkle Patricia Trie.
///
/// Nodes are immutable once built; edits construct new nodes and share every
/// untouched child through its `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Empty node (null)
    Empty,

    /// The key ends exactly here
    Leaf {
        /// Value stored at this leaf
        value: Vec<u8>,
    },

    /// Nibble prefix shared by every key below `child`.
    /// The fragment is never empty and `child` is never another extension.
    Extension {
        /// Shared nibble prefix
        key: Vec<Nibble>,
        /// Next node
        child: Arc<Node>,
    },

    /// Branch node with up to 16 children
    Branch {
        /// Children nodes (one for each hex digit)
        children: Children,
        /// Value for a key terminating at this branch
        value: Option<Vec<u8>>,
    },

    /// Committed node known only by its hash, expanded through a `NodeStore`
    Reference {
        hash: Hash,
    },
}

impl Node {
    /// Create a new empty node
    pub fn empty() -> Self {
        Node::Empty
    }

    /// Create a new leaf node
    pub fn leaf(value: Vec<u8>) -> Self {
        Node::Leaf { value }
    }

    /// Create a new extension node
    pub fn extension(key: Vec<Nibble>, child: Arc<Node>) -> Self {
        debug_assert!(!key.is_empty(), "extension with empty fragment");
        debug_assert!(!matches!(*child, Node::Extension { .. }), "extension over extension");
        Node::Extension { key, child }
    }

    /// Create a new branch node
    pub fn branch(children: Children, value: Option<Vec<u8>>) -> Self {
        Node::Branch { children, value }
    }

    /// Create a new branch node with no children or value
    pub fn empty_branch() -> Self {
        Node::Branch {
            children: array_init(|_| None),
            value: None,
        }
    }

    /// Create a reference to a committed node
    pub fn reference(hash: Hash) -> Self {
        Node::Reference { hash }
    }

    /// Check if the node is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    /// Check if the node is an unexpanded reference
    pub fn is_reference(&self) -> bool {
        matches!(self, Node::Reference { .. })
    }

    /// Value held directly by this node, if any
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            Node::Leaf { value } => Some(value),
            Node::Branch { value: Some(v), .. } => Some(v),
            _ => None,
        }
    }

    /// Get the node type as a string
    pub fn node_type(&self) -> &'static str {
        match self {
            Node::Empty => "empty",
            Node::Leaf { .. } => "leaf",
            Node::Extension { .. } => "extension",
            Node::Branch { .. } => "branch",
            Node::Reference { .. } => "reference",
        }
    }

    /// Content hash of this node.
    ///
    /// `Empty` hashes to [`Hash::ZERO`] and a reference to the hash it
    /// carries. Anything else is encoded bottom-up, which walks the whole
    /// uncommitted part of the subtree.
    pub fn hash(&self) -> TrieResult<Hash> {
        Ok(self.seal(&mut |_, _| {})?.unwrap_or(Hash::ZERO))
    }

    /// Encode this node bottom-up, handing every freshly encoded node to
    /// `sink` children first. References are not descended into.
    ///
    /// Returns `None` for `Empty`, which is never stored.
    pub(crate) fn seal<F>(&self, sink: &mut F) -> TrieResult<Option<Hash>>
    where
        F: FnMut(Hash, Vec<u8>),
    {
        let stored = match self {
            Node::Empty => return Ok(None),
            Node::Reference { hash } => return Ok(Some(*hash)),
            Node::Leaf { value } => StoredNode::Leaf { value: value.clone() },
            Node::Extension { key, child } => {
                let child = match child.seal(&mut *sink)? {
                    Some(hash) => hash,
                    None => unreachable!("extension {} over an empty child", format_nibbles(key)),
                };
                StoredNode::Extension { key: compact_encode(key), child }
            },
            Node::Branch { children, value } => {
                let mut hashes = [None; BRANCH_WIDTH];
                for (slot, child) in hashes.iter_mut().zip(children.iter()) {
                    if let Some(child) = child {
                        *slot = child.seal(&mut *sink)?;
                    }
                }
                StoredNode::Branch { children: hashes, value: value.clone() }
            },
        };

        let bytes = stored.encode()?;
        let hash = Hash::from_data(&bytes);
        sink(hash, bytes);
        Ok(Some(hash))
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::trie::encode::decode_node;

    fn leaf(value: &[u8]) -> Arc<Node> {
        Arc::new(Node::leaf(value.to_vec()))
    }

    #[test]
    fn test_node_creation() {
        assert!(Node::empty().is_empty());
        assert_eq!(Node::default(), Node::Empty);

        let leaf_node = Node::leaf(vec![4, 5, 6]);
        assert_eq!(leaf_node.node_type(), "leaf");
        assert_eq!(leaf_node.value(), Some(&[4u8, 5, 6][..]));

        let extension = Node::extension(vec![1, 2, 3], leaf(&[4, 5, 6]));
        assert_eq!(extension.node_type(), "extension");
        assert_eq!(extension.value(), None);

        let mut children: Children = array_init(|_| None);
        children[0] = Some(leaf(&[1]));
        let branch = Node::branch(children, Some(vec![7, 8, 9]));
        assert_eq!(branch.node_type(), "branch");
        assert_eq!(branch.value(), Some(&[7u8, 8, 9][..]));

        let reference = Node::reference(Hash::from_data(b"x"));
        assert!(reference.is_reference());
        assert_eq!(reference.node_type(), "reference");
    }

    #[test]
    fn test_node_hash() {
        assert_eq!(Node::empty().hash().unwrap(), Hash::ZERO);

        let leaf_hash = Node::leaf(vec![4, 5, 6]).hash().unwrap();
        assert_ne!(leaf_hash, Hash::ZERO);
        assert_eq!(leaf_hash, Node::leaf(vec![4, 5, 6]).hash().unwrap());

        let extension_hash = Node::extension(vec![1, 2, 3], leaf(&[4, 5, 6])).hash().unwrap();
        assert_ne!(extension_hash, leaf_hash);

        let hash = Hash::from_data(b"committed");
        assert_eq!(Node::reference(hash).hash().unwrap(), hash);
    }

    #[test]
    fn test_reference_hashes_like_its_target() {
        let target = leaf(b"value");
        let target_hash = target.hash().unwrap();

        let inline = Node::extension(vec![1, 2], target);
        let referenced = Node::extension(vec![1, 2], Arc::new(Node::reference(target_hash)));
        assert_eq!(inline.hash().unwrap(), referenced.hash().unwrap());
    }

    #[test]
    fn test_seal_emits_children_first() {
        let mut children: Children = array_init(|_| None);
        children[2] = Some(leaf(b"a"));
        children[5] = Some(Arc::new(Node::extension(vec![1], leaf(b"b"))));
        let branch = Node::branch(children, None);

        let mut sealed = Vec::new();
        let root = branch.seal(&mut |hash, bytes| sealed.push((hash, bytes))).unwrap().unwrap();

        assert_eq!(sealed.len(), 4);
        assert_eq!(sealed.last().unwrap().0, root);
        for (hash, bytes) in &sealed {
            assert_eq!(*hash, Hash::from_data(bytes));
            decode_node(bytes).unwrap();
        }
    }

    #[test]
    fn test_seal_stops_at_references() {
        let reference = Arc::new(Node::reference(Hash::from_data(b"elsewhere")));
        let extension = Node::extension(vec![3], reference);

        let mut count = 0;
        extension.seal(&mut |_, _| count += 1).unwrap();
        assert_eq!(count, 1);
    }
}
