//! Write path: insertion.
//!
//! Every split or upgrade is decided locally, so the returned tree is already
//! in canonical form and needs no separate reduction pass.

use std::sync::Arc;

use crate::storage::trie::error::TrieResult;
use crate::storage::trie::node::Node;
use crate::storage::trie::node_store::NodeStore;
use crate::storage::trie::path::NibbleCursor;

/// Return a new tree equal to `node` with `value` stored at `path`.
///
/// Untouched children are shared with `node`. References on the edit path
/// are expanded and the rebuilt nodes stay in memory until the next commit.
pub fn insert(store: &NodeStore, node: &Node, path: NibbleCursor<'_>, value: Vec<u8>) -> TrieResult<Node> {
    match node {
        Node::Empty => Ok(if path.is_end() {
            Node::leaf(value)
        } else {
            Node::extension(path.remaining().to_vec(), Arc::new(Node::leaf(value)))
        }),

        Node::Leaf { value: existing } => {
            if path.is_end() {
                return Ok(Node::leaf(value));
            }
            // The old key ends here, so its value moves into the branch slot
            let mut branch = Node::empty_branch();
            if let Node::Branch { children, value: branch_value } = &mut branch {
                *branch_value = Some(existing.clone());
                let child = insert(store, &Node::Empty, path.advance(1), value)?;
                children[path.current() as usize] = Some(Arc::new(child));
            }
            Ok(branch)
        },

        Node::Extension { key, child } => {
            let common = path.common_prefix_length(key);
            if common == key.len() {
                let new_child = insert(store, child, path.advance(common), value)?;
                return Ok(Node::extension(key.clone(), Arc::new(new_child)));
            }
            split_extension(store, key, child, path, common, value)
        },

        Node::Branch { children, value: branch_value } => {
            if path.is_end() {
                return Ok(Node::branch(children.clone(), Some(value)));
            }
            let index = path.current() as usize;
            let new_child = match &children[index] {
                Some(child) => insert(store, child, path.advance(1), value)?,
                None => insert(store, &Node::Empty, path.advance(1), value)?,
            };
            let mut children = children.clone();
            children[index] = Some(Arc::new(new_child));
            Ok(Node::branch(children, branch_value.clone()))
        },

        Node::Reference { hash } => {
            let expanded = store.expand(hash)?;
            insert(store, &expanded, path, value)
        },
    }
}

/// Split `Extension(key, child)` where the new path diverges after `common`
/// nibbles (`common < key.len()`).
fn split_extension(
    store: &NodeStore,
    key: &[u8],
    child: &Arc<Node>,
    path: NibbleCursor<'_>,
    common: usize,
    value: Vec<u8>,
) -> TrieResult<Node> {
    let mut branch = Node::empty_branch();
    if let Node::Branch { children, value: branch_value } = &mut branch {
        let tail = &key[common + 1..];
        let old = if tail.is_empty() {
            child.clone()
        } else {
            Arc::new(Node::extension(tail.to_vec(), child.clone()))
        };
        children[key[common] as usize] = Some(old);

        let rest = path.advance(common);
        if rest.is_end() {
            *branch_value = Some(value);
        } else {
            let new_child = insert(store, &Node::Empty, rest.advance(1), value)?;
            children[rest.current() as usize] = Some(Arc::new(new_child));
        }
    }

    Ok(if common > 0 {
        Node::extension(key[..common].to_vec(), Arc::new(branch))
    } else {
        branch
    })
}
