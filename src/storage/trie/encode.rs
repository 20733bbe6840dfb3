//! Wire form of committed trie nodes.
//!
//! A stored node never embeds another node: every child is referenced by the
//! hash of its own encoding, which is what lets two trie versions share a
//! subtree physically. Extension fragments use hex-prefix ("compact") encoding
//! so an odd number of nibbles still packs into whole bytes.

use std::sync::Arc;

use array_init::array_init;
use serde::{Serialize, Deserialize};

use crate::crypto::Hash;
use crate::storage::trie::error::{TrieError, TrieResult};
use crate::storage::trie::node::Node;
use crate::storage::trie::path::Nibble;

/// Flag set in the first compact byte when the fragment has odd length
const ODD_FLAG: u8 = 0x10;

/// Serialized payload of a single node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoredNode {
    /// Terminal value
    Leaf {
        value: Vec<u8>,
    },

    /// Shared prefix over a single child
    Extension {
        /// Compact-encoded nibble fragment
        key: Vec<u8>,
        child: Hash,
    },

    /// 16-way fan-out with an optional terminal value
    Branch {
        children: [Option<Hash>; 16],
        value: Option<Vec<u8>>,
    },
}

impl StoredNode {
    /// Serialize to bytes
    pub fn encode(&self) -> TrieResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| TrieError::Encode(e.to_string()))
    }

    /// Deserialize from bytes
    pub fn decode(bytes: &[u8]) -> TrieResult<Self> {
        bincode::deserialize(bytes).map_err(|e| TrieError::Decode(e.to_string()))
    }

    /// Rebuild the in-memory node, leaving every child as an unexpanded
    /// reference.
    pub fn into_node(self) -> TrieResult<Node> {
        match self {
            StoredNode::Leaf { value } => Ok(Node::leaf(value)),
            StoredNode::Extension { key, child } => {
                let fragment = compact_decode(&key)?;
                if fragment.is_empty() {
                    return Err(TrieError::Decode("extension with empty fragment".to_string()));
                }
                Ok(Node::extension(fragment, Arc::new(Node::reference(child))))
            },
            StoredNode::Branch { children, value } => {
                let populated = children.iter().flatten().count() + usize::from(value.is_some());
                if populated < 2 {
                    return Err(TrieError::Decode(format!("branch with {} entries", populated)));
                }
                let children = array_init(|i| children[i].map(|hash| Arc::new(Node::reference(hash))));
                Ok(Node::branch(children, value))
            },
        }
    }
}

/// Decode stored bytes straight into a node
pub fn decode_node(bytes: &[u8]) -> TrieResult<Node> {
    StoredNode::decode(bytes)?.into_node()
}

/// Hex-prefix encoding of a nibble fragment.
///
/// The high nibble of the first byte carries the odd-length flag. For odd
/// fragments the low nibble of that byte holds the first nibble; for even
/// fragments it is zero.
///
/// - `[0, 1, 2, 3, 4, 5]` becomes `[0x00, 0x01, 0x23, 0x45]`
/// - `[1, 2, 3, 4, 5]` becomes `[0x11, 0x23, 0x45]`
pub fn compact_encode(nibbles: &[Nibble]) -> Vec<u8> {
    let mut compact = Vec::with_capacity(nibbles.len() / 2 + 1);

    let rest = if nibbles.len() % 2 == 1 {
        compact.push(ODD_FLAG | nibbles[0]);
        &nibbles[1..]
    } else {
        compact.push(0);
        nibbles
    };

    for pair in rest.chunks(2) {
        compact.push((pair[0] << 4) | pair[1]);
    }

    compact
}

/// Decode a compact encoding back to nibbles
pub fn compact_decode(compact: &[u8]) -> TrieResult<Vec<Nibble>> {
    let (&first, rest) = compact
        .split_first()
        .ok_or_else(|| TrieError::Decode("empty compact fragment".to_string()))?;

    let mut nibbles = Vec::with_capacity(compact.len() * 2);
    match first & 0xF0 {
        ODD_FLAG => nibbles.push(first & 0x0F),
        0 if first & 0x0F == 0 => {},
        _ => return Err(TrieError::Decode(format!("invalid compact prefix byte {:#04x}", first))),
    }

    for &byte in rest {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0F);
    }

    Ok(nibbles)
}
