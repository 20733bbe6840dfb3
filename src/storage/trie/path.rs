//! Nibble addressing for the trie.
//!
//! Every key is expanded into 4-bit nibbles, high nibble first, so keys that
//! share a byte prefix but diverge mid-byte still share structure.

use std::fmt;

/// Nibble is a 4-bit value (0-15)
pub type Nibble = u8;

/// Expand a byte slice into nibbles.
///
/// For example, the byte 0xAB becomes two nibbles: 0xA and 0xB.
pub fn bytes_to_nibbles(bytes: &[u8]) -> Vec<Nibble> {
    let mut nibbles = Vec::with_capacity(bytes.len() * 2);

    for &byte in bytes {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0F);
    }

    nibbles
}

/// Pack nibbles back into bytes.
///
/// A trailing odd nibble becomes the high half of a final byte. Keys coming
/// out of the trie always have an even number of nibbles.
pub fn nibbles_to_bytes(nibbles: &[Nibble]) -> Vec<u8> {
    nibbles
        .chunks(2)
        .map(|chunk| match chunk {
            [high, low] => (high << 4) | low,
            [high] => high << 4,
            _ => unreachable!("chunks(2) yields one or two nibbles"),
        })
        .collect()
}

/// Read-only cursor over a nibble path.
///
/// Advancing returns a new cursor; the underlying path is never copied or
/// modified.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NibbleCursor<'a> {
    nibbles: &'a [Nibble],
    pos: usize,
}

impl<'a> NibbleCursor<'a> {
    /// Cursor at the start of `nibbles`
    pub fn new(nibbles: &'a [Nibble]) -> Self {
        Self { nibbles, pos: 0 }
    }

    /// True when every nibble has been consumed
    pub fn is_end(&self) -> bool {
        self.pos == self.nibbles.len()
    }

    /// Number of nibbles left
    pub fn len(&self) -> usize {
        self.nibbles.len() - self.pos
    }

    /// Alias of [`NibbleCursor::is_end`]
    pub fn is_empty(&self) -> bool {
        self.is_end()
    }

    /// Nibble under the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is at the end.
    pub fn current(&self) -> Nibble {
        assert!(!self.is_end(), "current() called on an exhausted nibble cursor");
        self.nibbles[self.pos]
    }

    /// Cursor shifted `n` nibbles forward.
    ///
    /// # Panics
    ///
    /// Panics if `n` would move past the end.
    pub fn advance(&self, n: usize) -> Self {
        assert!(n <= self.len(), "cannot advance {} nibbles with {} left", n, self.len());
        Self { nibbles: self.nibbles, pos: self.pos + n }
    }

    /// Nibbles from the cursor to the end
    pub fn remaining(&self) -> &'a [Nibble] {
        &self.nibbles[self.pos..]
    }

    /// Nibbles consumed so far
    pub fn consumed(&self) -> &'a [Nibble] {
        &self.nibbles[..self.pos]
    }

    /// Length of the longest shared run between the remaining path and `other`
    pub fn common_prefix_length(&self, other: &[Nibble]) -> usize {
        common_prefix_length(self.remaining(), other)
    }

    /// Whether the remaining path begins with `fragment`
    pub fn starts_with(&self, fragment: &[Nibble]) -> bool {
        self.remaining().starts_with(fragment)
    }
}

impl fmt::Debug for NibbleCursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NibbleCursor({}|{})", format_nibbles(self.consumed()), format_nibbles(self.remaining()))
    }
}

/// Length of the longest common prefix of two nibble slices
pub fn common_prefix_length(a: &[Nibble], b: &[Nibble]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Format nibbles as a compact hex string, e.g. `61a`
pub fn format_nibbles(nibbles: &[Nibble]) -> String {
    nibbles.iter().map(|n| format!("{:x}", n)).collect()
}
