//! The pointer-linked streaming root builder.

use crate::{
    error::StackTrieError,
    nodes::{BranchNodeRef, ExtensionNodeRef, LeafNodeRef, RlpNode},
    TrieMask, EMPTY_ROOT_HASH,
};
use alloc::{boxed::Box, vec::Vec};
use alloy_primitives::{keccak256, B256};
use nybbles::Nibbles;
use tracing::trace;

use crate::stack::MAX_KEY_BYTES;

/// A node of the live subtrie, tagged by kind.
///
/// Only nodes on the current insertion path are ever live; everything to
/// their left has already collapsed into [`Node::Resolved`].
#[derive(Debug, Clone, Default)]
enum Node {
    /// The absent node.
    #[default]
    Empty,
    /// A terminal node carrying the remaining key suffix and the value.
    Leaf {
        path: Nibbles,
        value: Vec<u8>,
    },
    /// A shared-prefix node over a single child.
    Extension {
        path: Nibbles,
        child: Box<Node>,
    },
    /// A 16-way fan-out node.
    Branch {
        children: Box<[Option<Box<Node>>; 16]>,
    },
    /// A finalised subtree, reduced to its child reference.
    Resolved(RlpNode),
}

impl Node {
    /// Serialises the subtree into its child reference. Live descendants are
    /// encoded in place; resolved ones contribute their reference.
    fn fold(&self, rlp_buf: &mut Vec<u8>) -> RlpNode {
        match self {
            Self::Empty => unreachable!("cannot fold an empty node"),
            Self::Resolved(node) => *node,
            Self::Leaf { path, value } => {
                rlp_buf.clear();
                LeafNodeRef::new(path, value).rlp(rlp_buf)
            }
            Self::Extension { path, child } => {
                let child = child.fold(rlp_buf);
                rlp_buf.clear();
                ExtensionNodeRef::new(path, &child).rlp(rlp_buf)
            }
            Self::Branch { children } => {
                let mut slots = [RlpNode::default(); 16];
                let mut state_mask = TrieMask::default();
                for (index, child) in children.iter().enumerate() {
                    if let Some(child) = child {
                        slots[index] = child.fold(rlp_buf);
                        state_mask.set_bit(index as u8);
                    }
                }
                rlp_buf.clear();
                BranchNodeRef::new(&slots, state_mask).rlp(rlp_buf)
            }
        }
    }

    /// Inserts the suffix of `key` starting at nibble `at`.
    ///
    /// The next key is strictly greater than every key below this node, so
    /// any sibling left behind by the descent is finalised on the way.
    fn insert(&mut self, key: &Nibbles, at: usize, value: &[u8], rlp_buf: &mut Vec<u8>) {
        match self {
            Self::Empty => {
                *self = Self::Leaf { path: key.slice(at..), value: value.to_vec() };
            }
            Self::Leaf { path, value: old_value } => {
                let rest = key.slice(at..);
                let common = path.common_prefix_length(&rest);
                debug_assert!(common < path.len() && common < rest.len(), "duplicate or prefix key");

                // The old leaf sits left of the new one and is complete.
                rlp_buf.clear();
                let old_tail = path.slice(common + 1..);
                let old = LeafNodeRef::new(&old_tail, old_value).rlp(rlp_buf);

                let mut children: Box<[Option<Box<Node>>; 16]> = Box::new([const { None }; 16]);
                children[path.get_unchecked(common) as usize] =
                    Some(Box::new(Self::Resolved(old)));
                children[rest.get_unchecked(common) as usize] = Some(Box::new(Self::Leaf {
                    path: rest.slice(common + 1..),
                    value: value.to_vec(),
                }));
                let branch = Self::Branch { children };

                *self = if common == 0 {
                    branch
                } else {
                    Self::Extension { path: path.slice(..common), child: Box::new(branch) }
                };
            }
            Self::Extension { path, child } => {
                let rest = key.slice(at..);
                let common = path.common_prefix_length(&rest);
                if common == path.len() {
                    return child.insert(key, at + common, value, rlp_buf);
                }
                debug_assert!(common < rest.len(), "prefix key");

                // The extension splits; whatever hangs below the shared
                // prefix is complete and collapses into one branch slot.
                let folded = child.fold(rlp_buf);
                let old = if common + 1 == path.len() {
                    folded
                } else {
                    let old_tail = path.slice(common + 1..);
                    rlp_buf.clear();
                    ExtensionNodeRef::new(&old_tail, &folded).rlp(rlp_buf)
                };

                let mut children: Box<[Option<Box<Node>>; 16]> = Box::new([const { None }; 16]);
                children[path.get_unchecked(common) as usize] =
                    Some(Box::new(Self::Resolved(old)));
                children[rest.get_unchecked(common) as usize] = Some(Box::new(Self::Leaf {
                    path: rest.slice(common + 1..),
                    value: value.to_vec(),
                }));
                let branch = Self::Branch { children };

                *self = if common == 0 {
                    branch
                } else {
                    Self::Extension { path: path.slice(..common), child: Box::new(branch) }
                };
            }
            Self::Branch { children } => {
                let index = key.get_unchecked(at) as usize;

                // The previous insertion path went through a smaller slot;
                // that subtree is done, reduce it to its reference.
                for child in children[..index].iter_mut().rev().flatten() {
                    if !matches!(**child, Self::Resolved(_)) {
                        let node = child.fold(rlp_buf);
                        trace!(target: "stacktrie::linked", ?node, "resolved left sibling");
                        **child = Self::Resolved(node);
                    }
                    break;
                }

                match &mut children[index] {
                    Some(child) => child.insert(key, at + 1, value, rlp_buf),
                    slot => {
                        *slot = Some(Box::new(Self::Leaf {
                            path: key.slice(at + 1..),
                            value: value.to_vec(),
                        }));
                    }
                }
            }
            Self::Resolved(_) => unreachable!("insert into a finalised subtree"),
        }
    }
}

/// Streaming root builder over an explicit pointer-linked node tree.
///
/// The companion of [`crate::StackTrie`]: same contract, same digests, but
/// nodes live behind boxes instead of in a frame pool. Subtrees to the left
/// of the insertion path collapse into their references as soon as the path
/// moves past them, so memory stays proportional to the key depth.
#[derive(Debug, Clone, Default)]
pub struct LinkedStackTrie {
    root: Node,
    /// The most recently inserted key.
    key: Nibbles,
    /// Scratch buffer shared by all node serialisation.
    rlp_buf: Vec<u8>,
}

impl LinkedStackTrie {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing has been inserted since creation or the
    /// last [`Self::root`] call.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.root, Node::Empty)
    }

    /// Inserts the next key/value pair.
    ///
    /// # Errors
    ///
    /// Same contract as [`crate::StackTrie::update`].
    pub fn update(&mut self, key: &[u8], value: &[u8]) -> Result<(), StackTrieError> {
        if value.is_empty() {
            return Err(StackTrieError::EmptyValue);
        }
        if key.is_empty() || key.len() > MAX_KEY_BYTES {
            return Err(StackTrieError::CapacityExceeded { len: key.len(), max: MAX_KEY_BYTES });
        }
        let path = Nibbles::unpack(key);
        if !self.is_empty()
            && (path <= self.key || self.key.common_prefix_length(&path) == self.key.len())
        {
            return Err(StackTrieError::KeyOutOfOrder);
        }
        self.insert(path, value);
        Ok(())
    }

    /// Inserts the next key/value pair without validating it; see
    /// [`crate::StackTrie::update_unchecked`].
    pub fn update_unchecked(&mut self, key: &[u8], value: &[u8]) {
        debug_assert!(!value.is_empty());
        debug_assert!(!key.is_empty() && key.len() <= MAX_KEY_BYTES);
        let path = Nibbles::unpack(key);
        debug_assert!(self.is_empty() || path > self.key, "unsorted key {path:?}");
        self.insert(path, value);
    }

    /// Folds the tree and returns the root hash, resetting the builder for
    /// reuse. With no inserts this is [`EMPTY_ROOT_HASH`].
    pub fn root(&mut self) -> B256 {
        if self.is_empty() {
            return EMPTY_ROOT_HASH;
        }
        let node = self.root.fold(&mut self.rlp_buf);
        self.root = Node::Empty;
        self.key.clear();
        let root = node.as_hash().unwrap_or_else(|| keccak256(&node));
        trace!(target: "stacktrie::linked", ?root, "folded tree to root");
        root
    }

    fn insert(&mut self, path: Nibbles, value: &[u8]) {
        trace!(target: "stacktrie::linked", key = ?path, value_len = value.len(), "inserting leaf");
        self.root.insert(&path, 0, value, &mut self.rlp_buf);
        self.key = path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triehash_trie_root;
    use alloy_primitives::hex;

    #[test]
    fn empty() {
        assert_eq!(LinkedStackTrie::new().root(), EMPTY_ROOT_HASH);
    }

    #[test]
    fn single_leaf() {
        let key = hex!("0000000000000000000000000000000000000000000000000000000000000011");
        let value = hex!("76657262");
        let mut trie = LinkedStackTrie::new();
        trie.update(&key, &value).unwrap();
        assert_eq!(trie.root(), triehash_trie_root([(key, value)]));
    }

    #[test]
    fn branch_under_extension() {
        let data = [
            (hex!("1234567800000000"), hex!("0a")),
            (hex!("1234567900000000"), hex!("0b")),
            (hex!("12ff000000000000"), hex!("0c")),
        ];
        let mut trie = LinkedStackTrie::new();
        for (key, value) in &data {
            trie.update(key, value).unwrap();
        }
        assert_eq!(trie.root(), triehash_trie_root(data));
    }

    #[test]
    fn validation_mirrors_the_array_builder() {
        let mut trie = LinkedStackTrie::new();
        assert_eq!(trie.update(&[0x01], &[]), Err(StackTrieError::EmptyValue));
        assert_eq!(
            trie.update(&[0u8; 33], &[0x01]),
            Err(StackTrieError::CapacityExceeded { len: 33, max: 32 })
        );
        trie.update(&[0x01], &[0x01]).unwrap();
        assert_eq!(trie.update(&[0x01], &[0x02]), Err(StackTrieError::KeyOutOfOrder));
        assert_eq!(trie.update(&[0x01, 0x02], &[0x02]), Err(StackTrieError::KeyOutOfOrder));
    }

    #[test]
    fn builder_is_reusable_after_root() {
        let mut trie = LinkedStackTrie::new();
        trie.update(&[0x01], &[0x0a]).unwrap();
        let first = trie.root();

        assert!(trie.is_empty());
        trie.update(&[0x01], &[0x0a]).unwrap();
        assert_eq!(trie.root(), first);
    }
}
