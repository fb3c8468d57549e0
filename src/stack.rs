//! The array-backed streaming root builder.

use crate::{
    error::StackTrieError,
    nodes::{BranchNodeRef, ExtensionNodeRef, LeafNodeRef, RlpNode},
    TrieMask, EMPTY_ROOT_HASH,
};
use alloc::{vec, vec::Vec};
use alloy_primitives::{keccak256, B256};
use nybbles::Nibbles;
use tracing::trace;

/// Maximum key length in bytes. The packed nibble representation holds 64
/// nibbles, which also matches the widest keys Ethereum tries ever see.
pub const MAX_KEY_BYTES: usize = 32;

/// One level of the live spine.
///
/// A frame is either a plain leaf (the deepest level, carrying the unconsumed
/// key suffix and the value) or an extension-wrapped branch. Branch slots
/// hold only finalised child references; the single live child of a frame is
/// the next frame on the stack, addressed by array adjacency.
#[derive(Debug, Clone)]
struct Frame {
    /// Absolute nibble depth at which this frame's path begins.
    depth: usize,
    /// Extension path, or the remaining key suffix for a leaf frame.
    ext: Nibbles,
    /// Leaf value. Unused for branch frames, but the buffer is kept so its
    /// allocation survives frame reuse.
    value: Vec<u8>,
    /// Finalised children of the branch.
    slots: [RlpNode; 16],
    /// Presence bits for `slots`.
    state_mask: TrieMask,
    /// Whether the extension wraps a branch or the frame is a plain leaf.
    has_branch: bool,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            depth: 0,
            ext: Nibbles::default(),
            value: Vec::new(),
            slots: [RlpNode::default(); 16],
            state_mask: TrieMask::default(),
            has_branch: false,
        }
    }
}

impl Frame {
    /// Reuses the frame as a fresh leaf.
    fn set_leaf(&mut self, depth: usize, path: Nibbles, value: &[u8]) {
        self.depth = depth;
        self.ext = path;
        self.value.clear();
        self.value.extend_from_slice(value);
        self.state_mask = TrieMask::default();
        self.has_branch = false;
    }

    /// Installs a finalised child reference into a branch slot.
    fn set_slot(&mut self, nibble: u8, node: RlpNode) {
        self.slots[nibble as usize] = node;
        self.state_mask.set_bit(nibble);
    }

    /// Serialises the part of the frame below path offset `from` into its
    /// child reference. All branch slots must already be finalised.
    fn fold_tail(&self, from: usize, rlp_buf: &mut Vec<u8>) -> RlpNode {
        rlp_buf.clear();
        let path = self.ext.slice(from..);
        if !self.has_branch {
            return LeafNodeRef::new(&path, &self.value).rlp(rlp_buf);
        }
        let branch = BranchNodeRef::new(&self.slots, self.state_mask).rlp(rlp_buf);
        if path.is_empty() {
            return branch;
        }
        rlp_buf.clear();
        ExtensionNodeRef::new(&path, &branch).rlp(rlp_buf)
    }

    /// Serialises the whole frame into its child reference.
    fn fold(&self, rlp_buf: &mut Vec<u8>) -> RlpNode {
        self.fold_tail(0, rlp_buf)
    }
}

/// Streaming root builder over a pre-allocated stack of frames.
///
/// Keys must arrive in strictly ascending byte order. On every insert the
/// frames the new key no longer touches are folded into 32-byte hashes (or
/// inline RLP) and handed to their parent's branch slot, so at most
/// `key nibbles + 1` frames are ever live and no node outlives its subtree.
///
/// [`Self::root`] folds the remaining spine, returns the digest and resets
/// the builder for reuse.
#[derive(Debug, Clone)]
pub struct StackTrie {
    /// Frame pool; `top` counts the live prefix.
    frames: Vec<Frame>,
    top: usize,
    /// The most recently inserted key.
    key: Nibbles,
    /// Scratch buffer shared by all node serialisation.
    rlp_buf: Vec<u8>,
}

impl Default for StackTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl StackTrie {
    /// Creates a builder sized for the maximum key length of 32 bytes.
    pub fn new() -> Self {
        Self::with_key_capacity(MAX_KEY_BYTES)
    }

    /// Creates a builder whose frame pool is sized for keys of at most
    /// `max_key_bytes` bytes (capped at [`MAX_KEY_BYTES`]). Index-keyed
    /// tries get by with a fraction of the default spine.
    pub fn with_key_capacity(max_key_bytes: usize) -> Self {
        let max = max_key_bytes.min(MAX_KEY_BYTES).max(1);
        Self {
            frames: vec![Frame::default(); 2 * max + 1],
            top: 0,
            key: Nibbles::default(),
            rlp_buf: Vec::with_capacity(128),
        }
    }

    /// Maximum key length in bytes this builder accepts.
    #[inline]
    pub fn max_key_bytes(&self) -> usize {
        (self.frames.len() - 1) / 2
    }

    /// Returns `true` if nothing has been inserted since creation or the
    /// last [`Self::root`] call.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    /// Inserts the next key/value pair.
    ///
    /// # Errors
    ///
    /// - [`StackTrieError::EmptyValue`] if `value` is empty; deletion is not
    ///   modelled.
    /// - [`StackTrieError::CapacityExceeded`] if `key` is longer than
    ///   [`Self::max_key_bytes`].
    /// - [`StackTrieError::KeyOutOfOrder`] if `key` is not strictly greater
    ///   than the previously inserted key.
    pub fn update(&mut self, key: &[u8], value: &[u8]) -> Result<(), StackTrieError> {
        if value.is_empty() {
            return Err(StackTrieError::EmptyValue);
        }
        if key.is_empty() || key.len() > self.max_key_bytes() {
            return Err(StackTrieError::CapacityExceeded {
                len: key.len(),
                max: self.max_key_bytes(),
            });
        }
        let path = Nibbles::unpack(key);
        // A key extending the previous one is rejected alongside unsorted
        // keys: no key may be a prefix of another.
        if self.top != 0
            && (path <= self.key || self.key.common_prefix_length(&path) == self.key.len())
        {
            return Err(StackTrieError::KeyOutOfOrder);
        }
        self.insert(path, value);
        Ok(())
    }

    /// Inserts the next key/value pair without validating it.
    ///
    /// This is only for performance-critical usage that guarantees non-empty
    /// values and keys of supported length arriving in sorted order; the
    /// checks of [`Self::update`] are downgraded to debug assertions.
    pub fn update_unchecked(&mut self, key: &[u8], value: &[u8]) {
        debug_assert!(!value.is_empty());
        debug_assert!(!key.is_empty() && key.len() <= self.max_key_bytes());
        let path = Nibbles::unpack(key);
        debug_assert!(self.top == 0 || path > self.key, "unsorted key {path:?}");
        self.insert(path, value);
    }

    /// Folds the remaining spine and returns the root hash, resetting the
    /// builder for reuse. With no inserts this is [`EMPTY_ROOT_HASH`].
    pub fn root(&mut self) -> B256 {
        if self.top == 0 {
            return EMPTY_ROOT_HASH;
        }
        while self.top > 1 {
            self.fold_top();
        }
        let node = self.frames[0].fold(&mut self.rlp_buf);
        self.top = 0;
        self.key.clear();
        let root = node.as_hash().unwrap_or_else(|| keccak256(&node));
        trace!(target: "stacktrie::stack", ?root, "folded spine to root");
        root
    }

    fn insert(&mut self, path: Nibbles, value: &[u8]) {
        trace!(target: "stacktrie::stack", key = ?path, value_len = value.len(), "inserting leaf");

        // First key: the whole trie is one leaf.
        if self.top == 0 {
            self.push_leaf(0, path, value);
            self.key = path;
            return;
        }

        let common = self.key.common_prefix_length(&path);
        debug_assert!(common < path.len() && common < self.key.len(), "prefix keys unsupported");

        // Everything deeper than the common prefix is finalised: fold it
        // into the parent branch slots.
        while self.frames[self.top - 1].depth > common {
            self.fold_top();
        }

        let level = self.top - 1;
        let frame = &self.frames[level];
        debug_assert!(common >= frame.depth);
        let split = common - frame.depth;

        if frame.has_branch && split == frame.ext.len() {
            // The spine already branches at the divergence nibble; the slot
            // for the new key is free because keys ascend.
            trace!(target: "stacktrie::stack", level, nibble = path.get_unchecked(common), "descending into branch");
        } else {
            // The divergence falls inside the frame's path: everything below
            // the shared prefix collapses into a single branch slot, and the
            // frame keeps the prefix as its (possibly empty) extension.
            debug_assert!(split < frame.ext.len());
            let old_nibble = frame.ext.get_unchecked(split);
            let old = frame.fold_tail(split + 1, &mut self.rlp_buf);
            trace!(target: "stacktrie::stack", level, split, ?old, "split frame path");

            let frame = &mut self.frames[level];
            frame.ext = frame.ext.slice(..split);
            frame.value.clear();
            frame.state_mask = TrieMask::default();
            frame.has_branch = true;
            frame.set_slot(old_nibble, old);
        }

        self.push_leaf(common + 1, path.slice(common + 1..), value);
        self.key = path;
    }

    /// Folds the top frame and installs its reference into the parent's
    /// branch slot.
    fn fold_top(&mut self) {
        debug_assert!(self.top > 1);
        let node = self.frames[self.top - 1].fold(&mut self.rlp_buf);
        let slot = self.key.get_unchecked(self.frames[self.top - 1].depth - 1);
        trace!(target: "stacktrie::stack", level = self.top - 1, slot, ?node, "folded frame");
        self.frames[self.top - 2].set_slot(slot, node);
        self.top -= 1;
    }

    fn push_leaf(&mut self, depth: usize, path: Nibbles, value: &[u8]) {
        self.frames[self.top].set_leaf(depth, path, value);
        self.top += 1;
    }
}
