use super::{RlpNode, CHILD_INDEX_RANGE};
use crate::TrieMask;
use alloy_rlp::{length_of_length, BufMut, Encodable, Header, EMPTY_STRING_CODE};
use core::fmt;

#[allow(unused_imports)]
use alloc::vec::Vec;

/// A 16-way fan-out node over a fixed slot array.
///
/// Serialised as a 17-element list: one child reference per nibble (an empty
/// slot is the empty string `0x80`) followed by the value slot. Keys are
/// fixed-width, so no key ever terminates at a branch and the value slot is
/// always empty.
#[derive(Clone, Copy)]
pub struct BranchNodeRef<'a> {
    /// Child references, one per nibble. Only slots whose bit is set in
    /// `state_mask` are read.
    pub slots: &'a [RlpNode; 16],
    /// Presence bits for `slots`.
    pub state_mask: TrieMask,
}

impl fmt::Debug for BranchNodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchNodeRef")
            .field("slots", &self.children().collect::<Vec<_>>())
            .field("state_mask", &self.state_mask)
            .finish()
    }
}

impl Encodable for BranchNodeRef<'_> {
    fn encode(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.rlp_payload_length() }.encode(out);
        for index in CHILD_INDEX_RANGE {
            if self.state_mask.is_bit_set(index) {
                out.put_slice(&self.slots[index as usize]);
            } else {
                out.put_u8(EMPTY_STRING_CODE);
            }
        }
        // The unused value slot.
        out.put_u8(EMPTY_STRING_CODE);
    }

    fn length(&self) -> usize {
        let payload_length = self.rlp_payload_length();
        payload_length + length_of_length(payload_length)
    }
}

impl<'a> BranchNodeRef<'a> {
    /// Creates a new branch node over the given slots and presence mask.
    pub const fn new(slots: &'a [RlpNode; 16], state_mask: TrieMask) -> Self {
        Self { slots, state_mask }
    }

    /// RLP encodes the node into `buf` and returns its child reference.
    pub fn rlp(&self, buf: &mut Vec<u8>) -> RlpNode {
        self.encode(buf);
        RlpNode::from_rlp(buf)
    }

    /// Returns an iterator over the present child references.
    pub fn children(&self) -> impl Iterator<Item = &'a RlpNode> + '_ {
        CHILD_INDEX_RANGE
            .filter(move |index| self.state_mask.is_bit_set(*index))
            .map(move |index| &self.slots[index as usize])
    }

    /// Returns the length of the RLP encoded fields of the branch node.
    fn rlp_payload_length(&self) -> usize {
        let mut payload_length = 1;
        for index in CHILD_INDEX_RANGE {
            if self.state_mask.is_bit_set(index) {
                payload_length += self.slots[index as usize].len();
            } else {
                payload_length += 1;
            }
        }
        payload_length
    }
}
