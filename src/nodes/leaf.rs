use super::RlpNode;
use alloy_primitives::hex;
use alloy_rlp::{length_of_length, BufMut, Encodable, Header};
use core::fmt;
use nybbles::Nibbles;

#[allow(unused_imports)]
use alloc::vec::Vec;

/// A terminal node carrying the suffix of a key path and an opaque value.
///
/// Serialised as the 2-element list `[HP(path, leaf), value]`, where the
/// path is hex-prefix encoded with the leaf flag set.
#[derive(Clone, Copy)]
pub struct LeafNodeRef<'a> {
    /// The key path suffix for this leaf node.
    pub key: &'a Nibbles,
    /// The value of the leaf node.
    pub value: &'a [u8],
}

impl fmt::Debug for LeafNodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafNodeRef")
            .field("key", &self.key)
            .field("value", &hex::encode(self.value))
            .finish()
    }
}

impl Encodable for LeafNodeRef<'_> {
    fn encode(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.rlp_payload_length() }.encode(out);
        self.key.encode_path_leaf(true).as_slice().encode(out);
        self.value.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.rlp_payload_length();
        payload_length + length_of_length(payload_length)
    }
}

impl<'a> LeafNodeRef<'a> {
    /// Creates a new leaf node with the given key path and value.
    pub const fn new(key: &'a Nibbles, value: &'a [u8]) -> Self {
        Self { key, value }
    }

    /// RLP encodes the node into `buf` and returns its child reference.
    pub fn rlp(&self, buf: &mut Vec<u8>) -> RlpNode {
        self.encode(buf);
        RlpNode::from_rlp(buf)
    }

    /// Returns the length of the RLP encoded fields of the leaf node.
    fn rlp_payload_length(&self) -> usize {
        let mut encoded_key_len = self.key.len() / 2 + 1;
        // For leaf nodes the first byte cannot be greater than 0x80.
        if encoded_key_len != 1 {
            encoded_key_len += length_of_length(encoded_key_len);
        }
        encoded_key_len + Encodable::length(&self.value)
    }
}
