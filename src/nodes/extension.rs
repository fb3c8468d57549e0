use super::RlpNode;
use alloy_primitives::hex;
use alloy_rlp::{length_of_length, BufMut, Encodable, Header};
use core::fmt;
use nybbles::Nibbles;

#[allow(unused_imports)]
use alloc::vec::Vec;

/// A shared-prefix node carrying a non-empty nibble path and one child
/// reference.
///
/// Serialised as the 2-element list `[HP(path, ext), childref]`; the child
/// reference is already RLP and is appended verbatim.
#[derive(Clone, Copy)]
pub struct ExtensionNodeRef<'a> {
    /// The path for this extension node.
    pub key: &'a Nibbles,
    /// A reference to the child node.
    pub child: &'a [u8],
}

impl fmt::Debug for ExtensionNodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionNodeRef")
            .field("key", &self.key)
            .field("child", &hex::encode(self.child))
            .finish()
    }
}

impl Encodable for ExtensionNodeRef<'_> {
    fn encode(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.rlp_payload_length() }.encode(out);
        self.key.encode_path_leaf(false).as_slice().encode(out);
        // The child reference is already RLP encoded.
        out.put_slice(self.child);
    }

    fn length(&self) -> usize {
        let payload_length = self.rlp_payload_length();
        payload_length + length_of_length(payload_length)
    }
}

impl<'a> ExtensionNodeRef<'a> {
    /// Creates a new extension node with the given path and child reference.
    pub const fn new(key: &'a Nibbles, child: &'a [u8]) -> Self {
        Self { key, child }
    }

    /// RLP encodes the node into `buf` and returns its child reference.
    pub fn rlp(&self, buf: &mut Vec<u8>) -> RlpNode {
        self.encode(buf);
        RlpNode::from_rlp(buf)
    }

    /// Returns the length of the RLP encoded fields of the extension node.
    fn rlp_payload_length(&self) -> usize {
        let mut encoded_key_len = self.key.len() / 2 + 1;
        // For extension nodes the first byte cannot be greater than 0x80.
        if encoded_key_len != 1 {
            encoded_key_len += length_of_length(encoded_key_len);
        }
        encoded_key_len + self.child.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rlp_extension_node() {
        let key = Nibbles::from_nibbles(hex!("0604060f"));
        let child = hex!("76657262");
        let extension = ExtensionNodeRef::new(&key, &child);
        let mut buf = vec![];
        let rlp = extension.rlp(&mut buf);
        assert_eq!(buf, hex!("c88300646f76657262"));
        assert_eq!(rlp.as_slice(), buf.as_slice());
        assert_eq!(Encodable::length(&extension), buf.len());
    }

    #[test]
    fn rlp_extension_node_single_nibble() {
        // Odd paths pack the first nibble into the hex-prefix byte, which
        // stays below 0x80 and encodes as itself.
        let key = Nibbles::from_nibbles([0x0]);
        let child = RlpNode::word_rlp(&alloy_primitives::B256::ZERO);
        let mut buf = vec![];
        let _ = ExtensionNodeRef::new(&key, &child).rlp(&mut buf);
        assert_eq!(buf[0], 0xc0 + 34);
        assert_eq!(buf[1], 0x10);
        assert_eq!(buf[2], 0xa0);
    }
}
