use alloy_primitives::{hex, keccak256, B256};
use alloy_rlp::EMPTY_STRING_CODE;
use core::fmt;

#[allow(unused_imports)]
use alloc::vec::Vec;

const MAX: usize = 33;

/// A child reference: either the raw RLP of a node shorter than 32 bytes, or
/// the RLP encoding of its 32-byte Keccak-256 hash (`0xA0` followed by the
/// digest).
///
/// Stored inline as a length-prefixed 33-byte buffer so that finalised
/// children never touch the heap.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "SerdeBuf", into = "SerdeBuf"))]
pub struct RlpNode {
    len: u8,
    buf: [u8; MAX],
}

impl Default for RlpNode {
    #[inline]
    fn default() -> Self {
        Self { len: 0, buf: [0; MAX] }
    }
}

impl core::ops::Deref for RlpNode {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for RlpNode {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for RlpNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RlpNode({})", hex::encode_prefixed(self.as_slice()))
    }
}

impl RlpNode {
    /// Creates a new RLP-encoded node from the given data.
    ///
    /// Returns `None` if the data is longer than 33 bytes.
    #[inline]
    pub const fn from_raw(data: &[u8]) -> Option<Self> {
        if data.len() > MAX {
            return None;
        }
        let mut buf = [0; MAX];
        let mut i = 0;
        while i < data.len() {
            buf[i] = data[i];
            i += 1;
        }
        Some(Self { len: data.len() as u8, buf })
    }

    /// Given an RLP-encoded node, returns it either as `rlp(node)` or
    /// `rlp(keccak(rlp(node)))`.
    #[inline]
    pub fn from_rlp(rlp: &[u8]) -> Self {
        if rlp.len() < 32 {
            match Self::from_raw(rlp) {
                Some(node) => node,
                None => unreachable!(),
            }
        } else {
            Self::word_rlp(&keccak256(rlp))
        }
    }

    /// RLP-encodes the given word and returns it as a new RLP node.
    #[inline]
    pub const fn word_rlp(word: &B256) -> Self {
        let mut buf = [0; MAX];
        buf[0] = EMPTY_STRING_CODE + 32;
        let mut i = 0;
        while i < 32 {
            buf[i + 1] = word.0[i];
            i += 1;
        }
        Self { len: MAX as u8, buf }
    }

    /// Returns true if this is an RLP-encoded hash.
    #[inline]
    pub fn is_hash(&self) -> bool {
        self.len() == B256::len_bytes() + 1
    }

    /// Returns the RLP-encoded node as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    /// Returns the hash if this is an RLP-encoded hash.
    #[inline]
    pub fn as_hash(&self) -> Option<B256> {
        if self.is_hash() {
            Some(B256::from_slice(&self.as_slice()[1..]))
        } else {
            None
        }
    }
}

// Serde helper: serialize/deserialize as a byte vec.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct SerdeBuf(Vec<u8>);

#[cfg(feature = "serde")]
impl From<SerdeBuf> for RlpNode {
    fn from(buf: SerdeBuf) -> Self {
        Self::from_raw(&buf.0).expect("deserialized RlpNode too large")
    }
}

#[cfg(feature = "serde")]
impl From<RlpNode> for SerdeBuf {
    fn from(node: RlpNode) -> Self {
        Self(node.as_slice().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn word_rlp_is_hash() {
        let hash = b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");
        let node = RlpNode::word_rlp(&hash);
        assert_eq!(node.len(), 33);
        assert_eq!(node[0], 0xa0);
        assert!(node.is_hash());
        assert_eq!(node.as_hash(), Some(hash));
    }

    #[test]
    fn short_rlp_stays_inline() {
        let rlp = [0xc2, 0x20, 0x01];
        let node = RlpNode::from_rlp(&rlp);
        assert!(!node.is_hash());
        assert_eq!(node.as_slice(), &rlp);
    }

    #[test]
    fn long_rlp_is_hashed() {
        let rlp = [0xab; 32];
        let node = RlpNode::from_rlp(&rlp);
        assert!(node.is_hash());
        assert_eq!(node.as_hash(), Some(keccak256(rlp)));
    }

    #[test]
    fn from_raw_respects_capacity() {
        assert!(RlpNode::from_raw(&[0; 33]).is_some());
        assert!(RlpNode::from_raw(&[0; 34]).is_none());
    }
}
