//! Reference trie roots via the `triehash` crate, used to validate the
//! streaming builders against an independently built trie.

use alloy_primitives::{keccak256, B256};
use hash_db::Hasher;
use plain_hasher::PlainHasher;

/// A [`Hasher`] that calculates a keccak256 hash of the given data.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub(crate) struct KeccakHasher;

impl Hasher for KeccakHasher {
    type Out = B256;
    type StdHasher = PlainHasher;

    const LENGTH: usize = 32;

    fn hash(x: &[u8]) -> Self::Out {
        keccak256(x)
    }
}

/// Root of a reference trie built from (key, value) pairs.
pub(crate) fn triehash_trie_root<I, A, B>(iter: I) -> B256
where
    I: IntoIterator<Item = (A, B)>,
    A: AsRef<[u8]> + Ord,
    B: AsRef<[u8]>,
{
    triehash::trie_root::<KeccakHasher, _, _, _>(iter)
}

/// Root of a reference trie keyed by RLP-encoded item indices.
pub(crate) fn triehash_ordered_trie_root<I>(iter: I) -> B256
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    triehash::ordered_trie_root::<KeccakHasher, I>(iter)
}
