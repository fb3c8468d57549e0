//! Trie root shortcuts over the streaming builders.

use crate::{StackTrie, StackTrieError, EMPTY_ROOT_HASH};
use alloc::vec::Vec;
use alloy_primitives::B256;
use alloy_rlp::Encodable;

/// Adjust the index of an item for rlp encoding.
///
/// Iterating indices in this order feeds the RLP-encoded keys of an
/// index-keyed trie (transactions, receipts, withdrawals) to the builder in
/// ascending byte order.
pub const fn adjust_index_for_rlp(i: usize, len: usize) -> usize {
    if i > 0x7f {
        i
    } else if i == 0x7f || i + 1 == len {
        0
    } else {
        i + 1
    }
}

/// Compute a trie root of the collection of rlp encodable items.
pub fn ordered_trie_root<T: Encodable>(items: &[T]) -> B256 {
    ordered_trie_root_with_encoder(items, |item, buf| item.encode(buf))
}

/// Compute a trie root of the collection of items with a custom encoder.
pub fn ordered_trie_root_with_encoder<T, F>(items: &[T], mut encode: F) -> B256
where
    F: FnMut(&T, &mut Vec<u8>),
{
    if items.is_empty() {
        return EMPTY_ROOT_HASH;
    }

    // Index keys are at most 9 bytes of RLP.
    let mut trie = StackTrie::with_key_capacity(9);
    let mut value_buffer = Vec::new();

    let items_len = items.len();
    for i in 0..items_len {
        let index = adjust_index_for_rlp(i, items_len);

        let index_buffer = alloy_rlp::encode_fixed_size(&index);

        value_buffer.clear();
        encode(&items[index], &mut value_buffer);

        trie.update_unchecked(&index_buffer, &value_buffer);
    }

    trie.root()
}

/// Compute a trie root from an iterator of (key, value) pairs already sorted
/// by ascending key.
pub fn sorted_trie_root<I, K, V>(iter: I) -> Result<B256, StackTrieError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let mut trie = StackTrie::new();
    for (key, value) in iter {
        trie.update(key.as_ref(), value.as_ref())?;
    }
    Ok(trie.root())
}
