use thiserror::Error;

/// Error type for streaming trie updates.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackTrieError {
    /// Insertion with a zero-length value. Deletion is not modelled, so an
    /// empty value has no trie representation.
    #[error("empty values are not supported")]
    EmptyValue,

    /// The key is not strictly greater than the previously inserted key in
    /// byte-lexicographic order. Re-inserting an existing key is rejected
    /// through the same check (the previous leaf is already folded into a
    /// hash and cannot be amended), as is a key that extends the previous
    /// key: no key may be a prefix of another.
    #[error("key is not strictly greater than the previous key")]
    KeyOutOfOrder,

    /// The key length is unsupported: empty keys have no trie path, and
    /// longer keys would need a deeper spine than this builder
    /// pre-allocated.
    #[error("key of {len} bytes exceeds the supported maximum of {max}")]
    CapacityExceeded {
        /// Length of the rejected key in bytes.
        len: usize,
        /// Maximum key length this builder accepts.
        max: usize,
    },
}
