#![doc = include_str!("../README.md")]
#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

extern crate alloc;

pub mod nodes;
pub use nodes::RlpNode;

mod error;
pub use error::StackTrieError;

mod mask;
pub use mask::TrieMask;

mod stack;
pub use stack::{StackTrie, MAX_KEY_BYTES};

mod linked;
pub use linked::LinkedStackTrie;

pub mod root;
pub use root::{ordered_trie_root, ordered_trie_root_with_encoder, sorted_trie_root};

#[cfg(test)]
mod triehash_compat;
#[cfg(test)]
pub(crate) use triehash_compat::triehash_trie_root;

pub use nybbles::Nibbles;

/// Root hash of an empty trie: the Keccak-256 of the RLP empty string.
pub const EMPTY_ROOT_HASH: alloy_primitives::B256 =
    alloy_primitives::b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");
