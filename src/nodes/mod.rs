//! Encoders for the three trie node shapes.
//!
//! The builders never materialise nodes: each encoder borrows the data held
//! in the engine's frames and serialises it straight into a reusable scratch
//! buffer, from which [`RlpNode::from_rlp`] derives the hashed-or-inline
//! child reference.

use core::ops::Range;

mod branch;
pub use branch::BranchNodeRef;

mod extension;
pub use extension::ExtensionNodeRef;

mod leaf;
pub use leaf::LeafNodeRef;

mod rlp;
pub use rlp::RlpNode;

/// The range of valid child indexes.
pub const CHILD_INDEX_RANGE: Range<u8> = 0..16;
