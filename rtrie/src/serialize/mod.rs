//! Persisted trie format.
//!
//! A self-describing preorder node stream wrapped in a Snappy frame, split
//! into sibling `read`/`write` submodules. Internal-node prefixes are never
//! written: a node's prefix is fully determined by its `level` and the
//! leftmost leaf under it, so storing it would just be redundant bytes to
//! validate on load. Leaf order is preorder (self, then left, then right),
//! which is also the order [`crate::trie`] already walks during
//! `clone_subtree` — [`read::load`] is effectively that walk run against a
//! byte stream instead of an arena already in memory.
//!
//! Non-goal: the on-disk format does not need to match any external schema.
//! Round-trip within this crate is the only contract.

mod read;
mod write;

pub(crate) use read::load;
pub(crate) use write::dump;

const MAGIC: [u8; 4] = *b"RTR1";
const VERSION: u8 = 1;
