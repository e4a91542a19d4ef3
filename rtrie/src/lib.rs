//! # `rtrie`
//!
//! `rtrie` is a library for representing arbitrary subsets of `[0, 2^64)` as
//! unions of intervals and performing boolean set algebra (union,
//! intersection, symmetric difference, difference, complement, common
//! intervals, enclosure) over them via a big-endian Patricia trie.
//!
//! The trie ([`trie::Tree`]) and its merge family are the core; [`Interval`],
//! [`IntervalSet`], and [`IntervalMap`] are all thin views over one.

mod arena;
mod bits;
pub mod error;
pub mod format;
mod interval;
mod interval_map;
mod interval_set;
mod iter;
mod node;
mod serialize;
mod trie;

pub use error::{Error, Result};
pub use interval::Interval;
pub use interval_map::{IntervalMap, MutateOutcome};
pub use interval_set::IntervalSet;
pub use iter::{Bound, IntervalIter, Span};
