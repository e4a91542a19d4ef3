//! Crate error type.
//!
//! One flat enum with hand-written `Display`/`std::error::Error` impls — no
//! `thiserror`. Internal invariant violations (parent-pointer mismatches,
//! free-list corruption, clone self-reference) are `panic!`/`debug_assert!`,
//! not `Result` variants: they indicate a bug in this crate, not a caller
//! error.

pub type Result<T> = core::result::Result<T, Error>;

/// Errors surfaced to callers.
#[derive(Debug)]
pub enum Error {
    /// The parser could not interpret an interval literal.
    InvalidInterval(String),

    /// `common`/`enclosed` was called with a left-unbounded operand.
    ///
    /// A deliberate gap, not an oversight: a left-unbounded set has no
    /// leftmost leaf to anchor the maximal-interval comparison against.
    LeftUnboundedCommon,

    /// A persisted trie stream did not decode to a well-formed trie.
    CorruptSerialization(String),

    /// I/O failure while reading or writing a persisted trie.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidInterval(s) => write!(f, "invalid interval literal: {s:?}"),
            Error::LeftUnboundedCommon => {
                f.write_str("common/enclosed is not defined for a left-unbounded operand")
            }
            Error::CorruptSerialization(msg) => write!(f, "corrupt trie stream: {msg}"),
            Error::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}
