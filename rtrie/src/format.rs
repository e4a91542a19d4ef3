//! Interval literal parsing and canonical formatting.
//!
//! A small hand-written scanner, not a parser-combinator dependency — the
//! grammar is tiny enough that `pest`/`nom` would be more machinery than the
//! job needs.

use std::fmt;
use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::interval::Interval;
use crate::iter::{Bound, IntervalIter, Span};
use crate::trie::Tree;

/// Parses an interval literal of the shape `[10, 20)`, `(-inf, 5]`,
/// `(-∞, ∞)`, or the canonical point form `[x]`.
/// Whitespace around the comma is permitted; `-inf`/`-∞`/`-Inf` and
/// `inf`/`∞`/`Inf` are accepted spellings of the unbounded ends.
pub fn parse_interval(s: &str) -> Result<Interval> {
    let invalid = || Error::InvalidInterval(s.to_string());
    let trimmed = s.trim();

    if trimmed == "(Ø)" {
        return Ok(Interval::empty());
    }

    let mut chars = trimmed.chars();
    let left_closed = match chars.next() {
        Some('[') => true,
        Some('(') => false,
        _ => return Err(invalid()),
    };
    let rest = &trimmed[1..];
    let (body, right_closed) = match rest.chars().last() {
        Some(']') => (&rest[..rest.len() - 1], true),
        Some(')') => (&rest[..rest.len() - 1], false),
        _ => return Err(invalid()),
    };

    match body.split_once(',') {
        None => {
            // No comma: only the canonical point form `[x]` is valid here.
            if !left_closed || !right_closed {
                return Err(invalid());
            }
            let v: u64 = body.trim().parse().map_err(|_| invalid())?;
            Ok(Interval::point(v))
        }
        Some((lo_str, hi_str)) => {
            let lo = parse_endpoint(lo_str.trim(), true).ok_or_else(invalid)?;
            let hi = parse_endpoint(hi_str.trim(), false).ok_or_else(invalid)?;
            Ok(match (lo, hi) {
                (None, None) => Interval::unbounded(),
                (None, Some(hi)) if right_closed => Interval::at_or_below(hi),
                (None, Some(hi)) => Interval::below(hi),
                (Some(lo), None) if left_closed => Interval::at_or_above(lo),
                (Some(lo), None) => Interval::above(lo),
                (Some(lo), Some(hi)) => match (left_closed, right_closed) {
                    (true, true) => Interval::closed(lo, hi),
                    (true, false) => Interval::right_open(lo, hi),
                    (false, true) => Interval::left_open(lo, hi),
                    (false, false) => Interval::open(lo, hi),
                },
            })
        }
    }
}

/// `None` means "this token didn't parse at all" (invalid input); `Some(None)`
/// means "this end is the unbounded end" (`-inf`/`inf` and spellings).
fn parse_endpoint(tok: &str, is_lower: bool) -> Option<Option<u64>> {
    let is_unbounded = if is_lower {
        matches!(tok, "-inf" | "-Inf" | "-INF" | "-∞")
    } else {
        matches!(tok, "inf" | "Inf" | "INF" | "∞")
    };
    if is_unbounded {
        return Some(None);
    }
    tok.parse::<u64>().ok().map(Some)
}

impl std::str::FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_interval(s)
    }
}

/// Writes `tree`'s maximal intervals in ascending order, comma-space
/// separated, using the canonical bracket forms. Shared by
/// [`Interval`]'s and [`crate::interval_set::IntervalSet`]'s `Display` impls:
/// both are just a trie with a different expected number of spans.
pub(crate) fn write_tree(f: &mut fmt::Formatter<'_>, tree: &Tree) -> fmt::Result {
    let mut spans = IntervalIter::new(tree).peekable();
    if spans.peek().is_none() {
        return f.write_str("(Ø)");
    }
    let mut first = true;
    for span in spans {
        if !first {
            f.write_str(", ")?;
        }
        first = false;
        write_span(f, span)?;
    }
    Ok(())
}

fn write_span(f: &mut fmt::Formatter<'_>, span: Span) -> fmt::Result {
    if span.lower == Bound::Unbounded && span.upper == Bound::Unbounded {
        return f.write_str("(-∞, ∞)");
    }
    if let (Bound::Included(a), Bound::Included(b)) = (span.lower, span.upper) {
        if a == b {
            return write!(f, "[{a}]");
        }
    }
    let (left_bracket, lower) = match span.lower {
        Bound::Unbounded => ('(', None),
        Bound::Included(x) => ('[', Some(x)),
        Bound::Excluded(x) => ('(', Some(x)),
    };
    let (right_bracket, upper) = match span.upper {
        Bound::Unbounded => (')', None),
        Bound::Included(x) => (']', Some(x)),
        Bound::Excluded(x) => (')', Some(x)),
    };
    f.write_char(left_bracket)?;
    match lower {
        Some(x) => write!(f, "{x}")?,
        None => f.write_str("-∞")?,
    }
    f.write_str(", ")?;
    match upper {
        Some(x) => write!(f, "{x}")?,
        None => f.write_str("∞")?,
    }
    f.write_char(right_bracket)
}

#[cfg(test)]
mod test {
    use super::*;

    fn roundtrip(s: &str) -> String {
        parse_interval(s).unwrap().to_string()
    }

    #[test]
    fn parses_closed_interval() {
        assert_eq!(roundtrip("[10, 20]"), "[10, 20]");
    }

    #[test]
    fn parses_half_open_interval() {
        assert_eq!(roundtrip("[10, 20)"), "[10, 20)");
    }

    #[test]
    fn parses_left_unbounded() {
        assert_eq!(roundtrip("(-inf, 5]"), "(-∞, 5]");
        assert_eq!(roundtrip("(-∞, 5]"), "(-∞, 5]");
    }

    #[test]
    fn parses_right_unbounded() {
        assert_eq!(roundtrip("[5, inf)"), "[5, ∞)");
    }

    #[test]
    fn parses_fully_unbounded() {
        assert_eq!(roundtrip("(-inf, inf)"), "(-∞, ∞)");
    }

    #[test]
    fn parses_point_literal() {
        assert_eq!(roundtrip("[5]"), "[5]");
    }

    #[test]
    fn parses_whitespace_around_comma() {
        assert_eq!(roundtrip("[ 1 ,  2 ]"), "[1, 2]");
    }

    #[test]
    fn formats_empty() {
        assert_eq!(Interval::empty().to_string(), "(Ø)");
    }

    #[test]
    fn rejects_malformed_literal() {
        assert!(parse_interval("[10, 20").is_err());
        assert!(parse_interval("10, 20]").is_err());
        assert!(parse_interval("[abc, 20]").is_err());
        assert!(parse_interval("[5, 3").is_err());
    }

    #[test]
    fn open_interval_normalizes_to_half_open_on_output() {
        // `(0, 10)` excludes both ends, i.e. members `1..=9`; the trie only
        // ever stores bound-below/bound-above transitions, so the canonical
        // output form re-derives as the half-open span that covers the same
        // members: `[1, 10)`.
        assert_eq!(roundtrip("(0, 10)"), "[1, 10)");
    }
}
