//! A set of disjoint, non-adjacent intervals.
//!
//! Backed by the same [`Tree`] as a single [`crate::interval::Interval`] —
//! the only difference is how many leaves it happens to carry. `COMMON`/
//! `ENCLOSED` are the one piece of the algebra that does *not* go through
//! `Tree::combine`: a collision-time "is this leaf's neighbor the same on
//! both sides" check would need to walk `previous_leaf`/`next_leaf` via
//! parent pointers mid-merge, and that walk is unsound here, because
//! `merge`'s cross-level case frees an ancestor node (`arena.free(a)`)
//! before recursing into its children — by the time a deep collision needed
//! to walk back up through that ancestor, the pointer would already be
//! stale. So `common` and `enclosed` are built instead on top of the
//! read-only [`IntervalIter`] output of both operands: a two-pointer
//! merge-join comparing maximal intervals for exact equality, never
//! interleaved with a mutating merge.

use crate::error::{Error, Result};
use crate::interval::Interval;
use crate::iter::{Bound, IntervalIter, Span};
use crate::trie::{Op, Tree};

/// A disjoint, non-adjacent collection of intervals over `[0, 2^64)`.
#[derive(Clone, Debug)]
pub struct IntervalSet {
    pub(crate) tree: Tree,
}

impl Default for IntervalSet {
    fn default() -> Self {
        IntervalSet { tree: Tree::default() }
    }
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_tree(tree: Tree) -> Self {
        IntervalSet { tree }
    }

    pub fn from_interval(ival: &Interval) -> Self {
        IntervalSet { tree: ival.as_tree().clone() }
    }

    pub fn unbounded() -> Self {
        IntervalSet::from_interval(&Interval::unbounded())
    }

    pub fn add(&mut self, ival: &Interval) {
        self.tree.combine_assign(ival.as_tree(), Op::Or, false);
    }

    pub fn union(&self, other: &IntervalSet) -> IntervalSet {
        IntervalSet::from_tree(Tree::combine(&self.tree, &other.tree, Op::Or, false))
    }

    pub fn union_assign(&mut self, other: &IntervalSet) {
        self.tree.combine_assign(&other.tree, Op::Or, false);
    }

    pub fn intersection(&self, other: &IntervalSet) -> IntervalSet {
        IntervalSet::from_tree(Tree::combine(&self.tree, &other.tree, Op::And, false))
    }

    pub fn intersection_assign(&mut self, other: &IntervalSet) {
        self.tree.combine_assign(&other.tree, Op::And, false);
    }

    pub fn symmetric_difference(&self, other: &IntervalSet) -> IntervalSet {
        IntervalSet::from_tree(Tree::combine(&self.tree, &other.tree, Op::Xor, false))
    }

    pub fn symmetric_difference_assign(&mut self, other: &IntervalSet) {
        self.tree.combine_assign(&other.tree, Op::Xor, false);
    }

    /// `self - other`, implemented as `self AND complement(other)` by
    /// flipping `other`'s carry rather than materializing a complement.
    pub fn difference(&self, other: &IntervalSet) -> IntervalSet {
        IntervalSet::from_tree(Tree::combine(&self.tree, &other.tree, Op::And, true))
    }

    pub fn difference_assign(&mut self, other: &IntervalSet) {
        self.tree.combine_assign(&other.tree, Op::And, true);
    }

    pub fn complement(&self) -> IntervalSet {
        IntervalSet::from_tree(self.tree.complement())
    }

    pub fn complement_assign(&mut self) {
        self.tree.complement_assign();
    }

    pub fn equals(&self, other: &IntervalSet) -> bool {
        self.tree.structurally_equal(&other.tree)
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn is_unbounded(&self) -> bool {
        self.tree.is_unbounded()
    }

    pub fn cardinality(&self) -> u64 {
        self.tree.cardinality()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn iter(&self) -> IntervalIter<'_> {
        IntervalIter::new(&self.tree)
    }

    pub fn first_interval(&self) -> Option<Interval> {
        self.iter().next().map(span_to_interval)
    }

    /// The smallest interval covering every member, or `None` if empty.
    pub fn extent(&self) -> Option<Interval> {
        let mut it = self.iter();
        let first = it.next()?;
        let last = it.last().unwrap_or(first);
        Some(span_to_interval(Span { lower: first.lower, upper: last.upper }))
    }

    /// The maximal interval containing `x`, or `None` if `x` is not a
    /// member. `self`'s spans are disjoint and ascending, so the first span
    /// whose upper bound reaches `x` is the only candidate.
    pub fn interval_containing(&self, x: u64) -> Option<Interval> {
        for span in self.iter() {
            if span_contains(&span, x) {
                return Some(span_to_interval(span));
            }
            if upper_rank(span.upper) > x as u128 {
                break;
            }
        }
        None
    }

    /// Intervals common to both sets: maximal intervals that appear,
    /// byte-for-byte identical, in both operands' sorted span sequences.
    /// Not defined for a left-unbounded operand: there is no leftmost edge
    /// to anchor the comparison against.
    pub fn common_intervals(&self, other: &IntervalSet) -> Result<IntervalSet> {
        reject_left_unbounded(&self.tree)?;
        reject_left_unbounded(&other.tree)?;

        let mut a = self.iter().peekable();
        let mut b = other.iter().peekable();
        let mut result = IntervalSet::new();
        loop {
            match (a.peek().copied(), b.peek().copied()) {
                (Some(sa), Some(sb)) => {
                    if sa == sb {
                        result.add(&span_to_interval(sa));
                        a.next();
                        b.next();
                    } else if upper_rank(sa.upper) <= upper_rank(sb.upper) {
                        a.next();
                    } else {
                        b.next();
                    }
                }
                _ => break,
            }
        }
        Ok(result)
    }

    /// The subset of `self`'s intervals that are themselves members of
    /// `other` in full — i.e. `common(self ∩ other, other)`.
    pub fn enclosed(&self, other: &IntervalSet) -> Result<IntervalSet> {
        let overlap = self.intersection(other);
        overlap.common_intervals(other)
    }

    /// Total number of members, counting `Unbounded` ends against the actual
    /// domain edge (`0` or `2^64`) rather than true infinity — `[0, 2^64)`
    /// is finite. Distinct from [`Self::cardinality`], which counts maximal
    /// intervals rather than members, and wider than its `u64` since a
    /// handful of near-full-domain sets can exceed `u64::MAX` members.
    pub fn total_len(&self) -> u128 {
        self.iter().map(crate::iter::span_len).sum()
    }

    /// Samples a member uniformly over [`Self::total_len`] and returns the
    /// maximal interval containing it, with probability `alpha`; otherwise
    /// `None`. This crate never seeds or owns an RNG, so the caller supplies
    /// one.
    ///
    /// Implemented as a single linear pass over [`Self::iter`] rather than a
    /// weighted descent through arena node `count`s: `common`/`enclosed`
    /// already made the same trade (post-hoc iteration over a mutating
    /// mid-merge walk) for the same reason — it keeps the arena-mutating
    /// merge core free of a second traversal discipline to get right.
    pub fn rand_value<R: rand::Rng>(&self, rng: &mut R, alpha: f64) -> Option<Interval> {
        if !rng.gen_bool(alpha) {
            return None;
        }
        pick_by_rank(self.iter(), rng)
    }
}

/// Picks one span from `spans` with probability proportional to its length,
/// using `rng.gen_range` over the cumulative length, and returns it as an
/// `Interval`. Shared between [`IntervalSet::rand_value`] and
/// [`crate::interval_map::IntervalMap::rand_value`], which both need to
/// sample a single member's enclosing interval out of a weighted pool of
/// spans (a set's own spans, or a map's per-key sets concatenated).
pub(crate) fn pick_by_rank(spans: impl Iterator<Item = Span> + Clone, rng: &mut impl rand::Rng) -> Option<Interval> {
    let total: u128 = spans.clone().map(crate::iter::span_len).sum();
    if total == 0 {
        return None;
    }
    let mut rank = rng.gen_range(0..total);
    for span in spans {
        let len = crate::iter::span_len(span);
        if rank < len {
            return Some(span_to_interval(span));
        }
        rank -= len;
    }
    unreachable!("rank stayed within total_len's sum by construction");
}

impl IntervalSet {
    /// Writes the backing trie with [`crate::serialize`]'s persisted format.
    pub fn dump<W: std::io::Write>(&self, w: W) -> Result<()> {
        crate::serialize::dump(&self.tree, w)
    }

    /// Reads back a trie written by [`Self::dump`].
    pub fn load<R: std::io::Read>(r: R) -> Result<IntervalSet> {
        Ok(IntervalSet::from_tree(crate::serialize::load(r)?))
    }
}

impl std::fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::format::write_tree(f, &self.tree)
    }
}

fn reject_left_unbounded(tree: &Tree) -> Result<()> {
    if let Some(first) = IntervalIter::new(tree).next() {
        if first.lower == Bound::Unbounded {
            return Err(Error::LeftUnboundedCommon);
        }
    }
    Ok(())
}

/// Orders a [`Span`]'s upper bound by the first integer it *excludes*:
/// `Unbounded` is `None` (infinity, sorts last); `Excluded(x)` is `x`;
/// `Included(x)` is `x + 1` (promoted to `u128` so `u64::MAX + 1` doesn't
/// overflow and still sorts below `Unbounded`).
fn upper_rank(b: Bound) -> u128 {
    match b {
        Bound::Unbounded => u128::MAX,
        Bound::Excluded(x) => x as u128,
        Bound::Included(x) => x as u128 + 1,
    }
}

fn span_contains(span: &Span, x: u64) -> bool {
    let lower_ok = match span.lower {
        Bound::Unbounded => true,
        Bound::Included(l) => x >= l,
        Bound::Excluded(l) => x > l,
    };
    let upper_ok = match span.upper {
        Bound::Unbounded => true,
        Bound::Included(u) => x <= u,
        Bound::Excluded(u) => x < u,
    };
    lower_ok && upper_ok
}

fn span_to_interval(span: Span) -> Interval {
    let lower_adj = match span.lower {
        Bound::Unbounded => None,
        Bound::Included(x) => Some(x),
        Bound::Excluded(x) => x.checked_add(1),
    };
    let upper_adj = match span.upper {
        Bound::Unbounded => None,
        Bound::Excluded(x) => Some(x),
        Bound::Included(x) => x.checked_add(1),
    };
    let lo = Interval::lower_half(lower_adj);
    let hi = Interval::upper_half(upper_adj);
    Interval::from_tree(Tree::combine(&lo, &hi, Op::And, false))
}

#[cfg(test)]
mod test {
    use super::*;

    fn set(intervals: &[Interval]) -> IntervalSet {
        let mut s = IntervalSet::new();
        for i in intervals {
            s.add(i);
        }
        s
    }

    #[test]
    fn union_of_disjoint_intervals() {
        let a = set(&[Interval::closed(0, 10)]);
        let b = set(&[Interval::closed(20, 30)]);
        let u = a.union(&b);
        assert_eq!(u.total_len(), 22);
        assert_eq!(u.cardinality(), 2);
    }

    #[test]
    fn intersection_of_overlapping_sets() {
        let a = set(&[Interval::closed(0, 10), Interval::closed(20, 30)]);
        let b = set(&[Interval::closed(5, 25)]);
        let i = a.intersection(&b);
        let spans: Vec<_> = i.iter().collect();
        assert_eq!(
            spans,
            vec![
                Span { lower: Bound::Included(5), upper: Bound::Excluded(11) },
                Span { lower: Bound::Included(20), upper: Bound::Excluded(26) },
            ]
        );
    }

    #[test]
    fn difference_removes_overlap() {
        let a = set(&[Interval::closed(0, 10)]);
        let b = set(&[Interval::closed(5, 7)]);
        let d = a.difference(&b);
        let spans: Vec<_> = d.iter().collect();
        assert_eq!(
            spans,
            vec![
                Span { lower: Bound::Included(0), upper: Bound::Excluded(5) },
                Span { lower: Bound::Excluded(7), upper: Bound::Excluded(11) },
            ]
        );
    }

    #[test]
    fn symmetric_difference_matches_union_minus_intersection() {
        let a = set(&[Interval::closed(0, 10)]);
        let b = set(&[Interval::closed(5, 15)]);
        let x = a.symmetric_difference(&b);
        let via_laws = a.union(&b).difference(&a.intersection(&b));
        assert!(x.equals(&via_laws));
    }

    #[test]
    fn complement_of_empty_is_unbounded() {
        let empty = IntervalSet::new();
        assert!(empty.complement().is_unbounded());
    }

    #[test]
    fn complement_is_involutive() {
        let a = set(&[Interval::closed(3, 9), Interval::at_or_above(100)]);
        assert!(a.complement().complement().equals(&a));
    }

    #[test]
    fn common_intervals_finds_shared_maximal_spans() {
        let shared = Interval::closed(5, 10);
        let a = set(&[Interval::closed(0, 4), shared.clone()]);
        let b = set(&[shared.clone(), Interval::closed(20, 30)]);
        let common = a.common_intervals(&b).unwrap();
        let spans: Vec<_> = common.iter().collect();
        assert_eq!(spans, vec![Span { lower: Bound::Included(5), upper: Bound::Excluded(11) }]);
    }

    #[test]
    fn common_intervals_rejects_left_unbounded_operand() {
        let a = set(&[Interval::below(10)]);
        let b = set(&[Interval::closed(0, 5)]);
        assert!(matches!(a.common_intervals(&b), Err(Error::LeftUnboundedCommon)));
    }

    #[test]
    fn enclosed_returns_fully_contained_intervals() {
        let a = set(&[Interval::closed(0, 10), Interval::closed(20, 25)]);
        let b = set(&[Interval::closed(20, 25), Interval::closed(100, 200)]);
        let enclosed = a.enclosed(&b).unwrap();
        let spans: Vec<_> = enclosed.iter().collect();
        assert_eq!(spans, vec![Span { lower: Bound::Included(20), upper: Bound::Excluded(26) }]);
    }

    #[test]
    fn interval_containing_finds_the_maximal_span() {
        let a = set(&[Interval::closed(0, 10), Interval::closed(20, 30)]);
        let found = a.interval_containing(25).unwrap();
        assert_eq!(found.span(), Some((Bound::Included(20), Bound::Excluded(31))));
        assert!(a.interval_containing(15).is_none());
    }

    #[test]
    fn extent_spans_first_to_last() {
        let a = set(&[Interval::closed(5, 10), Interval::closed(100, 200)]);
        let e = a.extent().unwrap();
        assert_eq!(e.span(), Some((Bound::Included(5), Bound::Excluded(201))));
    }

    #[test]
    fn idempotent_union_and_intersection() {
        let a = set(&[Interval::closed(0, 10), Interval::at_or_above(50)]);
        assert!(a.union(&a).equals(&a));
        assert!(a.intersection(&a).equals(&a));
    }

    #[test]
    fn de_morgan_holds() {
        let a = set(&[Interval::closed(0, 10)]);
        let b = set(&[Interval::closed(5, 15)]);
        let lhs = a.union(&b).complement();
        let rhs = a.complement().intersection(&b.complement());
        assert!(lhs.equals(&rhs));
    }

    // End-to-end scenarios over literal interval sets.

    #[test]
    fn scenario_one_set_algebra_over_two_two_interval_sets() {
        let a = set(&[Interval::right_open(0, 2), Interval::right_open(4, 6)]);
        let b = set(&[Interval::right_open(1, 3), Interval::right_open(3, 5)]);

        assert!(a.intersection(&b).equals(&set(&[Interval::right_open(1, 2), Interval::right_open(4, 5)])));
        assert!(a.union(&b).equals(&set(&[Interval::right_open(0, 6)])));
        assert!(a.difference(&b).equals(&set(&[Interval::right_open(0, 1), Interval::right_open(5, 6)])));
        assert!(a.symmetric_difference(&b).equals(&set(&[
            Interval::right_open(0, 1),
            Interval::right_open(2, 4),
            Interval::right_open(5, 6),
        ])));
    }

    #[test]
    fn scenario_two_complement_of_two_disjoint_intervals() {
        let a = set(&[Interval::right_open(0, 2), Interval::right_open(4, 6)]);
        let expected = set(&[Interval::below(0), Interval::right_open(2, 4), Interval::at_or_above(6)]);
        assert!(a.complement().equals(&expected));
    }

    #[test]
    fn scenario_three_interval_containing_membership_table() {
        // {(-∞,2), (2,4], [5,10], (15,17), (17,∞)}, 1-indexed; 0 = no match.
        let intervals = [
            Interval::below(2),
            Interval::left_open(2, 4),
            Interval::closed(5, 10),
            Interval::open(15, 17),
            Interval::above(17),
        ];
        let s = set(&intervals);
        let expected = [1, 1, 0, 2, 2, 3, 3, 3, 3, 3, 3, 0, 0, 0, 0, 0, 4, 0, 5, 5, 5];
        for (x, &want) in expected.iter().enumerate() {
            let got = s.interval_containing(x as u64);
            match want {
                0 => assert!(got.is_none(), "x={x}: expected no containing interval"),
                i => assert!(
                    got.unwrap().equals(&intervals[i - 1]),
                    "x={x}: expected interval #{i}"
                ),
            }
        }

        // Intersecting with [1, 19] clips the first and last intervals and
        // drops membership at the domain edges (0 and 20).
        let clipped = s.intersection(&set(&[Interval::closed(1, 19)]));
        assert!(clipped.interval_containing(0).is_none());
        assert!(clipped.interval_containing(20).is_none());
        assert!(clipped.interval_containing(1).unwrap().equals(&Interval::right_open(1, 2)));
        assert!(clipped.interval_containing(18).unwrap().equals(&Interval::left_open(17, 19)));
    }

    #[test]
    fn scenario_four_common_matches_literal_example() {
        let a = set(&[
            Interval::open(1, 2),
            Interval::open(7, 9),
            Interval::right_open(10, 13),
            Interval::point(14),
            Interval::closed(15, 20),
            Interval::left_open(22, 27),
            Interval::above(30),
        ]);
        let b = set(&[
            Interval::open(1, 2),
            Interval::open(7, 9),
            Interval::right_open(10, 12),
            Interval::point(14),
            Interval::closed(15, 20),
            Interval::left_open(23, 27),
            Interval::above(30),
        ]);
        let expected = set(&[
            Interval::open(7, 9),
            Interval::point(14),
            Interval::closed(15, 20),
            Interval::above(30),
        ]);
        assert!(a.common_intervals(&b).unwrap().equals(&expected));
    }

    #[test]
    fn scenario_five_enclosed_matches_literal_example() {
        let a = set(&[
            Interval::right_open(1, 10),
            Interval::right_open(20, 30),
            Interval::right_open(40, 50),
        ]);
        let b = set(&[
            Interval::right_open(4, 5),
            Interval::right_open(19, 25),
            Interval::right_open(42, 49),
        ]);
        let expected = set(&[Interval::right_open(4, 5), Interval::right_open(42, 49)]);
        assert!(a.enclosed(&b).unwrap().equals(&expected));
    }

    #[test]
    fn stress_symmetric_difference_of_shifted_half_lines_unions_to_full_domain() {
        // `a` is the symmetric difference of `[i*2, ∞)` for i in 0..N, `b`
        // the same starting at `i*2+1`. `a ∪ b` should be the full domain,
        // and `a` should have exactly N maximal intervals.
        const N: u64 = 200;
        let mut a = IntervalSet::new();
        for i in 0..N {
            a.symmetric_difference_assign(&set(&[Interval::at_or_above(i * 2)]));
        }
        let mut b = IntervalSet::new();
        for i in 0..N {
            b.symmetric_difference_assign(&set(&[Interval::at_or_above(i * 2 + 1)]));
        }
        assert!(a.union(&b).is_unbounded());
        assert_eq!(a.iter().count() as u64, N / 2);
    }

    #[test]
    fn law_sweep_over_randomly_generated_interval_sets() {
        use rand::SeedableRng;

        fn random_set(rng: &mut impl rand::Rng, n: usize) -> IntervalSet {
            let mut s = IntervalSet::new();
            for _ in 0..n {
                let lo = rng.gen_range(0..200u64);
                let hi = lo + rng.gen_range(0..20u64);
                s.add(&Interval::closed(lo, hi));
            }
            s
        }

        let mut rng = rand::rngs::SmallRng::seed_from_u64(42);
        for _ in 0..30 {
            let x = random_set(&mut rng, 5);
            let y = random_set(&mut rng, 5);
            let z = random_set(&mut rng, 5);

            // Idempotence.
            assert!(x.union(&x).equals(&x));
            assert!(x.intersection(&x).equals(&x));

            // Commutativity.
            assert!(x.union(&y).equals(&y.union(&x)));
            assert!(x.intersection(&y).equals(&y.intersection(&x)));
            assert!(x.symmetric_difference(&y).equals(&y.symmetric_difference(&x)));

            // Associativity.
            assert!(x.union(&y).union(&z).equals(&x.union(&y.union(&z))));
            assert!(x.intersection(&y).intersection(&z).equals(&x.intersection(&y.intersection(&z))));
            assert!(x
                .symmetric_difference(&y)
                .symmetric_difference(&z)
                .equals(&x.symmetric_difference(&y.symmetric_difference(&z))));

            // De Morgan.
            assert!(x.union(&y).complement().equals(&x.complement().intersection(&y.complement())));

            // x - y = x ∩ complement(y).
            assert!(x.difference(&y).equals(&x.intersection(&y.complement())));

            // x △ y = (x ∪ y) - (x ∩ y).
            assert!(x.symmetric_difference(&y).equals(&x.union(&y).difference(&x.intersection(&y))));

            // Aliasing: z.op(x, y) agrees whether z aliases x, y, both, or
            // neither.
            let direct = x.union(&y);
            let mut alias_x = x.clone();
            alias_x.union_assign(&y);
            let mut alias_y = y.clone();
            alias_y.union_assign(&x);
            let mut alias_both = x.clone();
            alias_both.union_assign(&alias_both.clone());
            assert!(direct.equals(&alias_x));
            assert!(direct.equals(&alias_y));
            assert!(alias_both.equals(&x));
        }
    }
}
