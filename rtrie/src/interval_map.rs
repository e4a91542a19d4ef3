//! A mapping from opaque keys to [`IntervalSet`]s, with the same boolean
//! algebra lifted pairwise over shared keys.
//!
//! A dense array-plus-free-list of set slots (the discipline
//! [`crate::arena::Arena`] uses for nodes) would buy stable integer handles
//! into a long-lived slice and slot reuse without reallocating. Neither
//! benefit applies here: every `IntervalSet` already owns its own per-trie
//! arena, so there is no second pool whose reuse needs managing, and a plain
//! `HashMap<K, IntervalSet>` already handles its own slot reuse internally.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::Result;
use crate::interval::Interval;
use crate::interval_set::{pick_by_rank, IntervalSet};

/// What [`IntervalMap::mutate_values`] should do with one key's set after
/// the caller's closure has seen it.
pub enum MutateOutcome<K> {
    /// Keep the (possibly modified) set under its original key.
    Keep(IntervalSet),
    /// Drop the key entirely, discarding its set.
    Drop,
    /// Union the set into a different (possibly pre-existing) key.
    Rekey(K, IntervalSet),
}

/// `K -> IntervalSet`, keys with an empty set are never retained.
#[derive(Clone, Debug, Default)]
pub struct IntervalMap<K: Eq + Hash + Clone> {
    sets: HashMap<K, IntervalSet>,
}

impl<K: Eq + Hash + Clone> IntervalMap<K> {
    pub fn new() -> Self {
        IntervalMap { sets: HashMap::new() }
    }

    pub fn with_capacity(n: usize) -> Self {
        IntervalMap { sets: HashMap::with_capacity(n) }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&IntervalSet> {
        self.sets.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.sets.keys()
    }

    fn get_or_empty(&self, key: &K) -> IntervalSet {
        self.sets.get(key).cloned().unwrap_or_default()
    }

    /// Removes `key` if its set collapsed to empty; a key maps to an empty
    /// set for exactly as long as it takes to notice.
    fn prune(&mut self, key: &K) {
        if self.sets.get(key).is_some_and(IntervalSet::is_empty) {
            self.sets.remove(key);
        }
    }

    /// Unions `ivals` into `key`'s set in place, creating the entry if
    /// absent.
    pub fn add(&mut self, key: K, ivals: &[Interval]) {
        let entry = self.sets.entry(key.clone()).or_default();
        for ival in ivals {
            entry.add(ival);
        }
        self.prune(&key);
    }

    /// Unions `set` into `key`'s set in place, creating the entry if absent.
    pub fn add_set(&mut self, key: K, set: &IntervalSet) {
        let entry = self.sets.entry(key.clone()).or_default();
        entry.union_assign(set);
        self.prune(&key);
    }

    fn zip_with(&self, other: &Self, f: impl Fn(&IntervalSet, &IntervalSet) -> IntervalSet) -> Self {
        let mut out = HashMap::with_capacity(self.sets.len().max(other.sets.len()));
        for key in self.sets.keys().chain(other.sets.keys()) {
            if out.contains_key(key) {
                continue;
            }
            let combined = f(&self.get_or_empty(key), &other.get_or_empty(key));
            if !combined.is_empty() {
                out.insert(key.clone(), combined);
            }
        }
        IntervalMap { sets: out }
    }

    pub fn union(&self, other: &Self) -> Self {
        self.zip_with(other, IntervalSet::union)
    }

    pub fn union_assign(&mut self, other: &Self) {
        *self = self.union(other);
    }

    /// Only keys present in both operands can contribute: a key absent from
    /// one side intersects against the implicit empty set.
    pub fn intersection(&self, other: &Self) -> Self {
        let mut out = HashMap::new();
        for (key, set) in &self.sets {
            if let Some(other_set) = other.sets.get(key) {
                let combined = set.intersection(other_set);
                if !combined.is_empty() {
                    out.insert(key.clone(), combined);
                }
            }
        }
        IntervalMap { sets: out }
    }

    pub fn intersection_assign(&mut self, other: &Self) {
        *self = self.intersection(other);
    }

    pub fn symmetric_difference(&self, other: &Self) -> Self {
        self.zip_with(other, IntervalSet::symmetric_difference)
    }

    pub fn symmetric_difference_assign(&mut self, other: &Self) {
        *self = self.symmetric_difference(other);
    }

    /// Per key in `self`: subtract `other`'s set for that key, if any (a key
    /// only in `other` contributes nothing, matching `x - ∅ = x`).
    pub fn difference(&self, other: &Self) -> Self {
        let mut out = HashMap::with_capacity(self.sets.len());
        for (key, set) in &self.sets {
            let combined = match other.sets.get(key) {
                Some(other_set) => set.difference(other_set),
                None => set.clone(),
            };
            if !combined.is_empty() {
                out.insert(key.clone(), combined);
            }
        }
        IntervalMap { sets: out }
    }

    pub fn difference_assign(&mut self, other: &Self) {
        *self = self.difference(other);
    }

    /// Per shared key, `self`'s intervals that lie entirely within one of
    /// `other`'s intervals for that key. A key present in only one operand
    /// contributes nothing.
    pub fn enclosed(&self, other: &Self) -> Result<Self> {
        let mut out = HashMap::new();
        for (key, set) in &self.sets {
            if let Some(other_set) = other.sets.get(key) {
                let combined = set.enclosed(other_set)?;
                if !combined.is_empty() {
                    out.insert(key.clone(), combined);
                }
            }
        }
        Ok(IntervalMap { sets: out })
    }

    /// Applies `f` to every `(key, set)` pair, replacing, dropping, or
    /// rekeying each according to its [`MutateOutcome`]. Rekeying unions into
    /// any set already produced for the destination key this pass (including
    /// one from an earlier rekey), so two rekeys landing on the same new key
    /// merge rather than clobbering each other.
    pub fn mutate_values(&mut self, mut f: impl FnMut(&K, IntervalSet) -> MutateOutcome<K>) {
        let mut next: HashMap<K, IntervalSet> = HashMap::with_capacity(self.sets.len());
        for (key, set) in self.sets.drain() {
            match f(&key, set) {
                MutateOutcome::Drop => {}
                MutateOutcome::Keep(set) => {
                    if !set.is_empty() {
                        next.entry(key).or_default().union_assign(&set);
                    }
                }
                MutateOutcome::Rekey(new_key, set) => {
                    if !set.is_empty() {
                        next.entry(new_key).or_default().union_assign(&set);
                    }
                }
            }
        }
        self.sets = next;
    }

    /// Intersects every set with `mask` in place, dropping keys whose set
    /// becomes empty.
    pub fn mask(&mut self, mask: &IntervalSet) {
        self.sets.retain(|_, set| {
            set.intersection_assign(mask);
            !set.is_empty()
        });
    }

    /// Removes the portion of every set that overlaps `mask`, returning the
    /// removed portions as a fresh map keyed the same way.
    pub fn pop_mask(&mut self, mask: &IntervalSet) -> Self {
        let mut popped = HashMap::new();
        self.sets.retain(|key, set| {
            let removed = set.intersection(mask);
            if !removed.is_empty() {
                popped.insert(key.clone(), removed);
            }
            set.difference_assign(mask);
            !set.is_empty()
        });
        IntervalMap { sets: popped }
    }

    pub fn all_intervals(&self) -> IntervalSet {
        let mut out = IntervalSet::new();
        for set in self.sets.values() {
            out.union_assign(set);
        }
        out
    }

    pub fn cardinality(&self) -> u64 {
        self.sets.values().map(IntervalSet::cardinality).sum()
    }

    pub fn equals(&self, other: &Self) -> bool {
        self.sets.len() == other.sets.len()
            && self.sets.iter().all(|(k, v)| other.sets.get(k).is_some_and(|ov| v.equals(ov)))
    }

    /// With probability `alpha`, samples a member uniformly over the total
    /// cardinality of every set and returns the key it belongs to paired
    /// with that key's maximal interval containing it; otherwise `None`.
    pub fn rand_value<R: rand::Rng>(&self, rng: &mut R, alpha: f64) -> Option<(K, Interval)> {
        if !rng.gen_bool(alpha) {
            return None;
        }
        let total: u128 = self.sets.values().map(IntervalSet::total_len).sum();
        if total == 0 {
            return None;
        }
        let mut rank = rng.gen_range(0..total);
        for (key, set) in &self.sets {
            let len = set.total_len();
            if rank < len {
                // Two-stage sampling: `rank` only picked the key, weighted by
                // its total length; which span within that key's set is a
                // second, independent uniform draw, delegated to
                // `pick_by_rank`.
                return pick_by_rank(set.iter(), rng).map(|ival| (key.clone(), ival));
            }
            rank -= len;
        }
        unreachable!("rank stayed within total's sum by construction")
    }

    /// Destructive [`Self::rand_value`]: also removes the sampled interval
    /// from its key's set (dropping the key if it becomes empty).
    pub fn pop_rand_value<R: rand::Rng>(&mut self, rng: &mut R, alpha: f64) -> Option<(K, Interval)> {
        let (key, ival) = self.rand_value(rng, alpha)?;
        if let Some(set) = self.sets.get_mut(&key) {
            set.difference_assign(&IntervalSet::from_interval(&ival));
        }
        self.prune(&key);
        Some((key, ival))
    }
}
