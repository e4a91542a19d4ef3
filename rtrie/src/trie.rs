//! The recursive merge core: arena-level AND/OR/XOR over Patricia-trie
//! interval encodings, plus the traversal family used to answer
//! containment/extent queries.
//!
//! Built around the `merge`/`collision`/`join`/`overlap` quartet. A merge
//! conceptually combines two (possibly aliased) tries into a result that may
//! itself alias either operand; that aliasing is resolved up front rather
//! than node-by-node during the recursion, because a Rust signature that let
//! the result alias a live operand would need `&mut self` and `&self`
//! borrowed at once, which the borrow checker refuses at the call site.
//! Instead: `self` always plays the role of one operand in place
//! ([`Tree::combine_assign`]), and the other operand, guaranteed distinct by
//! the borrow checker, is deep-cloned into `self`'s arena before the merge
//! starts. The recursion below only ever touches one `&mut Arena`.
//!
//! `COMMON`/`ENCLOSED` are deliberately not part of this recursion — see
//! `interval_set.rs`.

use crate::arena::Arena;
use crate::bits::{branching_bit, is_prefix_at, mask_above, zero_at};
use crate::node::{Node, NodeId, NULL};

/// The three boolean set operations the recursive core understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Op {
    And,
    Or,
    Xor,
}

/// An interval set's backing trie: an arena plus a root id plus the
/// tree-level carry bit — set membership at `-∞`. Membership at `+∞` is a
/// derived quantity, `ul` XOR the XOR of every leaf's own `ul` bit (see
/// [`Tree::right_edge`]).
#[derive(Clone, Debug)]
pub(crate) struct Tree {
    pub(crate) arena: Arena,
    pub(crate) root: NodeId,
    pub(crate) ul: bool,
}

impl Default for Tree {
    fn default() -> Self {
        Tree {
            arena: Arena::default(),
            root: NULL,
            ul: false,
        }
    }
}

impl Tree {
    pub(crate) fn is_empty(&self) -> bool {
        self.root == NULL && !self.ul
    }

    pub(crate) fn is_unbounded(&self) -> bool {
        self.root == NULL && self.ul
    }

    /// Number of maximal intervals, not members. A leaf pair brackets one
    /// interval, so `count / 2` is the base count; a tree that's already
    /// "inside" at both edges (empty root with the carry set, or an odd
    /// leaf count trailing off past the last bound-above) needs the `+1`
    /// spec.md §4.5 calls out.
    pub(crate) fn cardinality(&self) -> u64 {
        if self.root == NULL {
            return if self.ul { 1 } else { 0 };
        }
        let n = self.arena.get(self.root).count as u64;
        let mut i = n / 2;
        if self.ul || i == 0 {
            i += 1;
        }
        i
    }

    pub(crate) fn clear(&mut self) {
        self.arena.clear();
        self.root = NULL;
        self.ul = false;
    }

    /// `self = self op other`, in place. `other` is read-only and left
    /// untouched; only its subtree is cloned in, since it can't be
    /// destructively merged away without violating its borrow.
    ///
    /// `flip_b_ul` implements DIFFERENCE as AND with `other`'s carry flipped,
    /// without a fourth `Op` variant.
    pub(crate) fn combine_assign(&mut self, other: &Tree, op: Op, flip_b_ul: bool) {
        let root_b = self.arena.clone_subtree(&other.arena, other.root);
        let bul = if flip_b_ul { !other.ul } else { other.ul };
        let (root, ul) = merge_root(&mut self.arena, self.root, root_b, self.ul, bul, op);
        self.root = root;
        self.ul = ul;
    }

    /// `x op y`, producing a new tree and leaving both operands untouched.
    pub(crate) fn combine(x: &Tree, y: &Tree, op: Op, flip_b_ul: bool) -> Tree {
        let mut result = x.clone();
        result.combine_assign(y, op, flip_b_ul);
        result
    }

    /// Complement is a pure tree-level carry flip; no node is ever touched.
    pub(crate) fn complement_assign(&mut self) {
        self.ul = !self.ul;
    }

    pub(crate) fn complement(&self) -> Tree {
        let mut t = self.clone();
        t.complement_assign();
        t
    }

    pub(crate) fn structurally_equal(&self, other: &Tree) -> bool {
        self.ul == other.ul && subtree_equal(&self.arena, self.root, &other.arena, other.root)
    }

    /// Walks to the leftmost leaf, returning `None` for an empty tree.
    pub(crate) fn leftmost_leaf(&self) -> Option<NodeId> {
        if self.root == NULL {
            return None;
        }
        let mut n = self.root;
        while !self.arena.get(n).is_leaf() {
            n = self.arena.get(n).left;
        }
        Some(n)
    }

    pub(crate) fn rightmost_leaf(&self) -> Option<NodeId> {
        if self.root == NULL {
            return None;
        }
        let mut n = self.root;
        while !self.arena.get(n).is_leaf() {
            n = self.arena.get(n).right;
        }
        Some(n)
    }

    /// The leaf immediately to the right of `n` in key order, or `None` if
    /// `n` is the rightmost leaf. Walks up via `parent` until `n`'s ancestor
    /// is a left child, then descends the sibling's leftmost spine.
    pub(crate) fn next_leaf(&self, n: NodeId) -> Option<NodeId> {
        let mut child = n;
        let mut parent = self.arena.get(n).parent;
        while parent != NULL && self.arena.get(parent).right == child {
            child = parent;
            parent = self.arena.get(parent).parent;
        }
        if parent == NULL {
            return None;
        }
        let mut cur = self.arena.get(parent).right;
        while !self.arena.get(cur).is_leaf() {
            cur = self.arena.get(cur).left;
        }
        Some(cur)
    }

    /// The leaf immediately to the left of `n` in key order, symmetric to
    /// [`Tree::next_leaf`].
    pub(crate) fn previous_leaf(&self, n: NodeId) -> Option<NodeId> {
        let mut child = n;
        let mut parent = self.arena.get(n).parent;
        while parent != NULL && self.arena.get(parent).left == child {
            child = parent;
            parent = self.arena.get(parent).parent;
        }
        if parent == NULL {
            return None;
        }
        let mut cur = self.arena.get(parent).left;
        while !self.arena.get(cur).is_leaf() {
            cur = self.arena.get(cur).right;
        }
        Some(cur)
    }

    /// The carry entering the tree from the left: always `false` (nothing
    /// lies below the leftmost leaf by construction).
    pub(crate) fn left_edge(&self) -> bool {
        false
    }

    /// The carry leaving the tree on the right.
    pub(crate) fn right_edge(&self) -> bool {
        self.ul
    }

    #[cfg(debug_assertions)]
    pub(crate) fn check_invariants(&self) {
        fn walk(arena: &Arena, id: NodeId, parent: NodeId) -> u32 {
            if id == NULL {
                return 0;
            }
            let n = arena.get(id);
            assert_eq!(n.parent, parent, "parent pointer mismatch at node {id}");
            if n.is_leaf() {
                assert_eq!(n.count, 1);
                return 1;
            }
            let lc = walk(arena, n.left, id);
            let rc = walk(arena, n.right, id);
            assert_eq!(n.count, lc + rc, "count mismatch at node {id}");
            assert_eq!(n.ul, arena.get(n.left).ul != arena.get(n.right).ul);
            lc + rc
        }
        if self.root != NULL {
            walk(&self.arena, self.root, NULL);
        }
    }
}

fn subtree_equal(at: &Arena, a: NodeId, bt: &Arena, b: NodeId) -> bool {
    if a == NULL || b == NULL {
        return a == NULL && b == NULL;
    }
    let an = *at.get(a);
    let bn = *bt.get(b);
    if an.prefix != bn.prefix || an.level != bn.level || an.ul != bn.ul || an.incl != bn.incl {
        return false;
    }
    if an.is_leaf() {
        return true;
    }
    subtree_equal(at, an.left, bt, bn.left) && subtree_equal(at, an.right, bt, bn.right)
}

impl Arena {
    /// Deep-copies the subtree rooted at `id` in `src` into `self`, returning
    /// the new root id. `NULL` maps to `NULL`. Trie depth is bounded by 64
    /// (each level consumes at least one prefix bit), so plain recursion
    /// here can never overflow the stack regardless of leaf count.
    pub(crate) fn clone_subtree(&mut self, src: &Arena, id: NodeId) -> NodeId {
        if id == NULL {
            return NULL;
        }
        let n = *src.get(id);
        if n.is_leaf() {
            return self.alloc(Node::leaf(n.prefix, n.ul, n.incl));
        }
        let left = self.clone_subtree(src, n.left);
        let right = self.clone_subtree(src, n.right);
        make_internal(self, n.prefix, n.level, left, right)
    }

    /// Frees every node in the subtree rooted at `id`, using an explicit
    /// stack rather than recursion so a single call can retire an
    /// arbitrarily large subtree without growing the native call stack.
    /// Sized up front from the subtree's own `count` (spec.md §4.3.6): a
    /// binary tree with `count` leaves has at most `count` internal nodes,
    /// so `2 * count` bounds the number of ids ever live on the stack at
    /// once.
    pub(crate) fn free_subtree(&mut self, id: NodeId) {
        if id == NULL {
            return;
        }
        let mut stack = Vec::with_capacity(2 * self.get(id).count as usize);
        stack.push(id);
        while let Some(n) = stack.pop() {
            let node = *self.get(n);
            if !node.is_leaf() {
                stack.push(node.left);
                stack.push(node.right);
            }
            self.free(n);
        }
    }
}

/// Allocates an internal node over `left`/`right`, wiring parent pointers
/// and deriving `ul` (XOR of children's `ul`) and `count` (sum of children's
/// `count`).
fn make_internal(arena: &mut Arena, prefix: u64, level: u8, left: NodeId, right: NodeId) -> NodeId {
    let l = *arena.get(left);
    let r = *arena.get(right);
    let id = arena.alloc(Node::internal(prefix, level, left, right, l.ul != r.ul, l.count + r.count));
    arena.get_mut(left).parent = id;
    arena.get_mut(right).parent = id;
    id
}

/// Rebuilds an internal node from a `(level, left, right)` triple alone,
/// recovering `prefix` as the shared high bits of the left subtree's
/// leftmost leaf. Used by [`crate::serialize`], whose on-disk format omits
/// internal-node prefixes since they're fully determined by `level` and the
/// children already written.
pub(crate) fn build_internal_from_children(arena: &mut Arena, level: u8, left: NodeId, right: NodeId) -> NodeId {
    let prefix = mask_above(leftmost_prefix(arena, left), level);
    make_internal(arena, prefix, level, left, right)
}

fn leftmost_prefix(arena: &Arena, id: NodeId) -> u64 {
    let mut n = id;
    while !arena.get(n).is_leaf() {
        n = arena.get(n).left;
    }
    arena.get(n).prefix
}

/// If `left`/`right` is empty, the join/merge/overlap result collapses to
/// the other side; otherwise allocate the internal node joining them.
fn combine(arena: &mut Arena, left: NodeId, right: NodeId, prefix: u64, level: u8) -> NodeId {
    if left == NULL {
        right
    } else if right == NULL {
        left
    } else {
        make_internal(arena, prefix, level, left, right)
    }
}

/// A constant background (`bul`) meets a live subtree `a`. Under OR, a fully
/// included background swallows `a`; under AND, a fully excluded background
/// erases it; otherwise `a` survives untouched (XOR never short-circuits
/// here — a constant background still needs `a`'s transitions to compute the
/// symmetric difference).
fn overlap(arena: &mut Arena, a: NodeId, bul: bool, op: Op) -> NodeId {
    if (op == Op::Or && bul) || (op == Op::And && !bul) {
        arena.free_subtree(a);
        NULL
    } else {
        a
    }
}

/// Two leaves at the same prefix collide: their individual transitions
/// combine into a single transition via the `(incl, ul)` endpoint algebra.
fn collision(arena: &mut Arena, a: NodeId, b: NodeId, aul: bool, bul: bool, op: Op) -> NodeId {
    let an = *arena.get(a);
    let bn = *arena.get(b);

    let a_incl = an.incl != aul;
    let b_incl = bn.incl != bul;
    let a_ul = an.ul != aul;
    let b_ul = bn.ul != bul;

    let (below, includes, above) = match op {
        Op::Or => (aul || bul, a_incl || b_incl, a_ul || b_ul),
        Op::And => (aul && bul, a_incl && b_incl, a_ul && b_ul),
        Op::Xor => (aul != bul, a_incl != b_incl, a_ul != b_ul),
    };

    let bound_below = below != includes;
    let bound_above = above != includes;

    if !bound_below && !bound_above {
        arena.free(a);
        arena.free(b);
        return NULL;
    }

    let unbounded = bound_below != bound_above;
    if bound_below == an.incl && unbounded == an.ul {
        arena.free(b);
        return a;
    }
    if bound_below == bn.incl && unbounded == bn.ul {
        arena.free(a);
        return b;
    }
    arena.free(a);
    arena.free(b);
    arena.alloc(Node::leaf(an.prefix, unbounded, bound_below))
}

/// `a` and `b` share no prefix at either's level: build the internal node
/// that splits them, folding the non-containing side in as a constant
/// background via [`overlap`].
fn join(arena: &mut Arena, a: NodeId, b: NodeId, aul: bool, bul: bool, op: Op) -> NodeId {
    let an = *arena.get(a);
    let bn = *arena.get(b);
    let level = branching_bit(an.prefix, bn.prefix);
    let prefix = mask_above(an.prefix, level);

    let (left, right) = if zero_at(an.prefix, level) {
        let lul = aul != an.ul;
        let left = overlap(arena, a, bul, op);
        let right = overlap(arena, b, lul, op);
        (left, right)
    } else {
        let lul = bul != bn.ul;
        let left = overlap(arena, b, aul, op);
        let right = overlap(arena, a, lul, op);
        (left, right)
    };
    combine(arena, left, right, prefix, level)
}

/// Single-arena recursive merge. `aul`/`bul` are the carries entering `a`/`b`
/// from their left (the accumulated parity of everything below and to the
/// left of the subtree). Both subtrees already live in the same arena, so no
/// cross-arena clone is ever needed mid-recursion.
fn merge(arena: &mut Arena, a: NodeId, b: NodeId, aul: bool, bul: bool, op: Op) -> NodeId {
    if a == NULL && b == NULL {
        return NULL;
    }
    if a == NULL {
        return overlap(arena, b, aul, op);
    }
    if b == NULL {
        return overlap(arena, a, bul, op);
    }

    let an = *arena.get(a);
    let bn = *arena.get(b);

    if an.level > bn.level {
        if !is_prefix_at(bn.prefix, an.prefix, an.level) {
            return join(arena, a, b, aul, bul, op);
        }
        let (a_left, a_right, a_prefix, a_level) = (an.left, an.right, an.prefix, an.level);
        arena.free(a);
        let (left, right) = if zero_at(bn.prefix, a_level) {
            let rul = bul != bn.ul;
            let left = merge(arena, a_left, b, aul, bul, op);
            let right = overlap(arena, a_right, rul, op);
            (left, right)
        } else {
            let rul = aul != arena.get(a_left).ul;
            let left = overlap(arena, a_left, bul, op);
            let right = merge(arena, a_right, b, rul, bul, op);
            (left, right)
        };
        combine(arena, left, right, a_prefix, a_level)
    } else if bn.level > an.level {
        if !is_prefix_at(an.prefix, bn.prefix, bn.level) {
            return join(arena, a, b, aul, bul, op);
        }
        let (b_left, b_right, b_prefix, b_level) = (bn.left, bn.right, bn.prefix, bn.level);
        arena.free(b);
        let (left, right) = if zero_at(an.prefix, b_level) {
            let lul = aul != an.ul;
            let left = merge(arena, a, b_left, aul, bul, op);
            let right = overlap(arena, b_right, lul, op);
            (left, right)
        } else {
            let rul = bul != arena.get(b_right).ul;
            let left = overlap(arena, b_left, aul, op);
            let right = merge(arena, a, b_right, aul, rul, op);
            (left, right)
        };
        combine(arena, left, right, b_prefix, b_level)
    } else {
        if an.prefix != bn.prefix {
            return join(arena, a, b, aul, bul, op);
        }
        if an.level == 0 {
            return collision(arena, a, b, aul, bul, op);
        }
        let lul = aul != arena.get(an.left).ul;
        let rul = bul != arena.get(bn.left).ul;
        let left = merge(arena, an.left, bn.left, aul, bul, op);
        let right = merge(arena, an.right, bn.right, lul, rul, op);
        combine(arena, left, right, an.prefix, an.level)
    }
}

/// Entry point: merges two whole trees (each identified by root id plus
/// entering carry) and returns the new root plus the tree-level carry,
/// which combines the same way the node-level carries do.
fn merge_root(arena: &mut Arena, a: NodeId, b: NodeId, aul: bool, bul: bool, op: Op) -> (NodeId, bool) {
    let root = merge(arena, a, b, aul, bul, op);
    if root != NULL {
        arena.get_mut(root).parent = NULL;
    }
    let ul = match op {
        Op::And => aul && bul,
        Op::Or => aul || bul,
        Op::Xor => aul != bul,
    };
    (root, ul)
}
