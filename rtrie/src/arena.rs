//! A bucketed, free-listed pool of [`Node`] slots, owned exclusively by one
//! [`crate::trie::Tree`].
//!
//! Each `Tree` carries its own `Arena` value, so two trees never share node
//! ids and a `Tree` can move across threads freely as long as it isn't
//! mutated concurrently with a read. Growth is bucketed (fixed-size
//! `Vec<Node>` chunks appended on demand) rather than one ever-reallocating
//! `Vec`, so a long-lived arena never has to copy its whole backing store to
//! grow.

use crate::node::{Node, NodeId, NULL};

/// Default bucket size (1 Mi nodes).
pub const DEFAULT_BUCKET_SIZE: usize = 1 << 20;

/// Per-trie node storage with an intrusive free list.
///
/// Slot `0` is the sentinel null node and is allocated (but never handed out
/// by [`Arena::alloc`]) when an arena is created.
#[derive(Clone, Debug)]
pub struct Arena {
    bucket_size: usize,
    buckets: Vec<Vec<Node>>,
    next_free: NodeId,
    num_free: u32,
}

impl Default for Arena {
    fn default() -> Self {
        Self::with_bucket_size(DEFAULT_BUCKET_SIZE)
    }
}

impl Arena {
    /// Construct an arena with a custom bucket size (tests use small buckets
    /// to exercise the cross-bucket growth path cheaply).
    pub fn with_bucket_size(bucket_size: usize) -> Self {
        assert!(bucket_size > 0, "bucket size must be positive");
        let mut buckets = Vec::new();
        buckets.push(Vec::with_capacity(bucket_size));
        // slot 0 is the sentinel null node.
        buckets[0].push(Node::default());
        Arena {
            bucket_size,
            buckets,
            next_free: NULL,
            num_free: 0,
        }
    }

    #[inline]
    fn bucket_and_index(&self, id: NodeId) -> (usize, usize) {
        let i = id as usize;
        (i / self.bucket_size, i % self.bucket_size)
    }

    /// Read a slot. Panics on the null id or an id past the high-water mark;
    /// both indicate a caller bug (a freed or never-allocated id retained
    /// past its lifetime).
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        debug_assert_ne!(id, NULL, "attempted to read the null node");
        let (bucket, idx) = self.bucket_and_index(id);
        &self.buckets[bucket][idx]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        debug_assert_ne!(id, NULL, "attempted to write the null node");
        let (bucket, idx) = self.bucket_and_index(id);
        &mut self.buckets[bucket][idx]
    }

    /// Allocate a fresh slot, preferring a previously freed one.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        if self.num_free > 0 {
            let id = self.next_free;
            let (bucket, idx) = self.bucket_and_index(id);
            self.next_free = self.buckets[bucket][idx].left;
            self.buckets[bucket][idx] = node;
            self.num_free -= 1;
            return id;
        }

        let last = self.buckets.len() - 1;
        if self.buckets[last].len() == self.bucket_size {
            self.buckets.push(Vec::with_capacity(self.bucket_size));
        }
        let bucket = self.buckets.len() - 1;
        let idx = self.buckets[bucket].len();
        self.buckets[bucket].push(node);
        (bucket * self.bucket_size + idx) as NodeId
    }

    /// Retire a slot onto the free list. `free(NULL)` is a no-op.
    pub fn free(&mut self, id: NodeId) {
        if id == NULL {
            return;
        }
        let (bucket, idx) = self.bucket_and_index(id);
        self.buckets[bucket][idx] = Node {
            left: self.next_free,
            ..Node::default()
        };
        self.next_free = id;
        self.num_free += 1;
    }

    /// Reset to the empty state without releasing the buckets back to the
    /// process allocator, so a cleared arena can be reused without
    /// reallocating.
    pub fn clear(&mut self) {
        self.buckets.truncate(1);
        self.buckets[0].truncate(1);
        self.next_free = NULL;
        self.num_free = 0;
    }

    pub(crate) fn num_free(&self) -> u32 {
        self.num_free
    }

    pub(crate) fn next_free(&self) -> NodeId {
        self.next_free
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn alloc_reuses_freed_slots() {
        let mut arena = Arena::default();
        let a = arena.alloc(Node::leaf(1, false, true));
        let b = arena.alloc(Node::leaf(2, false, true));
        arena.free(a);
        let c = arena.alloc(Node::leaf(3, false, true));
        assert_eq!(c, a, "freed slot should be reused before growing");
        assert_ne!(b, c);
    }

    #[test]
    fn free_null_is_noop() {
        let mut arena = Arena::default();
        arena.free(NULL);
        assert_eq!(arena.num_free(), 0);
    }

    #[test]
    fn grows_across_buckets() {
        let mut arena = Arena::with_bucket_size(4);
        let ids: Vec<_> = (0..10)
            .map(|i| arena.alloc(Node::leaf(i, false, true)))
            .collect();
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(arena.get(*id).prefix, i as u64);
        }
        assert_eq!(arena.buckets.len(), 3);
    }

    #[test]
    fn clear_resets_without_dropping_capacity() {
        let mut arena = Arena::with_bucket_size(4);
        for i in 0..10 {
            arena.alloc(Node::leaf(i, false, true));
        }
        let bucket_capacity = arena.buckets[0].capacity();
        arena.clear();
        assert_eq!(arena.num_free(), 0);
        assert_eq!(arena.next_free(), NULL);
        assert_eq!(arena.buckets.len(), 1);
        assert_eq!(arena.buckets[0].capacity(), bucket_capacity);
    }
}
