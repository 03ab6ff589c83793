use std::cmp::Ordering;
use std::collections::binary_heap::BinaryHeap;
use std::marker::PhantomData;

use super::handle::{Handle, HandleIndex, HandleLike};

#[derive(PartialEq, Eq)]
struct InverseHandleIndex(HandleIndex);

impl PartialOrd for InverseHandleIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        other.0.partial_cmp(&self.0)
    }
}

impl Ord for InverseHandleIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.cmp(&self.0)
    }
}

/// `HandlePool` hands out handles with a compact `index` field and tracks
/// which of them are still alive. Freed indices are recycled smallest-first,
/// with the version bumped so stale handles are detectable.
///
/// A slot's version is odd while the slot is alive and even while it is
/// free; `is_alive` checks both the parity and the exact version match.
pub struct HandlePool<H = Handle>
where
    H: HandleLike,
{
    versions: Vec<HandleIndex>,
    frees: BinaryHeap<InverseHandleIndex>,
    _marker: PhantomData<H>,
}

impl<H: HandleLike> Default for HandlePool<H> {
    fn default() -> Self {
        HandlePool::new()
    }
}

impl<H: HandleLike> HandlePool<H> {
    pub fn new() -> Self {
        HandlePool {
            versions: Vec::new(),
            frees: BinaryHeap::new(),
            _marker: PhantomData,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        HandlePool {
            versions: Vec::with_capacity(capacity),
            frees: BinaryHeap::with_capacity(capacity),
            _marker: PhantomData,
        }
    }

    /// Creates an unused handle, preferring the smallest recycled index.
    pub fn create(&mut self) -> H {
        if let Some(InverseHandleIndex(index)) = self.frees.pop() {
            self.versions[index as usize] += 1;
            H::new(index, self.versions[index as usize])
        } else {
            self.versions.push(1);
            H::new(self.versions.len() as HandleIndex - 1, 1)
        }
    }

    /// Returns true if `handle` was created by this pool and has not been
    /// freed since.
    pub fn is_alive(&self, handle: H) -> bool {
        let index = handle.index() as usize;
        self.is_alive_at(index) && (self.versions[index] == handle.version())
    }

    #[inline]
    fn is_alive_at(&self, index: usize) -> bool {
        (index < self.versions.len()) && ((self.versions[index] & 0x1) == 1)
    }

    /// Recycles the handle's index. Returns false for dead or foreign
    /// handles.
    pub fn free(&mut self, handle: H) -> bool {
        if !self.is_alive(handle) {
            false
        } else {
            self.versions[handle.index() as usize] += 1;
            self.frees.push(InverseHandleIndex(handle.index()));
            true
        }
    }

    /// Number of live handles.
    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len() - self.frees.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over all live handles.
    #[inline]
    pub fn iter(&self) -> Iter<H> {
        Iter {
            versions: &self.versions,
            next: 0,
            _marker: PhantomData,
        }
    }
}

/// Immutable iterator over the live handles of a `HandlePool`.
pub struct Iter<'a, H: HandleLike> {
    versions: &'a [HandleIndex],
    next: usize,
    _marker: PhantomData<H>,
}

impl<'a, H: HandleLike> Iterator for Iter<'a, H> {
    type Item = H;

    fn next(&mut self) -> Option<H> {
        while self.next < self.versions.len() {
            let index = self.next;
            self.next += 1;

            let version = self.versions[index];
            if version & 0x1 == 1 {
                return Some(H::new(index as HandleIndex, version));
            }
        }

        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn create_and_free() {
        let mut pool = HandlePool::<Handle>::new();

        let a = pool.create();
        let b = pool.create();
        assert_ne!(a, b);
        assert!(pool.is_alive(a));
        assert!(pool.is_alive(b));
        assert_eq!(pool.len(), 2);

        assert!(pool.free(a));
        assert!(!pool.is_alive(a));
        assert!(!pool.free(a));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn recycles_smallest_index_with_new_version() {
        let mut pool = HandlePool::<Handle>::new();

        let a = pool.create();
        let b = pool.create();
        pool.free(a);
        pool.free(b);

        let c = pool.create();
        assert_eq!(c.index(), a.index());
        assert_ne!(c.version(), a.version());
        assert!(pool.is_alive(c));
        assert!(!pool.is_alive(a));
    }

    #[test]
    fn iterates_live_handles_only() {
        let mut pool = HandlePool::<Handle>::new();

        let handles: Vec<_> = (0..4).map(|_| pool.create()).collect();
        pool.free(handles[1]);

        let alive: Vec<_> = pool.iter().collect();
        assert_eq!(alive, vec![handles[0], handles[2], handles[3]]);
    }
}
