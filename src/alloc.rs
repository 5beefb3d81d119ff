//! The allocator capability consumed by the tree, and a counting allocator for tests and
//! diagnostics.
//!
//! Nodes are allocated one at a time through an [`Allocator`]. Construction is an in place write
//! into the fresh slot and destruction is `drop_in_place` followed by `deallocate`.

pub use allocator_api2::alloc::{AllocError, Allocator, Global};

use std::{
    alloc::Layout,
    ptr::NonNull,
    sync::{
        atomic::{AtomicUsize, Ordering::Relaxed},
        Arc,
    },
};

#[derive(Default, Debug)]
struct Counts {
    live:          AtomicUsize,
    allocations:   AtomicUsize,
    deallocations: AtomicUsize,
}

/// An allocator that counts what passes through it.
///
/// Clones share their counters, so a `DebugAlloc` handed to a tree can still be inspected after
/// the tree has taken its own copy.
///
/// ```
/// use redblack::{alloc::DebugAlloc, Less, RBTree};
///
/// let alloc = DebugAlloc::default();
/// let mut tree = RBTree::new_in(alloc.clone());
/// for x in 0..10 {
///     tree.emplace(&Less, x).unwrap();
/// }
/// assert_eq!(alloc.live(), 10);
/// drop(tree);
/// assert_eq!(alloc.live(), 0);
/// assert_eq!(alloc.deallocations(), 10);
/// ```
#[derive(Clone, Debug)]
pub struct DebugAlloc<A = Global> {
    inner:  A,
    counts: Arc<Counts>,
}

impl<A> DebugAlloc<A> {
    pub fn new(inner: A) -> Self {
        DebugAlloc {
            inner,
            counts: Arc::default(),
        }
    }

    /// Number of allocations that have not been deallocated yet.
    #[inline]
    pub fn live(&self) -> usize {
        self.counts.live.load(Relaxed)
    }

    /// Total number of successful allocations.
    #[inline]
    pub fn allocations(&self) -> usize {
        self.counts.allocations.load(Relaxed)
    }

    /// Total number of deallocations.
    #[inline]
    pub fn deallocations(&self) -> usize {
        self.counts.deallocations.load(Relaxed)
    }
}

impl Default for DebugAlloc {
    #[inline]
    fn default() -> Self {
        DebugAlloc::new(Global)
    }
}

unsafe impl<A: Allocator> Allocator for DebugAlloc<A> {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let res = self.inner.allocate(layout)?;
        self.counts.live.fetch_add(1, Relaxed);
        self.counts.allocations.fetch_add(1, Relaxed);
        Ok(res)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.counts.live.fetch_sub(1, Relaxed);
        self.counts.deallocations.fetch_add(1, Relaxed);
        self.inner.deallocate(ptr, layout)
    }
}
