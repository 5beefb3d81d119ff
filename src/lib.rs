//! A red-black tree engine for ordered associative containers.
//!
//! `redblack` provides the balanced binary search tree underneath sets, maps, multisets and
//! multimaps. It owns its nodes, keeps them ordered by a caller supplied comparator, and stays
//! balanced after every insertion.
//!
//! # Examples
//!
//! A set of integers:
//! ```
//! use redblack::{Less, RBTree};
//!
//! let mut set = RBTree::new();
//! for x in [5, 3, 8, 1, 4, 7, 9].iter().copied() {
//!     set.emplace(&Less, x).unwrap();
//! }
//! assert!(set.iter().copied().eq(vec![1, 3, 4, 5, 7, 8, 9]));
//! assert_eq!(set.lower_bound(&Less, &6).get(), Some(&7));
//! ```
//!
//! A multimap keyed by the first element of each pair, ordered by a closure:
//! ```
//! use redblack::RBTree;
//!
//! let by_len = |a: &&str, b: &&str| a.len() < b.len();
//! let mut words = RBTree::new_multimap();
//! for (i, word) in ["bb", "a", "cc", "ddd"].iter().copied().enumerate() {
//!     words.emplace(&by_len, (word, i)).unwrap();
//! }
//! assert_eq!(words.count(&by_len, &"xx"), 2);
//! let (lo, hi) = words.equal_range(&by_len, &"xx");
//! assert!(lo.iter_until(&hi).map(|&(w, _)| w).eq(vec!["bb", "cc"]));
//! ```
//!
//! # Features
//!
//! * Unique or multi mode, chosen at construction. Multi trees keep equivalent elements in
//!   insertion order.
//! * The comparator is passed to every search and insertion instead of being stored. Anything
//!   implementing [`Compare`] works, including plain closures.
//! * Nodes are allocated one at a time from an [`Allocator`](alloc::Allocator) stored in the tree.
//! * Insertions return a [`Handle`], a position that does not borrow the tree and survives later
//!   insertions. Handles can be passed back as insertion hints.
//! * Allocation failure is reported as an [`Error`] and leaves the tree unchanged. A panicking value
//!   constructor also leaves the tree unchanged.
//! * Single element removal is not supported. [`RBTree::clear`] destroys every element.
//!
//! Enabling the `stats` feature records rotation, rebalancing and hint statistics; see [`stats`].

#![warn(macro_use_extern_crate)]
#![warn(missing_debug_implementations)]
#![warn(unused_lifetimes)]
#![deny(rust_2018_compatibility)]
#![deny(rust_2018_idioms)]
#![deny(unused_must_use)]

pub mod alloc;
pub mod stats;

mod algo;
mod compare;
mod cursor;
mod error;
mod node;
mod tree;
mod verify;

pub use compare::{Compare, First, Greater, Identity, KeyOf, Less};
pub use cursor::{Cursor, Handle, Iter};
pub use error::Error;
pub use tree::RBTree;
pub use verify::Verify;


#[cfg(test)]
mod panic {
    use crate::{alloc::DebugAlloc, Less, RBTree};
    use std::panic::{self, AssertUnwindSafe};

    #[test]
    fn constructor() {
        let alloc = DebugAlloc::default();
        let mut tree = RBTree::new_in(alloc.clone());
        tree.insert_range(&Less, 0..10).unwrap();
        let before = tree.iter().copied().collect::<Vec<_>>();

        match panic::catch_unwind(AssertUnwindSafe(|| {
            tree.emplace_with(&Less, || -> i32 { panic!("test panic") })
        })) {
            Ok(_) => unreachable!(),
            Err(_) => {
                assert_eq!(tree.len(), 10, "a failed construction changed the tree");
                assert_eq!(alloc.live(), 10, "a failed construction leaked its node");
            }
        }
        let end = tree.end().handle();
        match panic::catch_unwind(AssertUnwindSafe(|| {
            tree.try_emplace_hint(&Less, end, 42, |_| -> i32 { panic!("test panic") })
        })) {
            Ok(_) => unreachable!(),
            Err(_) => assert_eq!(alloc.live(), 10, "a failed construction leaked its node"),
        }

        tree.verify(&Less);
        assert!(tree.iter().copied().eq(before));
        assert!(tree.emplace(&Less, 42).unwrap().1);
    }

    #[test]
    fn comparator() {
        let mut tree = RBTree::new();
        tree.insert_range(&Less, 0..10).unwrap();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            tree.emplace(&|_: &i32, _: &i32| -> bool { panic!("test panic") }, 5)
        }));
        assert!(result.is_err());
        assert_eq!(tree.len(), 10);
        tree.verify(&Less);
    }

    #[test]
    fn comparator_after_construction() {
        let alloc = DebugAlloc::default();
        let mut tree = RBTree::new_in(alloc.clone());
        tree.insert_range(&Less, 0..10).unwrap();
        let panicking = |_: &i32, _: &i32| -> bool { panic!("test panic") };

        let result = panic::catch_unwind(AssertUnwindSafe(|| tree.emplace_with(&panicking, || 5)));
        assert!(result.is_err());
        assert_eq!(tree.len(), 10);
        assert_eq!(alloc.live(), 10, "the constructed node leaked");

        let hint = tree.begin().handle();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            tree.emplace_hint_with(&panicking, hint, || 5)
        }));
        assert!(result.is_err());
        assert_eq!(tree.len(), 10);
        assert_eq!(alloc.live(), 10, "the constructed node leaked");

        tree.verify(&Less);
        assert!(tree.iter().copied().eq(0..10));
        assert_eq!(alloc.allocations(), 12);
        assert_eq!(alloc.deallocations(), 2);
    }
}
