use crate::{
    alloc::{Allocator, Global},
    compare::Identity,
    node::Link,
    tree::RBTree,
};
use std::{
    fmt::{self, Debug, Formatter},
    iter::FusedIterator,
    marker::PhantomData,
    ptr,
};

/// A borrow-free position in a tree.
///
/// Handles are returned by the insertion functions and can be turned back into a value or a
/// [`Cursor`] with [`RBTree::get`] and [`RBTree::cursor`]. Inserting never invalidates a handle.
/// Clearing the tree does; a handle from a cleared or unrelated tree resolves to the end position.
pub struct Handle<T> {
    stamp: u64,
    node:  Link<T>,
}

// a handle is only ever dereferenced through the tree it resolves against
unsafe impl<T> Send for Handle<T> {}
unsafe impl<T> Sync for Handle<T> {}

impl<T> Clone for Handle<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    #[inline]
    fn eq(&self, rhs: &Self) -> bool {
        self.stamp == rhs.stamp && self.node == rhs.node
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Debug for Handle<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Handle")
            .field("stamp", &self.stamp)
            .field("node", &self.node)
            .finish()
    }
}

impl<T> Handle<T> {
    #[inline]
    pub(crate) fn new(stamp: u64, node: Link<T>) -> Self {
        Handle { stamp, node }
    }

    /// `true` if the handle denotes the end position.
    ///
    /// A stale handle that is not at end still resolves to end against its tree.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    #[inline]
    pub(crate) fn resolve(self, stamp: u64) -> Link<T> {
        if self.stamp == stamp {
            self.node
        } else {
            None
        }
    }
}

/// A bidirectional position in a tree, either at an element or at the end.
///
/// Movement wraps around: moving forward from the last element reaches the end, and moving forward
/// from the end reaches the first element (backwards likewise).
pub struct Cursor<'a, T, X = Identity, A: Allocator = Global> {
    tree: &'a RBTree<T, X, A>,
    node: Link<T>,
}

impl<'a, T, X, A: Allocator> Clone for Cursor<'a, T, X, A> {
    #[inline]
    fn clone(&self) -> Self {
        Cursor {
            tree: self.tree,
            node: self.node,
        }
    }
}

impl<'a, T, X, A: Allocator> PartialEq for Cursor<'a, T, X, A> {
    #[inline]
    fn eq(&self, rhs: &Self) -> bool {
        ptr::eq(self.tree, rhs.tree) && self.node == rhs.node
    }
}

impl<'a, T, X, A: Allocator> Eq for Cursor<'a, T, X, A> {}

impl<'a, T: Debug, X, A: Allocator> Debug for Cursor<'a, T, X, A> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("Cursor").field(&self.get()).finish()
    }
}

impl<'a, T, X, A: Allocator> Cursor<'a, T, X, A> {
    #[inline]
    pub(crate) fn new(tree: &'a RBTree<T, X, A>, node: Link<T>) -> Self {
        Cursor { tree, node }
    }

    /// The element at the cursor, or `None` at the end.
    #[inline]
    pub fn get(&self) -> Option<&'a T> {
        self.node.map(|node| unsafe { node.value() })
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// A handle to this position that does not borrow the tree.
    #[inline]
    pub fn handle(&self) -> Handle<T> {
        Handle::new(self.tree.stamp(), self.node)
    }

    pub fn move_next(&mut self) {
        self.node = match self.node {
            None => self.tree.head(),
            Some(node) => node.next(),
        }
    }

    pub fn move_prev(&mut self) {
        self.node = match self.node {
            None => self.tree.tail(),
            Some(node) => node.prev(),
        }
    }

    pub fn peek_next(&self) -> Option<&'a T> {
        let mut next = self.clone();
        next.move_next();
        next.get()
    }

    pub fn peek_prev(&self) -> Option<&'a T> {
        let mut prev = self.clone();
        prev.move_prev();
        prev.get()
    }

    /// Iterates from this position up to, but excluding, `end`.
    ///
    /// `end` must not be ordered before this cursor.
    pub fn iter_until(&self, end: &Self) -> Iter<'a, T> {
        debug_assert!(ptr::eq(self.tree, end.tree), "cursors from different trees");
        Iter::new(self.node, end.node, self.tree.tail())
    }
}

/// An in-order iterator over the elements of a tree.
pub struct Iter<'a, T> {
    front:   Link<T>,
    // exclusive; `None` is the end position
    back:    Link<T>,
    last:    Link<T>,
    phantom: PhantomData<&'a T>,
}

unsafe impl<'a, T: Sync> Send for Iter<'a, T> {}
unsafe impl<'a, T: Sync> Sync for Iter<'a, T> {}

impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Iter {
            front:   self.front,
            back:    self.back,
            last:    self.last,
            phantom: PhantomData,
        }
    }
}

impl<'a, T: Debug> Debug for Iter<'a, T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, T> Iter<'a, T> {
    #[inline]
    pub(crate) fn new(front: Link<T>, back: Link<T>, last: Link<T>) -> Self {
        Iter {
            front,
            back,
            last,
            phantom: PhantomData,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        let node = self.front?;
        self.front = node.next();
        Some(unsafe { node.value() })
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        let node = match self.back {
            None => self.last?,
            Some(back) => back.prev()?,
        };
        self.back = Some(node);
        Some(unsafe { node.value() })
    }
}

impl<'a, T> FusedIterator for Iter<'a, T> {}

#[cfg(test)]
mod tests {
    use crate::{Less, RBTree};

    fn tree() -> RBTree<i32> {
        let mut tree = RBTree::new();
        for &x in &[4, 2, 6, 1, 3, 5, 7] {
            tree.emplace(&Less, x).unwrap();
        }
        tree
    }

    #[test]
    fn cursor_wraps() {
        let tree = tree();
        let mut cursor = tree.end();
        cursor.move_next();
        assert_eq!(cursor.get(), Some(&1));
        cursor.move_prev();
        assert!(cursor.is_end());
        cursor.move_prev();
        assert_eq!(cursor.get(), Some(&7));
        assert_eq!(cursor.peek_next(), None);
        assert_eq!(cursor.peek_prev(), Some(&6));
        cursor.move_next();
        assert_eq!(cursor, tree.end());
    }

    #[test]
    fn iter_both_ends() {
        let tree = tree();
        let mut iter = tree.iter();
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&7));
        assert_eq!(iter.next_back(), Some(&6));
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(tree.iter().rev().copied().collect::<Vec<_>>(), vec![7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn iter_until() {
        let tree = tree();
        let lo = tree.lower_bound(&Less, &3);
        let hi = tree.upper_bound(&Less, &5);
        assert_eq!(lo.iter_until(&hi).copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(lo.iter_until(&lo).next(), None);
        assert_eq!(lo.iter_until(&tree.end()).rev().next(), Some(&7));
    }

    #[test]
    fn empty() {
        let tree = RBTree::<i32>::new();
        let mut cursor = tree.begin();
        assert!(cursor.is_end());
        cursor.move_next();
        assert!(cursor.is_end());
        assert_eq!(tree.iter().next_back(), None);
    }
}
