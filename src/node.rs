//! Tree nodes and the constant time structural queries on them.
//!
//! A node exclusively owns its `left` and `right` subtrees. The parent link is a non-owning back
//! reference used for traversal and rebalancing, never for destruction. The color of a node lives
//! in the low bit of its parent link.

use crate::algo;
use std::{
    fmt::{self, Debug, Formatter},
    ptr::{self, NonNull},
};

/// The color of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Color {
    Black = 0,
    Red = 1,
}

pub(crate) type Link<T> = Option<NodePtr<T>>;

/// packed parent pointer/color
pub(crate) struct ParentColor<T> {
    raw: *mut Node<T>,
}

impl<T> Clone for ParentColor<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for ParentColor<T> {}

impl<T> ParentColor<T> {
    #[inline]
    pub(crate) fn new(parent: Link<T>, color: Color) -> Self {
        let ptr = parent.map_or(ptr::null_mut(), NodePtr::as_ptr);
        debug_assert!(ptr as usize & 1 == 0, "misaligned node");
        ParentColor {
            raw: (ptr as usize | color as usize) as *mut Node<T>,
        }
    }

    #[inline]
    pub(crate) fn color(self) -> Color {
        if self.raw as usize & 1 != Color::Black as _ {
            Color::Red
        } else {
            Color::Black
        }
    }

    #[inline]
    pub(crate) fn parent(self) -> Link<T> {
        NonNull::new((self.raw as usize & !1) as *mut Node<T>).map(NodePtr)
    }
}

#[repr(C)]
pub(crate) struct Node<T> {
    left:         Link<T>,
    right:        Link<T>,
    parent_color: ParentColor<T>,
    value:        T,
}

impl<T> Node<T> {
    /// A detached red node, ready to be linked under a parent.
    #[inline]
    pub(crate) fn new(value: T) -> Self {
        Node {
            left: None,
            right: None,
            parent_color: ParentColor::new(None, Color::Red),
            value,
        }
    }
}

/// A non-null pointer to a node owned by some tree.
///
/// All accessors dereference the pointer. They are sound as long as the owning tree keeps the node
/// alive, which every caller inside this crate guarantees (nodes are only freed by `clear`).
pub(crate) struct NodePtr<T>(NonNull<Node<T>>);

impl<T> Clone for NodePtr<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for NodePtr<T> {}

impl<T> PartialEq for NodePtr<T> {
    #[inline]
    fn eq(&self, rhs: &Self) -> bool {
        self.0 == rhs.0
    }
}
impl<T> Eq for NodePtr<T> {}

impl<T> Debug for NodePtr<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "NodePtr({:p})", self.0)
    }
}

impl<T> NodePtr<T> {
    #[inline]
    pub(crate) fn from_non_null(raw: NonNull<Node<T>>) -> Self {
        NodePtr(raw)
    }

    #[inline]
    pub(crate) fn as_non_null(self) -> NonNull<Node<T>> {
        self.0
    }

    #[inline]
    pub(crate) fn as_ptr(self) -> *mut Node<T> {
        self.0.as_ptr()
    }

    /// The payload. The lifetime is chosen by the caller and must not outlive the owning tree.
    #[inline]
    pub(crate) unsafe fn value<'a>(self) -> &'a T {
        &(*self.as_ptr()).value
    }

    #[inline]
    pub(crate) fn left(self) -> Link<T> {
        unsafe { (*self.as_ptr()).left }
    }

    #[inline]
    pub(crate) fn right(self) -> Link<T> {
        unsafe { (*self.as_ptr()).right }
    }

    #[inline]
    pub(crate) fn parent(self) -> Link<T> {
        self.parent_color().parent()
    }

    #[inline]
    pub(crate) fn color(self) -> Color {
        self.parent_color().color()
    }

    #[inline]
    fn parent_color(self) -> ParentColor<T> {
        unsafe { (*self.as_ptr()).parent_color }
    }

    #[inline]
    pub(crate) fn set_left(self, left: Link<T>) {
        unsafe { (*self.as_ptr()).left = left }
    }

    #[inline]
    pub(crate) fn set_right(self, right: Link<T>) {
        unsafe { (*self.as_ptr()).right = right }
    }

    #[inline]
    pub(crate) fn set_parent(self, parent: Link<T>) {
        let color = self.color();
        self.set_parent_color(parent, color)
    }

    #[inline]
    pub(crate) fn set_color(self, color: Color) {
        let parent = self.parent();
        self.set_parent_color(parent, color)
    }

    #[inline]
    pub(crate) fn set_parent_color(self, parent: Link<T>, color: Color) {
        unsafe { (*self.as_ptr()).parent_color = ParentColor::new(parent, color) }
    }

    #[inline]
    pub(crate) fn is_red(self) -> bool {
        self.color() == Color::Red
    }

    #[inline]
    pub(crate) fn is_black(self) -> bool {
        self.color() == Color::Black
    }

    #[inline]
    pub(crate) fn is_left_child(self) -> bool {
        match self.parent() {
            Some(parent) => parent.left() == Some(self),
            None => false,
        }
    }

    #[inline]
    pub(crate) fn is_right_child(self) -> bool {
        match self.parent() {
            Some(parent) => parent.right() == Some(self),
            None => false,
        }
    }

    #[inline]
    pub(crate) fn sibling(self) -> Link<T> {
        let parent = self.parent()?;
        if parent.left() == Some(self) {
            parent.right()
        } else {
            parent.left()
        }
    }

    #[inline]
    pub(crate) fn uncle(self) -> Link<T> {
        self.parent()?.sibling()
    }

    #[inline]
    pub(crate) fn root(self) -> NodePtr<T> {
        algo::root(self)
    }

    #[inline]
    pub(crate) fn leftmost(self) -> NodePtr<T> {
        algo::leftmost(self)
    }

    #[inline]
    pub(crate) fn rightmost(self) -> NodePtr<T> {
        algo::rightmost(self)
    }

    #[inline]
    pub(crate) fn next(self) -> Link<T> {
        algo::next(self)
    }

    #[inline]
    pub(crate) fn prev(self) -> Link<T> {
        algo::prev(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leak(value: i32) -> NodePtr<i32> {
        NodePtr::from_non_null(NonNull::from(Box::leak(Box::new(Node::new(value)))))
    }

    unsafe fn free(node: NodePtr<i32>) {
        drop(Box::from_raw(node.as_ptr()))
    }

    #[test]
    fn packed_parent_color() {
        let parent = leak(1);
        let child = leak(2);
        assert!(child.is_red());
        assert_eq!(child.parent(), None);

        child.set_parent(Some(parent));
        assert_eq!(child.parent(), Some(parent));
        assert!(child.is_red());

        child.set_color(Color::Black);
        assert_eq!(child.parent(), Some(parent));
        assert!(child.is_black());

        child.set_parent(None);
        assert!(child.is_black());
        assert_eq!(child.parent(), None);
        unsafe {
            free(child);
            free(parent);
        }
    }

    #[test]
    fn family() {
        //       g
        //      / \
        //     p   u
        //    /
        //   n
        let g = leak(4);
        let p = leak(2);
        let u = leak(6);
        let n = leak(1);
        g.set_left(Some(p));
        g.set_right(Some(u));
        p.set_parent(Some(g));
        u.set_parent(Some(g));
        p.set_left(Some(n));
        n.set_parent(Some(p));

        assert!(p.is_left_child());
        assert!(!p.is_right_child());
        assert!(u.is_right_child());
        assert!(!g.is_left_child() && !g.is_right_child());
        assert_eq!(p.sibling(), Some(u));
        assert_eq!(u.sibling(), Some(p));
        assert_eq!(n.sibling(), None);
        assert_eq!(g.sibling(), None);
        assert_eq!(n.uncle(), Some(u));
        assert_eq!(p.uncle(), None);
        assert_eq!(n.root(), g);
        assert_eq!(g.leftmost(), n);
        assert_eq!(g.rightmost(), u);
        assert_eq!(n.next(), Some(p));
        assert_eq!(p.next(), Some(g));
        assert_eq!(g.next(), Some(u));
        assert_eq!(u.next(), None);
        assert_eq!(u.prev(), Some(g));
        assert_eq!(n.prev(), None);
        unsafe {
            free(n);
            free(u);
            free(p);
            free(g);
        }
    }
}
