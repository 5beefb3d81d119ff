// based off of https://en.wikipedia.org/wiki/Red%E2%80%93black_tree
//
// Stateless tree algorithms. Nothing in here keeps state between calls: every function receives
// the nodes it works on, and the comparator/allocator it needs, from the caller.

use crate::{
    alloc::Allocator,
    compare::{Compare, KeyOf},
    error::Error,
    node::{Color, Link, Node, NodePtr},
    stats,
};
use std::{alloc::Layout, mem, ptr::NonNull};

/// The side of a parent under which a new node would be linked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left,
    Right,
}

pub(crate) enum VacantLocation<T> {
    Empty,
    Left { parent: NodePtr<T> },
    Right { parent: NodePtr<T> },
}

impl<T> VacantLocation<T> {
    #[inline]
    fn new(parent: NodePtr<T>, dir: Dir) -> Self {
        match dir {
            Dir::Left => VacantLocation::Left { parent },
            Dir::Right => VacantLocation::Right { parent },
        }
    }
}

pub(crate) enum Location<T> {
    Vacant(VacantLocation<T>),
    Occupied { node: NodePtr<T> },
}

#[inline]
fn node_key<'a, T: 'a, X: KeyOf<T>>(node: NodePtr<T>) -> &'a X::Key {
    X::key_of(unsafe { node.value() })
}

#[inline]
pub(crate) fn root<T>(mut p: NodePtr<T>) -> NodePtr<T> {
    while let Some(parent) = p.parent() {
        p = parent
    }
    p
}

#[inline]
pub(crate) fn leftmost<T>(mut p: NodePtr<T>) -> NodePtr<T> {
    while let Some(left) = p.left() {
        p = left
    }
    p
}

#[inline]
pub(crate) fn rightmost<T>(mut p: NodePtr<T>) -> NodePtr<T> {
    while let Some(right) = p.right() {
        p = right
    }
    p
}

/// In-order successor, or `None` if `p` is the maximum.
pub(crate) fn next<T>(mut p: NodePtr<T>) -> Link<T> {
    if let Some(right) = p.right() {
        return Some(leftmost(right));
    }
    while p.is_right_child() {
        p = p.parent()?;
    }
    p.parent()
}

/// In-order predecessor, or `None` if `p` is the minimum.
pub(crate) fn prev<T>(mut p: NodePtr<T>) -> Link<T> {
    if let Some(left) = p.left() {
        return Some(rightmost(left));
    }
    while p.is_left_child() {
        p = p.parent()?;
    }
    p.parent()
}

// Makes `new` take the place of `old` under `old`'s parent, or at the root.
#[inline]
fn replace_child<T>(old: NodePtr<T>, new: NodePtr<T>, root: &mut Link<T>) {
    match old.parent() {
        None => *root = Some(new),
        Some(parent) => {
            if parent.left() == Some(old) {
                parent.set_left(Some(new))
            } else {
                parent.set_right(Some(new))
            }
        }
    }
    new.set_parent(old.parent());
}

//      p             r
//     / \           / \
//    x   r   =>    p   y
//       / \       / \
//      o   y     x   o
pub(crate) fn rotate_left<T>(p: NodePtr<T>, root: &mut Link<T>) {
    debug_assert!(p.right().is_some(), "rotate_left without a right child");
    let r = match p.right() {
        Some(r) => r,
        None => return,
    };
    let o = r.left();
    p.set_right(o);
    if let Some(o) = o {
        o.set_parent(Some(p));
    }
    replace_child(p, r, root);
    r.set_left(Some(p));
    p.set_parent(Some(r));
    stats::rotation();
}

//        p         l
//       / \       / \
//      l   y  => x   p
//     / \           / \
//    x   o         o   y
pub(crate) fn rotate_right<T>(p: NodePtr<T>, root: &mut Link<T>) {
    debug_assert!(p.left().is_some(), "rotate_right without a left child");
    let l = match p.left() {
        Some(l) => l,
        None => return,
    };
    let o = l.right();
    p.set_left(o);
    if let Some(o) = o {
        o.set_parent(Some(p));
    }
    replace_child(p, l, root);
    l.set_right(Some(p));
    p.set_parent(Some(l));
    stats::rotation();
}

/// Restores the red-black properties after `p`, a red node, was linked into the tree.
pub(crate) fn balance<T>(mut p: NodePtr<T>, root: &mut Link<T>) {
    let mut steps = 0;
    loop {
        let parent = match p.parent() {
            None => {
                // the root is always black
                p.set_color(Color::Black);
                break;
            }
            Some(parent) => parent,
        };
        if parent.is_black() {
            break;
        }
        let gp = match parent.parent() {
            // a red parent is never the root
            None => break,
            Some(gp) => gp,
        };
        match p.uncle() {
            Some(uncle) if uncle.is_red() => {
                // push the violation up to the grandparent
                parent.set_color(Color::Black);
                uncle.set_color(Color::Black);
                gp.set_color(Color::Red);
                p = gp;
                steps += 1;
            }
            _ => {
                let top = if parent.is_left_child() {
                    if p.is_right_child() {
                        rotate_left(parent, root);
                        rotate_right(gp, root);
                        p
                    } else {
                        rotate_right(gp, root);
                        parent
                    }
                } else if p.is_left_child() {
                    rotate_right(parent, root);
                    rotate_left(gp, root);
                    p
                } else {
                    rotate_left(gp, root);
                    parent
                };
                top.set_color(Color::Black);
                gp.set_color(Color::Red);
                break;
            }
        }
    }
    stats::balance_steps(steps);
}

/// Descends to the slot where the first element not less than `key` begins.
///
/// Returns the last node visited and the side on which the descent would continue. On `Left`, the
/// node itself is the lower bound; on `Right`, its successor is.
pub(crate) fn lower_bound<T, X, C>(mut p: NodePtr<T>, key: &X::Key, comp: &C) -> (NodePtr<T>, Dir)
where
    X: KeyOf<T>,
    C: Compare<X::Key> + ?Sized,
{
    loop {
        let (child, dir) = if !comp.less(node_key::<T, X>(p), key) {
            (p.left(), Dir::Left)
        } else {
            (p.right(), Dir::Right)
        };
        match child {
            Some(child) => p = child,
            None => return (p, dir),
        }
    }
}

/// Descends to the slot where the first element greater than `key` begins.
///
/// Same return convention as `lower_bound`.
pub(crate) fn upper_bound<T, X, C>(mut p: NodePtr<T>, key: &X::Key, comp: &C) -> (NodePtr<T>, Dir)
where
    X: KeyOf<T>,
    C: Compare<X::Key> + ?Sized,
{
    loop {
        let (child, dir) = if comp.less(key, node_key::<T, X>(p)) {
            (p.left(), Dir::Left)
        } else {
            (p.right(), Dir::Right)
        };
        match child {
            Some(child) => p = child,
            None => return (p, dir),
        }
    }
}

/// Finds where a value with `key` belongs.
///
/// Multi trees always insert at the upper bound, after every equivalent element. Unique trees
/// report an equivalent node as `Occupied`.
pub(crate) fn find_to_insert<T, X, C>(
    comp: &C,
    key: &X::Key,
    root: Link<T>,
    multi: bool,
) -> Location<T>
where
    X: KeyOf<T>,
    C: Compare<X::Key> + ?Sized,
{
    let mut p = match root {
        None => return Location::Vacant(VacantLocation::Empty),
        Some(root) => root,
    };
    if multi {
        let (parent, dir) = upper_bound::<T, X, C>(p, key, comp);
        return Location::Vacant(VacantLocation::new(parent, dir));
    }
    loop {
        let (child, dir) = if comp.less(key, node_key::<T, X>(p)) {
            (p.left(), Dir::Left)
        } else if comp.less(node_key::<T, X>(p), key) {
            (p.right(), Dir::Right)
        } else {
            return Location::Occupied { node: p };
        };
        match child {
            Some(child) => p = child,
            None => return Location::Vacant(VacantLocation::new(p, dir)),
        }
    }
}

/// Finds where a value with `key` belongs, trying the gap right before `hint` first.
///
/// `hint` of `None` means the end position. `first`/`last` are the tree's leftmost/rightmost
/// nodes. The gap is accepted when `key` sorts into it (`prev <= key < hint` for multi trees,
/// `prev < key < hint` for unique trees); the returned slot is then the same one `find_to_insert`
/// would have produced. Otherwise this falls back to `find_to_insert`.
pub(crate) fn find_to_insert_hint<T, X, C>(
    comp: &C,
    key: &X::Key,
    root: Link<T>,
    multi: bool,
    hint: Link<T>,
    first: Link<T>,
    last: Link<T>,
) -> Location<T>
where
    X: KeyOf<T>,
    C: Compare<X::Key> + ?Sized,
{
    let (first, last) = match (first, last) {
        (Some(first), Some(last)) => (first, last),
        _ => return Location::Vacant(VacantLocation::Empty),
    };
    // is `prev` ordered before `key`? multi trees accept equivalent keys after `prev`.
    let after = |prev: NodePtr<T>| {
        if multi {
            !comp.less(key, node_key::<T, X>(prev))
        } else {
            comp.less(node_key::<T, X>(prev), key)
        }
    };
    let accepted = match hint {
        None => {
            if after(last) {
                Some(VacantLocation::Right { parent: last })
            } else {
                None
            }
        }
        Some(hint) if hint == first => {
            if comp.less(key, node_key::<T, X>(hint)) {
                Some(VacantLocation::Left { parent: hint })
            } else {
                None
            }
        }
        Some(hint) => {
            if comp.less(key, node_key::<T, X>(hint)) {
                match hint.prev() {
                    Some(prev) if after(prev) => Some(match hint.left() {
                        // `prev` is the rightmost node of hint's left subtree
                        Some(_) => VacantLocation::Right { parent: prev },
                        // `prev` is an ancestor; its right slot is taken
                        None => VacantLocation::Left { parent: hint },
                    }),
                    _ => None,
                }
            } else {
                None
            }
        }
    };
    match accepted {
        Some(vacant) => {
            stats::hint_accepted();
            Location::Vacant(vacant)
        }
        None => {
            stats::hint_rejected();
            log::trace!("insertion hint rejected, falling back to a full search");
            find_to_insert::<T, X, C>(comp, key, root, multi)
        }
    }
}

/// Links the detached node `node` into `location` and rebalances.
pub(crate) fn link<T>(node: NodePtr<T>, location: VacantLocation<T>, root: &mut Link<T>) {
    debug_assert!(node.left().is_none() && node.right().is_none() && node.parent().is_none());
    debug_assert!(node.is_red());
    match location {
        VacantLocation::Empty => {
            debug_assert!(root.is_none());
            *root = Some(node);
        }
        VacantLocation::Left { parent } => {
            debug_assert!(parent.left().is_none());
            parent.set_left(Some(node));
            node.set_parent(Some(parent));
        }
        VacantLocation::Right { parent } => {
            debug_assert!(parent.right().is_none());
            parent.set_right(Some(node));
            node.set_parent(Some(parent));
        }
    }
    balance(node, root);
}

// Releases the node slot if the value constructor unwinds.
struct DeallocOnUnwind<'a, A: Allocator> {
    alloc:  &'a A,
    ptr:    NonNull<u8>,
    layout: Layout,
}

impl<'a, A: Allocator> Drop for DeallocOnUnwind<'a, A> {
    fn drop(&mut self) {
        unsafe { self.alloc.deallocate(self.ptr, self.layout) }
    }
}

/// Allocates one node slot, then constructs the value in place.
///
/// If `make` panics, the slot is deallocated before the panic continues.
pub(crate) fn construct_node<T, A, F>(alloc: &A, make: F) -> Result<NodePtr<T>, Error>
where
    A: Allocator,
    F: FnOnce() -> T,
{
    let layout = Layout::new::<Node<T>>();
    let raw = match alloc.allocate(layout) {
        Ok(raw) => raw.cast::<u8>(),
        Err(_) => {
            log::debug!("node allocation failed: {:?}", layout);
            return Err(Error::alloc_failed(layout));
        }
    };
    let guard = DeallocOnUnwind {
        alloc,
        ptr: raw,
        layout,
    };
    let value = make();
    mem::forget(guard);
    let raw = raw.cast::<Node<T>>();
    unsafe { raw.as_ptr().write(Node::new(value)) };
    Ok(NodePtr::from_non_null(raw))
}

/// Destroys the value of a detached node and deallocates it.
pub(crate) unsafe fn destruct_node<T, A: Allocator>(alloc: &A, p: NodePtr<T>) {
    let raw = p.as_non_null();
    raw.as_ptr().drop_in_place();
    alloc.deallocate(raw.cast(), Layout::new::<Node<T>>())
}

/// Owns a constructed node that is not linked into a tree yet.
///
/// Dropping the guard destroys the node, so a comparator that unwinds during the search does not
/// leak it. [`Detached::into_inner`] releases ownership once the node is about to be linked or
/// discarded.
pub(crate) struct Detached<'a, T, A: Allocator> {
    alloc: &'a A,
    node:  NodePtr<T>,
}

impl<'a, T, A: Allocator> Detached<'a, T, A> {
    #[inline]
    pub(crate) fn new(alloc: &'a A, node: NodePtr<T>) -> Self {
        Detached { alloc, node }
    }

    #[inline]
    pub(crate) fn node(&self) -> NodePtr<T> {
        self.node
    }

    #[inline]
    pub(crate) fn into_inner(self) -> NodePtr<T> {
        let node = self.node;
        mem::forget(self);
        node
    }
}

impl<'a, T, A: Allocator> Drop for Detached<'a, T, A> {
    fn drop(&mut self) {
        unsafe { destruct_node(self.alloc, self.node) }
    }
}

/// Destroys the subtree rooted at `p`, children before parents. Returns the number of nodes freed.
///
/// A panicking value destructor leaks the rest of the subtree.
pub(crate) unsafe fn clear<T, A: Allocator>(alloc: &A, p: Link<T>) -> usize {
    match p {
        None => 0,
        Some(p) => {
            let count = clear(alloc, p.left()) + clear(alloc, p.right()) + 1;
            destruct_node(alloc, p);
            count
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{alloc::Global, compare::Identity, Less};

    struct Scratch {
        root: Link<i32>,
    }

    impl Scratch {
        fn new() -> Self {
            Scratch { root: None }
        }

        fn insert(&mut self, value: i32) -> NodePtr<i32> {
            let node = construct_node(&Global, || value).unwrap();
            match find_to_insert::<i32, Identity, _>(&Less, &value, self.root, true) {
                Location::Vacant(vacant) => link(node, vacant, &mut self.root),
                Location::Occupied { .. } => unreachable!(),
            }
            node
        }

        fn values(&self) -> Vec<i32> {
            let mut out = Vec::new();
            let mut node = self.root.map(leftmost);
            while let Some(n) = node {
                out.push(unsafe { *n.value() });
                node = next(n);
            }
            out
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            unsafe { clear(&Global, self.root) };
        }
    }

    #[test]
    fn rotations_preserve_order() {
        let mut scratch = Scratch::new();
        for x in 0..3 {
            scratch.insert(x);
        }
        let root = scratch.root.unwrap();
        assert_eq!(unsafe { *root.value() }, 1);

        rotate_left(root, &mut scratch.root);
        let new_root = scratch.root.unwrap();
        assert_eq!(unsafe { *new_root.value() }, 2);
        assert_eq!(new_root.parent(), None);
        assert_eq!(scratch.values(), vec![0, 1, 2]);

        rotate_right(new_root, &mut scratch.root);
        assert_eq!(scratch.root, Some(root));
        assert_eq!(root.parent(), None);
        assert_eq!(scratch.values(), vec![0, 1, 2]);
    }

    #[test]
    fn bounds() {
        let mut scratch = Scratch::new();
        for &x in &[10, 20, 20, 30] {
            scratch.insert(x);
        }
        let root = scratch.root.unwrap();
        let resolve = |(node, dir): (NodePtr<i32>, Dir)| match dir {
            Dir::Left => Some(node),
            Dir::Right => next(node),
        }
        .map(|node| unsafe { *node.value() });

        assert_eq!(resolve(lower_bound::<_, Identity, _>(root, &20, &Less)), Some(20));
        assert_eq!(resolve(upper_bound::<_, Identity, _>(root, &20, &Less)), Some(30));
        assert_eq!(resolve(lower_bound::<_, Identity, _>(root, &5, &Less)), Some(10));
        assert_eq!(resolve(upper_bound::<_, Identity, _>(root, &30, &Less)), None);
        assert_eq!(resolve(lower_bound::<_, Identity, _>(root, &31, &Less)), None);
    }

    #[test]
    fn unique_search_finds_duplicates() {
        let mut scratch = Scratch::new();
        let five = scratch.insert(5);
        scratch.insert(3);
        match find_to_insert::<_, Identity, _>(&Less, &5, scratch.root, false) {
            Location::Occupied { node } => assert_eq!(node, five),
            Location::Vacant(_) => panic!("5 should be present"),
        }
        match find_to_insert::<_, Identity, _>(&Less, &4, scratch.root, false) {
            Location::Vacant(VacantLocation::Right { parent }) => {
                assert_eq!(unsafe { *parent.value() }, 3)
            }
            _ => panic!("4 belongs right of 3"),
        }
    }

    #[test]
    fn clear_counts_nodes() {
        let mut scratch = Scratch::new();
        for x in 0..17 {
            scratch.insert(x);
        }
        let root = scratch.root.take();
        assert_eq!(unsafe { clear(&Global, root) }, 17);
    }
}
