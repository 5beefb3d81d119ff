use crate::{
    algo::{self, Detached, Dir, Location, VacantLocation},
    alloc::{Allocator, Global},
    compare::{Compare, First, Identity, KeyOf},
    cursor::{Cursor, Handle, Iter},
    error::Error,
    node::{Link, NodePtr},
    stats,
    verify::{self, Verify},
};
use std::{
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    mem,
    sync::atomic::{AtomicU64, Ordering::Relaxed},
};

// 0 is reserved for trees without nodes
static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

#[inline]
fn next_stamp() -> u64 {
    NEXT_STAMP.fetch_add(1, Relaxed)
}

/// An ordered tree of `T`, keyed by `X::key_of`, with nodes allocated from `A`.
///
/// The tree is either unique (at most one element per equivalence class of keys) or multi
/// (equivalent elements are kept in insertion order). The mode is chosen at construction.
///
/// The ordering is not part of the type. Every search and insertion takes a comparator, and the
/// caller must pass an equivalent comparator to every call made on the same tree.
///
/// There is no removal of single elements; [`clear`](RBTree::clear) destroys everything at once.
pub struct RBTree<T, X = Identity, A: Allocator = Global> {
    root:      Link<T>,
    leftmost:  Link<T>,
    rightmost: Link<T>,
    len:       usize,
    multi:     bool,
    stamp:     u64,
    alloc:     A,
    phantom:   PhantomData<(Box<T>, fn() -> X)>,
}

unsafe impl<T: Send, X, A: Allocator + Send> Send for RBTree<T, X, A> {}
unsafe impl<T: Sync, X, A: Allocator + Sync> Sync for RBTree<T, X, A> {}

impl<T, X, A: Allocator> Drop for RBTree<T, X, A> {
    fn drop(&mut self) {
        self.clear()
    }
}

impl<T: Debug, X, A: Allocator> Debug for RBTree<T, X, A> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T, X, A: Allocator + Default> Default for RBTree<T, X, A> {
    #[inline]
    fn default() -> Self {
        Self::with_mode_in(false, A::default())
    }
}

impl<'a, T, X, A: Allocator> IntoIterator for &'a RBTree<T, X, A> {
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> RBTree<T> {
    /// An empty set-like tree that rejects duplicate keys.
    #[inline]
    pub const fn new() -> Self {
        Self::with_mode_in(false, Global)
    }

    /// An empty set-like tree that keeps duplicate keys.
    #[inline]
    pub const fn new_multi() -> Self {
        Self::with_mode_in(true, Global)
    }
}

impl<K, V> RBTree<(K, V), First> {
    /// An empty map-like tree of `(key, value)` pairs that rejects duplicate keys.
    #[inline]
    pub const fn new_map() -> Self {
        Self::with_mode_in(false, Global)
    }

    /// An empty map-like tree of `(key, value)` pairs that keeps duplicate keys.
    #[inline]
    pub const fn new_multimap() -> Self {
        Self::with_mode_in(true, Global)
    }
}

impl<T, A: Allocator> RBTree<T, Identity, A> {
    #[inline]
    pub const fn new_in(alloc: A) -> Self {
        Self::with_mode_in(false, alloc)
    }

    #[inline]
    pub const fn new_multi_in(alloc: A) -> Self {
        Self::with_mode_in(true, alloc)
    }
}

impl<T, X, A: Allocator> RBTree<T, X, A> {
    /// An empty tree with an explicit uniqueness mode and allocator.
    #[inline]
    pub const fn with_mode_in(multi: bool, alloc: A) -> Self {
        RBTree {
            root: None,
            leftmost: None,
            rightmost: None,
            len: 0,
            multi,
            stamp: 0,
            alloc,
            phantom: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_multi(&self) -> bool {
        self.multi
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub(crate) fn stamp(&self) -> u64 {
        self.stamp
    }

    #[inline]
    pub(crate) fn head(&self) -> Link<T> {
        self.leftmost
    }

    #[inline]
    pub(crate) fn tail(&self) -> Link<T> {
        self.rightmost
    }

    #[inline]
    fn handle(&self, node: NodePtr<T>) -> Handle<T> {
        Handle::new(self.stamp, Some(node))
    }

    /// A cursor at the smallest element, or at the end if the tree is empty.
    #[inline]
    pub fn begin(&self) -> Cursor<'_, T, X, A> {
        Cursor::new(self, self.leftmost)
    }

    #[inline]
    pub fn end(&self) -> Cursor<'_, T, X, A> {
        Cursor::new(self, None)
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.leftmost, None, self.rightmost)
    }

    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.leftmost.map(|node| unsafe { node.value() })
    }

    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.rightmost.map(|node| unsafe { node.value() })
    }

    /// The element a handle points at. Stale handles and end handles return `None`.
    #[inline]
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        handle.resolve(self.stamp).map(|node| unsafe { node.value() })
    }

    /// A cursor at the position of `handle`. Stale handles yield the end cursor.
    #[inline]
    pub fn cursor(&self, handle: Handle<T>) -> Cursor<'_, T, X, A> {
        Cursor::new(self, handle.resolve(self.stamp))
    }

    /// Destroys every element and releases every node. Invalidates all handles.
    pub fn clear(&mut self) {
        let root = self.root.take();
        self.leftmost = None;
        self.rightmost = None;
        self.len = 0;
        self.stamp = 0;
        let freed = unsafe { algo::clear(&self.alloc, root) };
        if freed > 0 {
            stats::cleared_nodes(freed);
            log::debug!("cleared {} tree nodes", freed);
        }
    }

    /// Exchanges the contents of two trees, including their modes and allocators.
    ///
    /// Handles keep following their elements into the other tree.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other)
    }

    /// Moves the contents out, leaving an empty tree with the same mode and a clone of the
    /// allocator.
    #[inline]
    pub fn take(&mut self) -> Self
    where
        A: Clone,
    {
        let empty = Self::with_mode_in(self.multi, self.alloc.clone());
        mem::replace(self, empty)
    }

    fn insert_node(&mut self, node: NodePtr<T>, location: VacantLocation<T>) {
        match &location {
            VacantLocation::Empty => {
                self.leftmost = Some(node);
                self.rightmost = Some(node);
                self.stamp = next_stamp();
            }
            VacantLocation::Left { parent } => {
                if self.leftmost == Some(*parent) {
                    self.leftmost = Some(node)
                }
            }
            VacantLocation::Right { parent } => {
                if self.rightmost == Some(*parent) {
                    self.rightmost = Some(node)
                }
            }
        }
        algo::link(node, location, &mut self.root);
        self.len += 1;
    }

    // allocates only when `location` is vacant
    fn insert_at<F>(&mut self, location: Location<T>, make: F) -> Result<(Handle<T>, bool), Error>
    where
        F: FnOnce() -> T,
    {
        match location {
            Location::Occupied { node } => Ok((self.handle(node), false)),
            Location::Vacant(vacant) => {
                let node = algo::construct_node(&self.alloc, make)?;
                self.insert_node(node, vacant);
                Ok((self.handle(node), true))
            }
        }
    }

    fn insert_or_discard(&mut self, node: NodePtr<T>, location: Location<T>) -> (Handle<T>, bool) {
        match location {
            Location::Occupied { node: existing } => {
                unsafe { algo::destruct_node(&self.alloc, node) };
                stats::speculative_discard();
                log::trace!("discarded a constructed value whose key is already present");
                (self.handle(existing), false)
            }
            Location::Vacant(vacant) => {
                self.insert_node(node, vacant);
                (self.handle(node), true)
            }
        }
    }
}

impl<T, X: KeyOf<T>, A: Allocator> RBTree<T, X, A> {
    fn lower_bound_node<C>(&self, comp: &C, key: &X::Key) -> Link<T>
    where
        C: Compare<X::Key> + ?Sized,
    {
        match algo::lower_bound::<T, X, C>(self.root?, key, comp) {
            (node, Dir::Left) => Some(node),
            (node, Dir::Right) => node.next(),
        }
    }

    fn upper_bound_node<C>(&self, comp: &C, key: &X::Key) -> Link<T>
    where
        C: Compare<X::Key> + ?Sized,
    {
        match algo::upper_bound::<T, X, C>(self.root?, key, comp) {
            (node, Dir::Left) => Some(node),
            (node, Dir::Right) => node.next(),
        }
    }

    fn find_node<C>(&self, comp: &C, key: &X::Key) -> Link<T>
    where
        C: Compare<X::Key> + ?Sized,
    {
        self.lower_bound_node(comp, key)
            .filter(|node| !comp.less(key, X::key_of(unsafe { node.value() })))
    }

    /// A cursor at the first element not ordered before `key`.
    pub fn lower_bound<C>(&self, comp: &C, key: &X::Key) -> Cursor<'_, T, X, A>
    where
        C: Compare<X::Key> + ?Sized,
    {
        Cursor::new(self, self.lower_bound_node(comp, key))
    }

    /// A cursor at the first element ordered after `key`.
    pub fn upper_bound<C>(&self, comp: &C, key: &X::Key) -> Cursor<'_, T, X, A>
    where
        C: Compare<X::Key> + ?Sized,
    {
        Cursor::new(self, self.upper_bound_node(comp, key))
    }

    /// The half open range of elements equivalent to `key`.
    pub fn equal_range<C>(&self, comp: &C, key: &X::Key) -> (Cursor<'_, T, X, A>, Cursor<'_, T, X, A>)
    where
        C: Compare<X::Key> + ?Sized,
    {
        (self.lower_bound(comp, key), self.upper_bound(comp, key))
    }

    /// A cursor at the first element equivalent to `key`, or the end cursor.
    pub fn find<C>(&self, comp: &C, key: &X::Key) -> Cursor<'_, T, X, A>
    where
        C: Compare<X::Key> + ?Sized,
    {
        Cursor::new(self, self.find_node(comp, key))
    }

    pub fn contains<C>(&self, comp: &C, key: &X::Key) -> bool
    where
        C: Compare<X::Key> + ?Sized,
    {
        self.find_node(comp, key).is_some()
    }

    pub fn count<C>(&self, comp: &C, key: &X::Key) -> usize
    where
        C: Compare<X::Key> + ?Sized,
    {
        if self.multi {
            let (lo, hi) = self.equal_range(comp, key);
            lo.iter_until(&hi).count()
        } else {
            self.contains(comp, key) as usize
        }
    }

    /// Inserts `value`.
    ///
    /// The key is probed before anything is allocated, so a duplicate in a unique tree costs no
    /// allocation; the rejected `value` is dropped. Returns a handle to the inserted element, or to
    /// the element that blocked the insertion, and whether an insertion happened.
    ///
    /// ```
    /// use redblack::{Less, RBTree};
    ///
    /// let mut tree = RBTree::new();
    /// let (three, inserted) = tree.emplace(&Less, 3).unwrap();
    /// assert!(inserted);
    /// let (again, inserted) = tree.emplace(&Less, 3).unwrap();
    /// assert!(!inserted);
    /// assert_eq!(three, again);
    /// assert_eq!(tree.len(), 1);
    /// ```
    pub fn emplace<C>(&mut self, comp: &C, value: T) -> Result<(Handle<T>, bool), Error>
    where
        C: Compare<X::Key> + ?Sized,
    {
        let location =
            algo::find_to_insert::<T, X, C>(comp, X::key_of(&value), self.root, self.multi);
        self.insert_at(location, move || value)
    }

    /// Inserts the value built by `make`.
    ///
    /// The value is built inside a freshly allocated node before the tree is searched, so a
    /// duplicate in a unique tree costs one allocation, and the duplicate is destroyed again
    /// immediately. This is the simple construct-then-probe policy. Prefer [`emplace`] or
    /// [`try_emplace`] when the key is at hand.
    ///
    /// [`emplace`]: RBTree::emplace
    /// [`try_emplace`]: RBTree::try_emplace
    pub fn emplace_with<C, F>(&mut self, comp: &C, make: F) -> Result<(Handle<T>, bool), Error>
    where
        C: Compare<X::Key> + ?Sized,
        F: FnOnce() -> T,
    {
        let node = algo::construct_node(&self.alloc, make)?;
        let detached = Detached::new(&self.alloc, node);
        let key = X::key_of(unsafe { detached.node().value() });
        let location = algo::find_to_insert::<T, X, C>(comp, key, self.root, self.multi);
        let node = detached.into_inner();
        Ok(self.insert_or_discard(node, location))
    }

    /// Inserts `make(key)` if no element equivalent to `key` is present (or the tree is multi).
    ///
    /// `make` runs only when an insertion happens, and must return a value whose key is equivalent
    /// to `key`.
    pub fn try_emplace<C, F>(
        &mut self,
        comp: &C,
        key: X::Key,
        make: F,
    ) -> Result<(Handle<T>, bool), Error>
    where
        X::Key: Sized,
        C: Compare<X::Key> + ?Sized,
        F: FnOnce(X::Key) -> T,
    {
        let location = algo::find_to_insert::<T, X, C>(comp, &key, self.root, self.multi);
        self.insert_at(location, move || make(key))
    }

    fn find_to_insert_hint<C>(&self, comp: &C, key: &X::Key, hint: Handle<T>) -> Location<T>
    where
        C: Compare<X::Key> + ?Sized,
    {
        algo::find_to_insert_hint::<T, X, C>(
            comp,
            key,
            self.root,
            self.multi,
            hint.resolve(self.stamp),
            self.leftmost,
            self.rightmost,
        )
    }

    /// Like [`emplace`](RBTree::emplace), but first tries the position right before `hint`.
    ///
    /// A correct hint saves the search from the root. A wrong or stale hint costs at most two
    /// extra comparisons; the element ends up in the same place either way.
    ///
    /// ```
    /// use redblack::{Less, RBTree};
    ///
    /// let mut tree = RBTree::new();
    /// for x in 0..100 {
    ///     let end = tree.end().handle();
    ///     tree.emplace_hint(&Less, end, x).unwrap();
    /// }
    /// assert!(tree.iter().copied().eq(0..100));
    /// ```
    pub fn emplace_hint<C>(
        &mut self,
        comp: &C,
        hint: Handle<T>,
        value: T,
    ) -> Result<(Handle<T>, bool), Error>
    where
        C: Compare<X::Key> + ?Sized,
    {
        let location = self.find_to_insert_hint(comp, X::key_of(&value), hint);
        self.insert_at(location, move || value)
    }

    /// Like [`emplace_with`](RBTree::emplace_with), but first tries the position right before
    /// `hint`.
    pub fn emplace_hint_with<C, F>(
        &mut self,
        comp: &C,
        hint: Handle<T>,
        make: F,
    ) -> Result<(Handle<T>, bool), Error>
    where
        C: Compare<X::Key> + ?Sized,
        F: FnOnce() -> T,
    {
        let node = algo::construct_node(&self.alloc, make)?;
        let detached = Detached::new(&self.alloc, node);
        let key = X::key_of(unsafe { detached.node().value() });
        let location = self.find_to_insert_hint(comp, key, hint);
        let node = detached.into_inner();
        Ok(self.insert_or_discard(node, location))
    }

    /// Like [`try_emplace`](RBTree::try_emplace), but first tries the position right before
    /// `hint`.
    pub fn try_emplace_hint<C, F>(
        &mut self,
        comp: &C,
        hint: Handle<T>,
        key: X::Key,
        make: F,
    ) -> Result<(Handle<T>, bool), Error>
    where
        X::Key: Sized,
        C: Compare<X::Key> + ?Sized,
        F: FnOnce(X::Key) -> T,
    {
        let location = self.find_to_insert_hint(comp, &key, hint);
        self.insert_at(location, move || make(key))
    }

    /// Emplaces every value of `iter` in order. Returns the number of values inserted.
    ///
    /// On error, the values inserted before the failure stay in the tree.
    pub fn insert_range<C, I>(&mut self, comp: &C, iter: I) -> Result<usize, Error>
    where
        C: Compare<X::Key> + ?Sized,
        I: IntoIterator<Item = T>,
    {
        let mut inserted = 0;
        for value in iter {
            if self.emplace(comp, value)?.1 {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Checks every structural invariant of the tree, panicking on the first violation.
    ///
    /// `comp` must be the ordering the tree was built with.
    pub fn verify<C>(&self, comp: &C) -> Verify
    where
        C: Compare<X::Key> + ?Sized,
    {
        let result = verify::subtree::<T, X, C>(self.root, comp, self.multi);
        match self.root {
            None => {
                assert!(self.leftmost.is_none() && self.rightmost.is_none());
                assert_eq!(self.stamp, 0);
            }
            Some(root) => {
                assert!(root.is_black(), "red root");
                assert!(root.parent().is_none(), "root has a parent");
                assert_eq!(root.rightmost().root(), root);
                assert_eq!(self.leftmost, Some(root.leftmost()));
                assert_eq!(self.rightmost, Some(root.rightmost()));
                assert_ne!(self.stamp, 0);
            }
        }
        assert_eq!(result.len, self.len);
        result
    }
}
