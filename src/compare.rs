//! Ordering and key projection capabilities.
//!
//! The tree never stores a comparator. Every lookup and insertion receives one by reference, so a
//! comparator must be pure: the same pair of keys always compares the same way.

use std::fmt::{self, Debug, Formatter};

/// A strict weak ordering over keys.
///
/// `less` must be irreflexive and transitive. Two keys are equivalent when neither is less than the
/// other.
///
/// Any `Fn(&K, &K) -> bool` is a comparator:
/// ```
/// use redblack::{Compare, Less};
///
/// let by_len = |a: &&str, b: &&str| a.len() < b.len();
/// assert!(by_len.less(&"ab", &"abc"));
/// assert!(Less.less(&1, &2));
/// ```
pub trait Compare<K: ?Sized> {
    /// Returns `true` if `lhs` is ordered strictly before `rhs`.
    fn less(&self, lhs: &K, rhs: &K) -> bool;
}

impl<K: ?Sized, F> Compare<K> for F
where
    F: Fn(&K, &K) -> bool,
{
    #[inline]
    fn less(&self, lhs: &K, rhs: &K) -> bool {
        self(lhs, rhs)
    }
}

/// Ascending order using `Ord`.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct Less;

impl<K: Ord + ?Sized> Compare<K> for Less {
    #[inline]
    fn less(&self, lhs: &K, rhs: &K) -> bool {
        lhs < rhs
    }
}

/// Descending order using `Ord`.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct Greater;

impl<K: Ord + ?Sized> Compare<K> for Greater {
    #[inline]
    fn less(&self, lhs: &K, rhs: &K) -> bool {
        rhs < lhs
    }
}

/// Projects the key out of a stored value.
pub trait KeyOf<T> {
    type Key: ?Sized;

    fn key_of(value: &T) -> &Self::Key;
}

/// The whole value is the key. Used for set-like trees.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct Identity;

impl<T> KeyOf<T> for Identity {
    type Key = T;

    #[inline]
    fn key_of(value: &T) -> &T {
        value
    }
}

impl Debug for Identity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.pad("Identity")
    }
}

/// The first element of a pair is the key. Used for map-like trees.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct First;

impl<K, V> KeyOf<(K, V)> for First {
    type Key = K;

    #[inline]
    fn key_of(value: &(K, V)) -> &K {
        &value.0
    }
}

impl Debug for First {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.pad("First")
    }
}
