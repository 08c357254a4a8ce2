//! [`OrderedTree`] variant storing two payload values per key.
//!
//! [`DualValueTree`] is the storage substrate for
//! [`BoundingMap`](crate::lattice::BoundingMap): each key carries a pair of
//! payloads that are always read and written together. It is not a
//! general-purpose two-value map — nothing else in the crate stores through
//! it.

use super::compare::{Comparator, NaturalOrder};
use super::ordered::OrderedTree;
use std::fmt;

/// A persistent weight-balanced map whose entries hold two payload values.
///
/// Same node algebra, balance discipline, and O(1) snapshot behavior as
/// [`OrderedTree`]; `put` upserts both components together and `get`
/// returns the pair.
///
/// # Examples
///
/// ```rust
/// use balsa::tree::DualValueTree;
///
/// let tree = DualValueTree::new().insert("x", 0, 15);
/// assert_eq!(tree.get(&"x"), Some((&0, &15)));
/// assert_eq!(tree.get_second(&"x"), Some(&15));
/// ```
pub struct DualValueTree<K, A, B, C = NaturalOrder> {
    inner: OrderedTree<K, (A, B), C>,
}

impl<K, A, B, C: Clone> Clone for DualValueTree<K, A, B, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, A, B, C: Default> DualValueTree<K, A, B, C> {
    /// Creates a new empty tree with the default comparator.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: OrderedTree::new(),
        }
    }
}

impl<K, A, B, C> DualValueTree<K, A, B, C> {
    /// Creates a new empty tree ordered by the supplied comparator.
    #[inline]
    #[must_use]
    pub const fn with_comparator(comparator: C) -> Self {
        Self {
            inner: OrderedTree::with_comparator(comparator),
        }
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the tree contains no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over `(key, first, second)` triples in ascending
    /// key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &A, &B)> {
        self.inner
            .iter()
            .map(|(key, pair)| (key, &pair.0, &pair.1))
    }
}

impl<K, A, B, C: Comparator<K>> DualValueTree<K, A, B, C> {
    /// Looks up both payloads stored under `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<(&A, &B)> {
        self.inner.get(key).map(|pair| (&pair.0, &pair.1))
    }

    /// Looks up the first payload stored under `key`.
    #[must_use]
    pub fn get_first(&self, key: &K) -> Option<&A> {
        self.inner.get(key).map(|pair| &pair.0)
    }

    /// Looks up the second payload stored under `key`.
    #[must_use]
    pub fn get_second(&self, key: &K) -> Option<&B> {
        self.inner.get(key).map(|pair| &pair.1)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    /// Returns the entry with the minimum key.
    #[must_use]
    pub fn min(&self) -> Option<(&K, &A, &B)> {
        self.inner.min().map(|(key, pair)| (key, &pair.0, &pair.1))
    }

    /// Returns the entry with the maximum key.
    #[must_use]
    pub fn max(&self) -> Option<(&K, &A, &B)> {
        self.inner.max().map(|(key, pair)| (key, &pair.0, &pair.1))
    }

    /// Re-verifies the tree invariants; panics on violation. For tests.
    pub fn check_invariants(&self) {
        self.inner.check_invariants();
    }
}

impl<K, A, B, C> DualValueTree<K, A, B, C>
where
    K: Clone,
    A: Clone,
    B: Clone,
    C: Comparator<K> + Clone,
{
    /// Inserts or replaces both payloads under `key`, returning the new
    /// tree and any displaced pair.
    #[must_use]
    pub fn put(&self, key: K, first: A, second: B) -> (Self, Option<(A, B)>) {
        let (inner, displaced) = self.inner.put(key, (first, second));
        (Self { inner }, displaced)
    }

    /// Inserts or replaces both payloads, discarding any displaced pair.
    #[must_use]
    pub fn insert(&self, key: K, first: A, second: B) -> Self {
        self.put(key, first, second).0
    }

    /// Removes `key`, returning the new tree.
    #[must_use]
    pub fn remove(&self, key: &K) -> Self {
        Self {
            inner: self.inner.remove(key),
        }
    }
}

impl<K, A, B, C: Default> Default for DualValueTree<K, A, B, C> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K, A, B, C> PartialEq for DualValueTree<K, A, B, C>
where
    A: PartialEq,
    B: PartialEq,
    C: Comparator<K>,
{
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<K, A, B, C> Eq for DualValueTree<K, A, B, C>
where
    A: Eq,
    B: Eq,
    C: Comparator<K>,
{
}

impl<K: fmt::Debug, A: fmt::Debug, B: fmt::Debug, C> fmt::Debug for DualValueTree<K, A, B, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(formatter)
    }
}

// =============================================================================
// Tests
// =============================================================================
