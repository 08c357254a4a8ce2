//! [`OrderedTree`] specialized to lexicographically-compared composite keys.

use super::compare::{Comparator, LexicographicComparator, NaturalOrder};
use super::ordered::{OrderedTree, RankError};
use std::fmt;

/// A persistent weight-balanced map keyed by `(first, second)` pairs
/// compared lexicographically: first components first, second components
/// break ties.
///
/// This is [`OrderedTree`] under a [`LexicographicComparator`]; the pair
/// families share one node algebra and balance discipline.
///
/// # Examples
///
/// ```rust
/// use balsa::tree::PairKeyTree;
///
/// let tree = PairKeyTree::new()
///     .insert("row", 2, "b")
///     .insert("row", 1, "a")
///     .insert("col", 9, "c");
///
/// assert_eq!(tree.get(&"row", &1), Some(&"a"));
/// // "col" sorts before "row", so it holds rank 0.
/// assert_eq!(tree.index_of(&"col", &9), 0);
/// ```
pub struct PairKeyTree<A, B, V, CA = NaturalOrder, CB = NaturalOrder> {
    inner: OrderedTree<(A, B), V, LexicographicComparator<CA, CB>>,
}

impl<A, B, V, CA: Clone, CB: Clone> Clone for PairKeyTree<A, B, V, CA, CB> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A, B, V, CA: Default, CB: Default> PairKeyTree<A, B, V, CA, CB> {
    /// Creates a new empty tree with the default component comparators.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: OrderedTree::new(),
        }
    }
}

impl<A, B, V, CA, CB> PairKeyTree<A, B, V, CA, CB> {
    /// Creates a new empty tree from two component comparators.
    #[must_use]
    pub const fn with_comparators(first: CA, second: CB) -> Self {
        Self {
            inner: OrderedTree::with_comparator(LexicographicComparator::new(first, second)),
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

    /// Returns an iterator over `((first, second), value)` entries in
    /// lexicographic key order.
    pub fn iter(&self) -> impl Iterator<Item = ((&A, &B), &V)> {
        self.inner.iter().map(|(key, value)| ((&key.0, &key.1), value))
    }
}

impl<A, B, V, CA, CB> PairKeyTree<A, B, V, CA, CB>
where
    A: Clone,
    B: Clone,
    CA: Comparator<A>,
    CB: Comparator<B>,
{
    /// Looks up the value stored under the composite key.
    #[must_use]
    pub fn get(&self, first: &A, second: &B) -> Option<&V> {
        self.inner.get(&(first.clone(), second.clone()))
    }

    /// Returns `true` if the composite key is present.
    #[must_use]
    pub fn contains_key(&self, first: &A, second: &B) -> bool {
        self.get(first, second).is_some()
    }

    /// Returns the rank of the composite key if present, else the bitwise
    /// complement of its insertion rank.
    #[must_use]
    pub fn index_of(&self, first: &A, second: &B) -> isize {
        self.inner.index_of(&(first.clone(), second.clone()))
    }

    /// Returns the entry of the given rank.
    ///
    /// # Errors
    ///
    /// [`RankError`] when `rank` is not in `[0, len)`.
    pub fn get_by_rank(&self, rank: usize) -> Result<((&A, &B), &V), RankError> {
        self.inner
            .get_by_rank(rank)
            .map(|(key, value)| ((&key.0, &key.1), value))
    }

    /// Returns the entry with the minimum composite key.
    #[must_use]
    pub fn min(&self) -> Option<((&A, &B), &V)> {
        self.inner.min().map(|(key, value)| ((&key.0, &key.1), value))
    }

    /// Returns the entry with the maximum composite key.
    #[must_use]
    pub fn max(&self) -> Option<((&A, &B), &V)> {
        self.inner.max().map(|(key, value)| ((&key.0, &key.1), value))
    }

    /// Re-verifies the tree invariants; panics on violation. For tests.
    pub fn check_invariants(&self) {
        self.inner.check_invariants();
    }
}

impl<A, B, V, CA, CB> PairKeyTree<A, B, V, CA, CB>
where
    A: Clone,
    B: Clone,
    V: Clone,
    CA: Comparator<A> + Clone,
    CB: Comparator<B> + Clone,
{
    /// Inserts or replaces an entry, returning the new tree and any
    /// displaced value.
    #[must_use]
    pub fn put(&self, first: A, second: B, value: V) -> (Self, Option<V>) {
        let (inner, displaced) = self.inner.put((first, second), value);
        (Self { inner }, displaced)
    }

    /// Inserts or replaces an entry, discarding any displaced value.
    #[must_use]
    pub fn insert(&self, first: A, second: B, value: V) -> Self {
        self.put(first, second, value).0
    }

    /// Removes the composite key, returning the new tree.
    #[must_use]
    pub fn remove(&self, first: &A, second: &B) -> Self {
        Self {
            inner: self.inner.remove(&(first.clone(), second.clone())),
        }
    }
}

impl<A, B, V, CA: Default, CB: Default> Default for PairKeyTree<A, B, V, CA, CB> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<A, B, V, CA, CB> PartialEq for PairKeyTree<A, B, V, CA, CB>
where
    V: PartialEq,
    CA: Comparator<A>,
    CB: Comparator<B>,
{
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<A, B, V, CA, CB> Eq for PairKeyTree<A, B, V, CA, CB>
where
    V: Eq,
    CA: Comparator<A>,
    CB: Comparator<B>,
{
}

impl<A: fmt::Debug, B: fmt::Debug, V: fmt::Debug, CA, CB> fmt::Debug
    for PairKeyTree<A, B, V, CA, CB>
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(formatter)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_lexicographic_ordering() {
        let tree: PairKeyTree<i32, i32, &str> = PairKeyTree::new()
            .insert(2, 0, "c")
            .insert(1, 9, "b")
            .insert(1, 1, "a");
        let keys: Vec<(i32, i32)> = tree.iter().map(|((a, b), _)| (*a, *b)).collect();
        assert_eq!(keys, vec![(1, 1), (1, 9), (2, 0)]);
        tree.check_invariants();
    }

    #[rstest]
    fn test_second_component_breaks_ties() {
        let tree: PairKeyTree<&str, i32, i32> = PairKeyTree::new().insert("k", 1, 10).insert("k", 2, 20);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(&"k", &1), Some(&10));
        assert_eq!(tree.get(&"k", &2), Some(&20));
        assert_eq!(tree.index_of(&"k", &1), 0);
    }

    #[rstest]
    fn test_put_replaces_full_composite_match() {
        let tree: PairKeyTree<i32, i32, &str> = PairKeyTree::new().insert(1, 1, "old");
        let (updated, displaced) = tree.put(1, 1, "new");
        assert_eq!(displaced, Some("old"));
        assert_eq!(updated.len(), 1);
    }

    #[rstest]
    fn test_remove_and_rank() {
        let tree: PairKeyTree<i32, i32, &str> = PairKeyTree::new()
            .insert(1, 1, "a")
            .insert(1, 2, "b")
            .insert(2, 1, "c");
        let shrunk = tree.remove(&1, &2);
        assert_eq!(shrunk.len(), 2);
        assert_eq!(shrunk.get_by_rank(1).unwrap(), ((&2, &1), &"c"));
        assert!(shrunk.get_by_rank(2).is_err());
    }
}
