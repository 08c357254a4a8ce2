//! [`OrderedTree`](crate::tree::OrderedTree) variant with canonicalized
//! lookup keys.
//!
//! An [`EquivalenceTree`] separates the type callers look up with from the
//! type the tree stores: an injected [`EquivalenceResolver`] translates a
//! lookup key into its canonical form on first insert, and any later lookup
//! that compares equal under the resolver hits the same node. The classic
//! use is denotation-equivalent spellings — `"5"` and `"05"` name one
//! entity — where the tree must hold a single entry no matter which
//! spelling arrives first.
//!
//! The rebalancing algebra is shared with the key/value families.

use super::compare::Comparator;
use super::ordered::{
    self, Link, Node, OrderedTreeIterator, rebalance_left_heavy, rebalance_right_heavy, share,
};
use std::cmp::Ordering;
use std::fmt;

/// Strategy connecting a lookup key type to its canonical stored form.
///
/// All four operations must agree: `compare(l, translate(l)) == Equal` for
/// every lookup key, and the three orderings must be mutually consistent
/// total orders over the equivalence classes they see.
///
/// # Examples
///
/// ```rust
/// use balsa::tree::{EquivalenceResolver, EquivalenceTree};
/// use std::cmp::Ordering;
///
/// /// Decimal spellings canonicalized to their numeric value, so "5" and
/// /// "05" denote one entity.
/// #[derive(Clone, Copy, Default)]
/// struct Decimal;
///
/// impl EquivalenceResolver for Decimal {
///     type Lookup = &'static str;
///     type Canonical = u64;
///
///     fn compare(&self, lookup: &&'static str, canonical: &u64) -> Ordering {
///         self.translate(lookup).cmp(canonical)
///     }
///
///     fn compare_canonical(&self, a: &u64, b: &u64) -> Ordering {
///         a.cmp(b)
///     }
///
///     fn compare_lookup(&self, a: &&'static str, b: &&'static str) -> Ordering {
///         self.translate(a).cmp(&self.translate(b))
///     }
///
///     fn translate(&self, lookup: &&'static str) -> u64 {
///         lookup.parse().unwrap_or(0)
///     }
/// }
///
/// let tree = EquivalenceTree::new(Decimal).insert(&"05", "five");
/// assert_eq!(tree.get(&"5"), Some(&"five"));
/// assert_eq!(tree.len(), 1);
/// ```
pub trait EquivalenceResolver {
    /// The type callers present.
    type Lookup;
    /// The type the tree stores.
    type Canonical;

    /// Compares a lookup key against a stored canonical key.
    fn compare(&self, lookup: &Self::Lookup, canonical: &Self::Canonical) -> Ordering;

    /// Compares two canonical keys.
    fn compare_canonical(&self, a: &Self::Canonical, b: &Self::Canonical) -> Ordering;

    /// Compares two lookup keys.
    fn compare_lookup(&self, a: &Self::Lookup, b: &Self::Lookup) -> Ordering;

    /// Produces the canonical form stored for a lookup key.
    fn translate(&self, lookup: &Self::Lookup) -> Self::Canonical;
}

/// Adapts a resolver's canonical ordering to the [`Comparator`] seam so the
/// shared validator can walk the tree.
struct CanonicalOrder<'a, R>(&'a R);

impl<R: EquivalenceResolver> Comparator<R::Canonical> for CanonicalOrder<'_, R> {
    fn compare(&self, a: &R::Canonical, b: &R::Canonical) -> Ordering {
        self.0.compare_canonical(a, b)
    }
}

/// An in-order iterator over `(canonical key, value)` entries of an
/// [`EquivalenceTree`].
pub type EquivalenceTreeIterator<'a, C, V> = OrderedTreeIterator<'a, C, V>;

// =============================================================================
// Recursive Node Operations
// =============================================================================

fn put_node<R, V>(
    link: &Link<R::Canonical, V>,
    resolver: &R,
    lookup: &R::Lookup,
    value: V,
) -> (Node<R::Canonical, V>, Option<V>)
where
    R: EquivalenceResolver,
    R::Canonical: Clone,
    V: Clone,
{
    match link {
        None => (Node::leaf(resolver.translate(lookup), value), None),
        Some(node) => match resolver.compare(lookup, &node.key) {
            Ordering::Less => {
                let (new_left, displaced) = put_node(&node.left, resolver, lookup, value);
                let rebuilt = Node::branch(
                    node.key.clone(),
                    node.value.clone(),
                    share(new_left),
                    node.right.clone(),
                );
                (rebalance_left_heavy(rebuilt), displaced)
            }
            Ordering::Greater => {
                let (new_right, displaced) = put_node(&node.right, resolver, lookup, value);
                let rebuilt = Node::branch(
                    node.key.clone(),
                    node.value.clone(),
                    node.left.clone(),
                    share(new_right),
                );
                (rebalance_right_heavy(rebuilt), displaced)
            }
            Ordering::Equal => {
                // An equivalent key is already stored: keep its canonical
                // form, replace the value.
                let replaced = Node {
                    key: node.key.clone(),
                    value,
                    weight: node.weight,
                    left: node.left.clone(),
                    right: node.right.clone(),
                };
                (replaced, Some(node.value.clone()))
            }
        },
    }
}

fn remove_node<R, V>(
    link: &Link<R::Canonical, V>,
    resolver: &R,
    lookup: &R::Lookup,
) -> (Link<R::Canonical, V>, Option<V>)
where
    R: EquivalenceResolver,
    R::Canonical: Clone,
    V: Clone,
{
    match link {
        None => (None, None),
        Some(node) => match resolver.compare(lookup, &node.key) {
            Ordering::Less => {
                let (new_left, removed) = remove_node(&node.left, resolver, lookup);
                if removed.is_none() {
                    return (Some(node.clone()), None);
                }
                let rebuilt = Node::branch(
                    node.key.clone(),
                    node.value.clone(),
                    new_left,
                    node.right.clone(),
                );
                (share(rebalance_right_heavy(rebuilt)), removed)
            }
            Ordering::Greater => {
                let (new_right, removed) = remove_node(&node.right, resolver, lookup);
                if removed.is_none() {
                    return (Some(node.clone()), None);
                }
                let rebuilt = Node::branch(
                    node.key.clone(),
                    node.value.clone(),
                    node.left.clone(),
                    new_right,
                );
                (share(rebalance_left_heavy(rebuilt)), removed)
            }
            Ordering::Equal => (ordered::remove_root(node), Some(node.value.clone())),
        },
    }
}

// =============================================================================
// EquivalenceTree Definition
// =============================================================================

/// A persistent weight-balanced map whose lookup keys are canonicalized
/// through an [`EquivalenceResolver`] before storage and comparison.
///
/// Handles are cheap values with O(1) clone; all mutation returns a new
/// handle, exactly as [`OrderedTree`](crate::tree::OrderedTree).
pub struct EquivalenceTree<R: EquivalenceResolver, V> {
    root: Link<R::Canonical, V>,
    resolver: R,
}

impl<R: EquivalenceResolver + Clone, V> Clone for EquivalenceTree<R, V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

impl<R: EquivalenceResolver, V> EquivalenceTree<R, V> {
    /// Creates a new empty tree using the supplied resolver.
    #[must_use]
    pub const fn new(resolver: R) -> Self {
        Self {
            root: None,
            resolver,
        }
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        ordered::weight(&self.root)
    }

    /// Returns `true` if the tree contains no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the resolver this tree canonicalizes through.
    #[inline]
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Looks up the value stored for any key equivalent to `lookup`.
    #[must_use]
    pub fn get(&self, lookup: &R::Lookup) -> Option<&V> {
        self.find(lookup).map(|node| &node.value)
    }

    /// Looks up the canonical key stored for `lookup`.
    #[must_use]
    pub fn get_canonical(&self, lookup: &R::Lookup) -> Option<&R::Canonical> {
        self.find(lookup).map(|node| &node.key)
    }

    /// Returns `true` if any key equivalent to `lookup` is present.
    #[must_use]
    pub fn contains(&self, lookup: &R::Lookup) -> bool {
        self.find(lookup).is_some()
    }

    fn find(&self, lookup: &R::Lookup) -> Option<&Node<R::Canonical, V>> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match self.resolver.compare(lookup, &node.key) {
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => current = node.right.as_deref(),
                Ordering::Equal => return Some(node),
            }
        }
        None
    }

    /// Returns the entry with the minimum canonical key.
    #[must_use]
    pub fn min(&self) -> Option<(&R::Canonical, &V)> {
        let mut current = self.root.as_deref()?;
        while let Some(left) = current.left.as_deref() {
            current = left;
        }
        Some((&current.key, &current.value))
    }

    /// Returns the entry with the maximum canonical key.
    #[must_use]
    pub fn max(&self) -> Option<(&R::Canonical, &V)> {
        let mut current = self.root.as_deref()?;
        while let Some(right) = current.right.as_deref() {
            current = right;
        }
        Some((&current.key, &current.value))
    }

    /// Returns an iterator over `(canonical key, value)` entries in
    /// ascending canonical order.
    #[must_use]
    pub fn iter(&self) -> EquivalenceTreeIterator<'_, R::Canonical, V> {
        EquivalenceTreeIterator::from_root(self.root.as_deref(), self.len())
    }

    /// Walks the whole tree and re-verifies the weight, sortedness, and
    /// balance invariants under the canonical ordering. Panics on
    /// violation; intended for tests.
    pub fn check_invariants(&self) {
        ordered::check_node(&self.root, &CanonicalOrder(&self.resolver), None, None);
    }
}

impl<R, V> EquivalenceTree<R, V>
where
    R: EquivalenceResolver + Clone,
    R::Canonical: Clone,
    V: Clone,
{
    /// Inserts or replaces the entry for `lookup`, returning the new tree
    /// and any displaced value.
    ///
    /// A first insert stores `translate(lookup)`; an update keeps the
    /// canonical key already stored.
    #[must_use]
    pub fn put(&self, lookup: &R::Lookup, value: V) -> (Self, Option<V>) {
        let (new_root, displaced) = put_node(&self.root, &self.resolver, lookup, value);
        let tree = Self {
            root: share(new_root),
            resolver: self.resolver.clone(),
        };
        (tree, displaced)
    }

    /// Inserts or replaces the entry for `lookup`, discarding any displaced
    /// value.
    #[must_use]
    pub fn insert(&self, lookup: &R::Lookup, value: V) -> Self {
        self.put(lookup, value).0
    }

    /// Removes the entry equivalent to `lookup`, returning the new tree.
    #[must_use]
    pub fn remove(&self, lookup: &R::Lookup) -> Self {
        let (new_root, _removed) = remove_node(&self.root, &self.resolver, lookup);
        Self {
            root: new_root,
            resolver: self.resolver.clone(),
        }
    }
}

impl<R: EquivalenceResolver + Default, V> Default for EquivalenceTree<R, V> {
    fn default() -> Self {
        Self::new(R::default())
    }
}

impl<R, V> fmt::Debug for EquivalenceTree<R, V>
where
    R: EquivalenceResolver,
    R::Canonical: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Decimal spellings canonicalized to their numeric value.
    #[derive(Clone, Copy, Default)]
    struct Decimal;

    impl EquivalenceResolver for Decimal {
        type Lookup = &'static str;
        type Canonical = u64;

        fn compare(&self, lookup: &&'static str, canonical: &u64) -> Ordering {
            self.translate(lookup).cmp(canonical)
        }

        fn compare_canonical(&self, a: &u64, b: &u64) -> Ordering {
            a.cmp(b)
        }

        fn compare_lookup(&self, a: &&'static str, b: &&'static str) -> Ordering {
            self.translate(a).cmp(&self.translate(b))
        }

        fn translate(&self, lookup: &&'static str) -> u64 {
            lookup.parse().expect("test keys are valid decimals")
        }
    }

    #[rstest]
    fn test_equivalent_spellings_share_one_node() {
        let tree = EquivalenceTree::new(Decimal).insert(&"05", "five");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(&"5"), Some(&"five"));
        assert_eq!(tree.get(&"005"), Some(&"five"));
        assert_eq!(tree.get_canonical(&"5"), Some(&5));
    }

    #[rstest]
    fn test_update_keeps_stored_canonical_key() {
        let tree = EquivalenceTree::new(Decimal).insert(&"07", "old");
        let (updated, displaced) = tree.put(&"7", "new");
        assert_eq!(displaced, Some("old"));
        assert_eq!(updated.len(), 1);
        assert_eq!(updated.get_canonical(&"007"), Some(&7));
        assert_eq!(updated.get(&"7"), Some(&"new"));
    }

    #[rstest]
    fn test_rebalances_like_the_ordered_family() {
        let mut tree = EquivalenceTree::new(Decimal);
        for lookup in ["9", "8", "7", "6", "5", "4", "3", "2", "1"] {
            tree = tree.insert(&lookup, lookup);
            tree.check_invariants();
        }
        assert_eq!(tree.len(), 9);
        assert_eq!(tree.min(), Some((&1, &"1")));
        assert_eq!(tree.max(), Some((&9, &"9")));
    }

    #[rstest]
    fn test_remove_by_any_spelling() {
        let tree = EquivalenceTree::new(Decimal)
            .insert(&"1", "a")
            .insert(&"2", "b")
            .insert(&"3", "c");
        let shrunk = tree.remove(&"02");
        assert_eq!(shrunk.len(), 2);
        assert!(!shrunk.contains(&"2"));
        shrunk.check_invariants();
        assert_eq!(tree.len(), 3);
    }

    #[rstest]
    fn test_compare_lookup_orders_spellings() {
        assert_eq!(Decimal.compare_lookup(&"09", &"10"), Ordering::Less);
        assert_eq!(Decimal.compare_lookup(&"10", &"010"), Ordering::Equal);
    }
}
