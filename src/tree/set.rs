//! Persistent weight-balanced set with split/join algebra.
//!
//! [`SetTree`] shares the node discipline of
//! [`OrderedTree`](crate::tree::OrderedTree) — immutable weight-tracked
//! nodes, rotation on the way out of an insert or delete — but holds keys
//! only and balances against a looser skew limit. The slack makes
//! [`split`](SetTree::split) and [`join`](SetTree::join) cheaper, and those
//! two primitives carry the whole set algebra: `union`, `intersection`, and
//! `difference` run divide-and-conquer over a pivot instead of reinserting
//! elements one at a time, giving O(m · log(n/m + 1)) for inputs of size
//! `m ≤ n`.
//!
//! # Examples
//!
//! ```rust
//! use balsa::tree::SetTree;
//!
//! let a: SetTree<i32> = (0..100).collect();
//! let b: SetTree<i32> = (50..150).collect();
//!
//! assert_eq!(a.union(&b).len(), 150);
//! assert_eq!(a.intersection(&b).len(), 50);
//! assert_eq!(a.difference(&b).len(), 50);
//! ```

use super::ReferenceCounter;
use super::compare::{Comparator, NaturalOrder};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;

/// Balance factor for the set family: roughly 4× skew tolerance, looser
/// than the key/value families' 2×. The extra slack trades depth for
/// cheaper split/join and is kept as a separate per-family constant.
const BALANCE_SHIFT: u32 = 2;

// =============================================================================
// Node Definition
// =============================================================================

type Link<K> = Option<ReferenceCounter<Node<K>>>;

/// Internal key-only node. Immutable once constructed.
struct Node<K> {
    key: K,
    weight: usize,
    left: Link<K>,
    right: Link<K>,
}

fn weight<K>(link: &Link<K>) -> usize {
    link.as_ref().map_or(0, |node| node.weight)
}

fn share<K>(node: Node<K>) -> Link<K> {
    Some(ReferenceCounter::new(node))
}

impl<K> Node<K> {
    fn branch(key: K, left: Link<K>, right: Link<K>) -> Self {
        let weight = 1 + weight(&left) + weight(&right);
        Self {
            key,
            weight,
            left,
            right,
        }
    }
}

// =============================================================================
// Balance Algebra
// =============================================================================

const fn balance_limit(sibling: usize) -> usize {
    (sibling << BALANCE_SHIFT) + sibling
}

const fn is_balanced_pair(a: usize, b: usize) -> bool {
    a + b <= 1 || (a <= balance_limit(b) && b <= balance_limit(a))
}

fn rebalance_left_heavy<K: Clone>(node: Node<K>) -> Node<K> {
    let left_weight = weight(&node.left);
    let right_weight = weight(&node.right);
    if left_weight + right_weight <= 1 || left_weight <= balance_limit(right_weight) {
        return node;
    }
    let single = match &node.left {
        Some(left) => weight(&left.left) >= weight(&left.right),
        None => return node,
    };
    if single {
        rotate_right(node)
    } else {
        rotate_left_right(node)
    }
}

fn rebalance_right_heavy<K: Clone>(node: Node<K>) -> Node<K> {
    let left_weight = weight(&node.left);
    let right_weight = weight(&node.right);
    if left_weight + right_weight <= 1 || right_weight <= balance_limit(left_weight) {
        return node;
    }
    let single = match &node.right {
        Some(right) => weight(&right.right) >= weight(&right.left),
        None => return node,
    };
    if single {
        rotate_left(node)
    } else {
        rotate_right_left(node)
    }
}

fn rotate_right<K: Clone>(node: Node<K>) -> Node<K> {
    if let Some(left) = node.left {
        let lowered = Node::branch(node.key, left.right.clone(), node.right);
        Node::branch(left.key.clone(), left.left.clone(), share(lowered))
    } else {
        node
    }
}

fn rotate_left<K: Clone>(node: Node<K>) -> Node<K> {
    if let Some(right) = node.right {
        let lowered = Node::branch(node.key, node.left, right.left.clone());
        Node::branch(right.key.clone(), share(lowered), right.right.clone())
    } else {
        node
    }
}

fn rotate_left_right<K: Clone>(node: Node<K>) -> Node<K> {
    if let Some(left) = node.left {
        match &left.right {
            Some(inner) => {
                let new_left = Node::branch(left.key.clone(), left.left.clone(), inner.left.clone());
                let new_right = Node::branch(node.key, inner.right.clone(), node.right);
                Node::branch(inner.key.clone(), share(new_left), share(new_right))
            }
            None => Node::branch(node.key, Some(left), node.right),
        }
    } else {
        node
    }
}

fn rotate_right_left<K: Clone>(node: Node<K>) -> Node<K> {
    if let Some(right) = node.right {
        match &right.left {
            Some(inner) => {
                let new_left = Node::branch(node.key, node.left, inner.left.clone());
                let new_right =
                    Node::branch(right.key.clone(), inner.right.clone(), right.right.clone());
                Node::branch(inner.key.clone(), share(new_left), share(new_right))
            }
            None => Node::branch(node.key, node.left, Some(right)),
        }
    } else {
        node
    }
}

// =============================================================================
// Recursive Node Operations
// =============================================================================

fn insert_node<K, C>(link: &Link<K>, comparator: &C, key: K) -> (Node<K>, bool)
where
    K: Clone,
    C: Comparator<K>,
{
    match link {
        None => (Node::branch(key, None, None), true),
        Some(node) => match comparator.compare(&key, &node.key) {
            Ordering::Less => {
                let (new_left, added) = insert_node(&node.left, comparator, key);
                let rebuilt = Node::branch(node.key.clone(), share(new_left), node.right.clone());
                (rebalance_left_heavy(rebuilt), added)
            }
            Ordering::Greater => {
                let (new_right, added) = insert_node(&node.right, comparator, key);
                let rebuilt = Node::branch(node.key.clone(), node.left.clone(), share(new_right));
                (rebalance_right_heavy(rebuilt), added)
            }
            Ordering::Equal => (
                Node {
                    key,
                    weight: node.weight,
                    left: node.left.clone(),
                    right: node.right.clone(),
                },
                false,
            ),
        },
    }
}

fn remove_node<K, C>(link: &Link<K>, comparator: &C, key: &K) -> (Link<K>, bool)
where
    K: Clone,
    C: Comparator<K>,
{
    match link {
        None => (None, false),
        Some(node) => match comparator.compare(key, &node.key) {
            Ordering::Less => {
                let (new_left, removed) = remove_node(&node.left, comparator, key);
                if !removed {
                    return (Some(node.clone()), false);
                }
                let rebuilt = Node::branch(node.key.clone(), new_left, node.right.clone());
                (share(rebalance_right_heavy(rebuilt)), true)
            }
            Ordering::Greater => {
                let (new_right, removed) = remove_node(&node.right, comparator, key);
                if !removed {
                    return (Some(node.clone()), false);
                }
                let rebuilt = Node::branch(node.key.clone(), node.left.clone(), new_right);
                (share(rebalance_left_heavy(rebuilt)), true)
            }
            Ordering::Equal => (join_nodes(node.left.clone(), node.right.clone()), true),
        },
    }
}

fn detach_min<K: Clone>(node: &ReferenceCounter<Node<K>>) -> (Link<K>, K) {
    match &node.left {
        None => (node.right.clone(), node.key.clone()),
        Some(left) => {
            let (rest, key) = detach_min(left);
            let rebuilt = Node::branch(node.key.clone(), rest, node.right.clone());
            (share(rebalance_right_heavy(rebuilt)), key)
        }
    }
}

fn detach_max<K: Clone>(node: &ReferenceCounter<Node<K>>) -> (Link<K>, K) {
    match &node.right {
        None => (node.left.clone(), node.key.clone()),
        Some(right) => {
            let (rest, key) = detach_max(right);
            let rebuilt = Node::branch(node.key.clone(), node.left.clone(), rest);
            (share(rebalance_left_heavy(rebuilt)), key)
        }
    }
}

/// Concatenates `left`, a pivot key, and `right`, where every key in `left`
/// orders below the pivot and every key in `right` above it. Descends the
/// spine of the heavier operand until the remainder is within balance, then
/// re-establishes the invariant on children while rebuilding upward. The
/// pivot itself may sit briefly as an over-heavy virtual root mid-descent;
/// the final rebuild restores it.
fn link_nodes<K: Clone>(left: Link<K>, key: K, right: Link<K>) -> Node<K> {
    let left_weight = weight(&left);
    let right_weight = weight(&right);
    if left_weight + right_weight > 1 && left_weight > balance_limit(right_weight) {
        match left {
            Some(left_node) => {
                let merged = link_nodes(left_node.right.clone(), key, right);
                let rebuilt =
                    Node::branch(left_node.key.clone(), left_node.left.clone(), share(merged));
                rebalance_right_heavy(rebuilt)
            }
            None => Node::branch(key, None, right),
        }
    } else if left_weight + right_weight > 1 && right_weight > balance_limit(left_weight) {
        match right {
            Some(right_node) => {
                let merged = link_nodes(left, key, right_node.left.clone());
                let rebuilt =
                    Node::branch(right_node.key.clone(), share(merged), right_node.right.clone());
                rebalance_left_heavy(rebuilt)
            }
            None => Node::branch(key, left, None),
        }
    } else {
        Node::branch(key, left, right)
    }
}

/// Concatenates two fully-ordered operands (`max(left) < min(right)`); the
/// bridging key is detached from the heavier side.
fn join_nodes<K: Clone>(left: Link<K>, right: Link<K>) -> Link<K> {
    match (left, right) {
        (None, right) => right,
        (left, None) => left,
        (Some(left_node), Some(right_node)) => {
            if left_node.weight >= right_node.weight {
                let (rest, key) = detach_max(&left_node);
                share(link_nodes(rest, key, Some(right_node)))
            } else {
                let (rest, key) = detach_min(&right_node);
                share(link_nodes(Some(left_node), key, rest))
            }
        }
    }
}

/// Partitions a subtree around `pivot` into strictly-less and
/// strictly-greater parts, reporting whether the pivot itself was present.
fn split_node<K, C>(link: &Link<K>, comparator: &C, pivot: &K) -> (Link<K>, bool, Link<K>)
where
    K: Clone,
    C: Comparator<K>,
{
    match link {
        None => (None, false, None),
        Some(node) => match comparator.compare(pivot, &node.key) {
            Ordering::Equal => (node.left.clone(), true, node.right.clone()),
            Ordering::Less => {
                let (less, found, greater) = split_node(&node.left, comparator, pivot);
                let rejoined = link_nodes(greater, node.key.clone(), node.right.clone());
                (less, found, share(rejoined))
            }
            Ordering::Greater => {
                let (less, found, greater) = split_node(&node.right, comparator, pivot);
                let rejoined = link_nodes(node.left.clone(), node.key.clone(), less);
                (share(rejoined), found, greater)
            }
        },
    }
}

fn union_nodes<K, C>(a: &Link<K>, b: &Link<K>, comparator: &C) -> Link<K>
where
    K: Clone,
    C: Comparator<K>,
{
    match (a, b) {
        (None, other) | (other, None) => other.clone(),
        (Some(a_node), Some(b_node)) => {
            // Pivot from the larger operand, split the smaller against it.
            let (pivot, smaller) = if a_node.weight >= b_node.weight {
                (a_node, b)
            } else {
                (b_node, a)
            };
            let (less, _found, greater) = split_node(smaller, comparator, &pivot.key);
            let merged_left = union_nodes(&pivot.left, &less, comparator);
            let merged_right = union_nodes(&pivot.right, &greater, comparator);
            share(link_nodes(merged_left, pivot.key.clone(), merged_right))
        }
    }
}

fn intersection_nodes<K, C>(a: &Link<K>, b: &Link<K>, comparator: &C) -> Link<K>
where
    K: Clone,
    C: Comparator<K>,
{
    match (a, b) {
        (None, _) | (_, None) => None,
        (Some(a_node), Some(b_node)) => {
            let (pivot, smaller) = if a_node.weight >= b_node.weight {
                (a_node, b)
            } else {
                (b_node, a)
            };
            let (less, found, greater) = split_node(smaller, comparator, &pivot.key);
            let merged_left = intersection_nodes(&pivot.left, &less, comparator);
            let merged_right = intersection_nodes(&pivot.right, &greater, comparator);
            if found {
                share(link_nodes(merged_left, pivot.key.clone(), merged_right))
            } else {
                join_nodes(merged_left, merged_right)
            }
        }
    }
}

fn difference_nodes<K, C>(a: &Link<K>, b: &Link<K>, comparator: &C) -> Link<K>
where
    K: Clone,
    C: Comparator<K>,
{
    match (a, b) {
        (None, _) => None,
        (_, None) => a.clone(),
        (Some(a_node), Some(_)) => {
            // A keeps its node exactly when splitting B does not find it.
            let (b_less, found, b_greater) = split_node(b, comparator, &a_node.key);
            let kept_left = difference_nodes(&a_node.left, &b_less, comparator);
            let kept_right = difference_nodes(&a_node.right, &b_greater, comparator);
            if found {
                join_nodes(kept_left, kept_right)
            } else {
                share(link_nodes(kept_left, a_node.key.clone(), kept_right))
            }
        }
    }
}

fn check_node<K, C>(link: &Link<K>, comparator: &C, lower: Option<&K>, upper: Option<&K>) -> usize
where
    C: Comparator<K>,
{
    let Some(node) = link.as_deref() else {
        return 0;
    };
    if let Some(bound) = lower {
        assert!(
            comparator.compare(bound, &node.key) == Ordering::Less,
            "sortedness invariant violated: key not greater than its left bound",
        );
    }
    if let Some(bound) = upper {
        assert!(
            comparator.compare(&node.key, bound) == Ordering::Less,
            "sortedness invariant violated: key not less than its right bound",
        );
    }
    let left_weight = check_node(&node.left, comparator, lower, Some(&node.key));
    let right_weight = check_node(&node.right, comparator, Some(&node.key), upper);
    assert!(
        node.weight == 1 + left_weight + right_weight,
        "weight invariant violated: cached weight {} but subtree holds {} nodes",
        node.weight,
        1 + left_weight + right_weight,
    );
    assert!(
        is_balanced_pair(left_weight, right_weight),
        "balance invariant violated: sibling weights {left_weight} and {right_weight}",
    );
    node.weight
}

// =============================================================================
// SetTree Definition
// =============================================================================

/// A persistent weight-balanced set of keys.
///
/// All operations return new handles; the original set observes the version
/// it pointed at. The set algebra (`union`, `intersection`, `difference`)
/// is built on `split`/`join` and never reinserts elements one by one.
///
/// # Examples
///
/// ```rust
/// use balsa::tree::SetTree;
///
/// let set = SetTree::new().insert(2).insert(1).insert(3);
/// assert!(set.contains(&2));
/// assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
///
/// let (less, found, greater) = set.split(&2);
/// assert!(found);
/// assert_eq!(less.len(), 1);
/// assert_eq!(greater.len(), 1);
/// ```
pub struct SetTree<K, C = NaturalOrder> {
    root: Link<K>,
    comparator: C,
}

impl<K, C: Clone> Clone for SetTree<K, C> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            comparator: self.comparator.clone(),
        }
    }
}

impl<K, C: Default> SetTree<K, C> {
    /// Creates a new empty set with the default comparator.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: None,
            comparator: C::default(),
        }
    }
}

impl<K, C> SetTree<K, C> {
    /// Creates a new empty set ordered by the supplied comparator.
    #[inline]
    #[must_use]
    pub const fn with_comparator(comparator: C) -> Self {
        Self {
            root: None,
            comparator,
        }
    }

    /// Returns the number of keys.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        weight(&self.root)
    }

    /// Returns `true` if the set contains no keys.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns an iterator over keys in ascending order.
    #[must_use]
    pub fn iter(&self) -> SetTreeIterator<'_, K> {
        let mut iterator = SetTreeIterator {
            stack: SmallVec::new(),
            remaining: self.len(),
        };
        iterator.descend_left(self.root.as_deref());
        iterator
    }
}

impl<K, C: Comparator<K>> SetTree<K, C> {
    /// Returns `true` if `key` is a member.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match self.comparator.compare(key, &node.key) {
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => current = node.right.as_deref(),
                Ordering::Equal => return true,
            }
        }
        false
    }

    /// Returns the minimum key.
    #[must_use]
    pub fn min(&self) -> Option<&K> {
        let mut current = self.root.as_deref()?;
        while let Some(left) = current.left.as_deref() {
            current = left;
        }
        Some(&current.key)
    }

    /// Returns the maximum key.
    #[must_use]
    pub fn max(&self) -> Option<&K> {
        let mut current = self.root.as_deref()?;
        while let Some(right) = current.right.as_deref() {
            current = right;
        }
        Some(&current.key)
    }

    /// Walks the whole set and re-verifies the weight, sortedness, and
    /// balance invariants. Panics on violation; intended for tests.
    pub fn check_invariants(&self) {
        check_node(&self.root, &self.comparator, None, None);
    }
}

impl<K: Clone, C: Comparator<K> + Clone> SetTree<K, C> {
    fn with_root(&self, root: Link<K>) -> Self {
        Self {
            root,
            comparator: self.comparator.clone(),
        }
    }

    /// Adds `key`, returning the new set. Inserting a present key is
    /// idempotent (a fresh node replaces the match, no duplicate).
    #[must_use]
    pub fn insert(&self, key: K) -> Self {
        let (new_root, _added) = insert_node(&self.root, &self.comparator, key);
        self.with_root(share(new_root))
    }

    /// Removes `key`, returning the new set. An absent key returns an
    /// equal handle.
    #[must_use]
    pub fn remove(&self, key: &K) -> Self {
        let (new_root, _removed) = remove_node(&self.root, &self.comparator, key);
        self.with_root(new_root)
    }

    /// Partitions the set around `pivot` into the keys strictly less and
    /// strictly greater, reporting whether the pivot was present.
    ///
    /// This is the universal primitive behind the set algebra.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balsa::tree::SetTree;
    ///
    /// let set: SetTree<i32> = (0..10).collect();
    /// let (less, found, greater) = set.split(&4);
    /// assert!(found);
    /// assert_eq!(less.len(), 4);
    /// assert_eq!(greater.len(), 5);
    /// ```
    #[must_use]
    pub fn split(&self, pivot: &K) -> (Self, bool, Self) {
        let (less, found, greater) = split_node(&self.root, &self.comparator, pivot);
        (self.with_root(less), found, self.with_root(greater))
    }

    /// Concatenates two sets where every key of `self` orders strictly
    /// below every key of `other`.
    ///
    /// The ordering precondition is the caller's contract; it is checked in
    /// debug builds only.
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        debug_assert!(
            match (self.max(), other.min()) {
                (Some(a), Some(b)) => self.comparator.compare(a, b) == Ordering::Less,
                _ => true,
            },
            "join operands must be fully ordered",
        );
        self.with_root(join_nodes(self.root.clone(), other.root.clone()))
    }

    /// Returns the union of two sets.
    ///
    /// # Complexity
    ///
    /// O(m · log(n/m + 1)) for sizes m ≤ n: the smaller operand is always
    /// split against a pivot drawn from the larger.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        self.with_root(union_nodes(&self.root, &other.root, &self.comparator))
    }

    /// Returns the intersection of two sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        self.with_root(intersection_nodes(&self.root, &other.root, &self.comparator))
    }

    /// Returns the keys of `self` that are not members of `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        self.with_root(difference_nodes(&self.root, &other.root, &self.comparator))
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An in-order iterator over the keys of a [`SetTree`].
pub struct SetTreeIterator<'a, K> {
    stack: SmallVec<[&'a Node<K>; 16]>,
    remaining: usize,
}

impl<'a, K> SetTreeIterator<'a, K> {
    fn descend_left(&mut self, mut current: Option<&'a Node<K>>) {
        while let Some(node) = current {
            self.stack.push(node);
            current = node.left.as_deref();
        }
    }
}

impl<'a, K> Iterator for SetTreeIterator<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.descend_left(node.right.as_deref());
        self.remaining -= 1;
        Some(&node.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for SetTreeIterator<'_, K> {
    fn len(&self) -> usize {
        self.remaining
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, C: Default> Default for SetTree<K, C> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, C: Comparator<K> + Clone + Default> FromIterator<K> for SetTree<K, C> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        for key in iter {
            set = set.insert(key);
        }
        set
    }
}

impl<'a, K, C> IntoIterator for &'a SetTree<K, C> {
    type Item = &'a K;
    type IntoIter = SetTreeIterator<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, C: Comparator<K>> PartialEq for SetTree<K, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| self.comparator.compare(a, b) == Ordering::Equal)
    }
}

impl<K, C: Comparator<K>> Eq for SetTree<K, C> {}

impl<K: fmt::Debug, C> fmt::Debug for SetTree<K, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, C> serde::Serialize for SetTree<K, C>
where
    K: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, K, C> serde::Deserialize<'de> for SetTree<K, C>
where
    K: serde::Deserialize<'de> + Clone,
    C: Comparator<K> + Clone + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let keys = Vec::<K>::deserialize(deserializer)?;
        Ok(keys.into_iter().collect())
    }
}

static_assertions::assert_impl_all!(SetTree<i32>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn set_of(keys: impl IntoIterator<Item = i32>) -> SetTree<i32> {
        keys.into_iter().collect()
    }

    #[rstest]
    fn test_insert_and_contains() {
        let set: SetTree<i32> = SetTree::new().insert(2).insert(1).insert(3).insert(2);
        assert_eq!(set.len(), 3);
        assert!(set.contains(&1));
        assert!(!set.contains(&4));
        set.check_invariants();
    }

    #[rstest]
    fn test_remove_rebalances() {
        let mut set = set_of(0..64);
        for key in 0..48 {
            set = set.remove(&key);
            set.check_invariants();
        }
        assert_eq!(set.len(), 16);
        assert_eq!(set.min(), Some(&48));
    }

    #[rstest]
    fn test_split_partitions_around_pivot() {
        let set = set_of(0..10);
        let (less, found, greater) = set.split(&4);
        assert!(found);
        assert_eq!(less.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(greater.iter().copied().collect::<Vec<_>>(), (5..10).collect::<Vec<_>>());
        less.check_invariants();
        greater.check_invariants();

        let (_, found, _) = set.split(&99);
        assert!(!found);
    }

    #[rstest]
    fn test_join_concatenates_ordered_operands() {
        let low = set_of(0..5);
        let high = set_of(10..15);
        let joined = low.join(&high);
        assert_eq!(joined.len(), 10);
        joined.check_invariants();
        assert_eq!(joined.min(), Some(&0));
        assert_eq!(joined.max(), Some(&14));
    }

    #[rstest]
    fn test_union_covers_both_operands() {
        let a = set_of((0..50).map(|key| key * 2));
        let b = set_of(25..75);
        let union = a.union(&b);
        union.check_invariants();
        for key in a.iter().chain(b.iter()) {
            assert!(union.contains(key));
        }
        // 50 evens + 50 contiguous keys, 25 shared.
        assert_eq!(union.len(), 75);
    }

    #[rstest]
    fn test_intersection_membership() {
        let a = set_of(0..20);
        let b = set_of(10..30);
        let intersection = a.intersection(&b);
        intersection.check_invariants();
        assert_eq!(
            intersection.iter().copied().collect::<Vec<_>>(),
            (10..20).collect::<Vec<_>>()
        );
    }

    #[rstest]
    fn test_difference_membership() {
        let a = set_of(0..20);
        let b = set_of(10..30);
        let difference = a.difference(&b);
        difference.check_invariants();
        assert_eq!(
            difference.iter().copied().collect::<Vec<_>>(),
            (0..10).collect::<Vec<_>>()
        );
    }

    #[rstest]
    fn test_set_algebra_with_empty_operands() {
        let empty: SetTree<i32> = SetTree::new();
        let set = set_of(0..5);
        assert_eq!(set.union(&empty), set);
        assert_eq!(empty.union(&set), set);
        assert!(set.intersection(&empty).is_empty());
        assert_eq!(set.difference(&empty), set);
        assert!(empty.difference(&set).is_empty());
    }
}
