//! Persistent weight-balanced ordered map.
//!
//! This module provides [`OrderedTree`], an immutable key → value search
//! tree balanced by subtree size rather than height, plus
//! [`SharedOrderedTree`], a lock-guarded root cell layered over the same
//! immutable node algebra.
//!
//! # Overview
//!
//! - O(log N) `get`, `put`, `remove`, `min`/`max`
//! - O(log N) order statistics: `get_by_rank`, `index_of`
//! - O(1) `len`, `is_empty`, and `clone` (structural sharing)
//!
//! Every node tracks the `weight` (size) of its subtree. After an insert or
//! delete, a child that has grown heavier than its sibling's balance limit
//! is rotated back under it — a single rotation when the heavier grandchild
//! lies on the outside, a double rotation otherwise.
//!
//! # Examples
//!
//! ```rust
//! use balsa::tree::OrderedTree;
//!
//! let tree = OrderedTree::new()
//!     .insert("b", 2)
//!     .insert("a", 1)
//!     .insert("c", 3);
//!
//! assert_eq!(tree.get(&"a"), Some(&1));
//! assert_eq!(tree.get_by_rank(0).unwrap(), (&"a", &1));
//! assert_eq!(tree.index_of(&"b"), 1);
//!
//! // Absent keys report their would-be rank as a bitwise complement.
//! assert_eq!(!tree.index_of(&"z"), 3);
//! ```

use super::ReferenceCounter;
use super::compare::{Comparator, NaturalOrder};
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;

/// Balance factor for the key/value tree families: a child may outweigh its
/// sibling by at most `(sibling << BALANCE_SHIFT) + sibling` (roughly 2×
/// skew). The set family uses a deliberately looser factor; the two are
/// never unified.
pub(crate) const BALANCE_SHIFT: u32 = 1;

// =============================================================================
// Node Definition
// =============================================================================

pub(crate) type Link<K, V> = Option<ReferenceCounter<Node<K, V>>>;

/// Internal node structure, shared with the sibling key/value families.
/// Nodes are immutable once constructed; every mutation builds a fresh
/// chain along the search path.
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    /// Number of nodes in the subtree rooted here (self included).
    pub(crate) weight: usize,
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
}

pub(crate) fn weight<K, V>(link: &Link<K, V>) -> usize {
    link.as_ref().map_or(0, |node| node.weight)
}

pub(crate) fn share<K, V>(node: Node<K, V>) -> Link<K, V> {
    Some(ReferenceCounter::new(node))
}

impl<K, V> Node<K, V> {
    pub(crate) const fn leaf(key: K, value: V) -> Self {
        Self {
            key,
            value,
            weight: 1,
            left: None,
            right: None,
        }
    }

    pub(crate) fn branch(key: K, value: V, left: Link<K, V>, right: Link<K, V>) -> Self {
        let weight = 1 + weight(&left) + weight(&right);
        Self {
            key,
            value,
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

/// Whether two sibling weights satisfy the balance invariant. Subtrees of
/// combined weight at most one cannot be rotated into a better shape and
/// are always considered balanced.
const fn is_balanced_pair(a: usize, b: usize) -> bool {
    a + b <= 1 || (a <= balance_limit(b) && b <= balance_limit(a))
}

/// Restores balance when the left child may have grown too heavy.
pub(crate) fn rebalance_left_heavy<K: Clone, V: Clone>(node: Node<K, V>) -> Node<K, V> {
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

/// Restores balance when the right child may have grown too heavy.
pub(crate) fn rebalance_right_heavy<K: Clone, V: Clone>(node: Node<K, V>) -> Node<K, V> {
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

/// Single rotation hoisting the left child.
fn rotate_right<K: Clone, V: Clone>(node: Node<K, V>) -> Node<K, V> {
    if let Some(left) = node.left {
        let lowered = Node::branch(node.key, node.value, left.right.clone(), node.right);
        Node::branch(
            left.key.clone(),
            left.value.clone(),
            left.left.clone(),
            share(lowered),
        )
    } else {
        node
    }
}

/// Single rotation hoisting the right child.
fn rotate_left<K: Clone, V: Clone>(node: Node<K, V>) -> Node<K, V> {
    if let Some(right) = node.right {
        let lowered = Node::branch(node.key, node.value, node.left, right.left.clone());
        Node::branch(
            right.key.clone(),
            right.value.clone(),
            share(lowered),
            right.right.clone(),
        )
    } else {
        node
    }
}

/// Double rotation hoisting the left child's right grandchild.
fn rotate_left_right<K: Clone, V: Clone>(node: Node<K, V>) -> Node<K, V> {
    if let Some(left) = node.left {
        match &left.right {
            Some(inner) => {
                let new_left = Node::branch(
                    left.key.clone(),
                    left.value.clone(),
                    left.left.clone(),
                    inner.left.clone(),
                );
                let new_right =
                    Node::branch(node.key, node.value, inner.right.clone(), node.right);
                Node::branch(
                    inner.key.clone(),
                    inner.value.clone(),
                    share(new_left),
                    share(new_right),
                )
            }
            None => Node::branch(node.key, node.value, Some(left), node.right),
        }
    } else {
        node
    }
}

/// Double rotation hoisting the right child's left grandchild.
fn rotate_right_left<K: Clone, V: Clone>(node: Node<K, V>) -> Node<K, V> {
    if let Some(right) = node.right {
        match &right.left {
            Some(inner) => {
                let new_left = Node::branch(node.key, node.value, node.left, inner.left.clone());
                let new_right = Node::branch(
                    right.key.clone(),
                    right.value.clone(),
                    inner.right.clone(),
                    right.right.clone(),
                );
                Node::branch(
                    inner.key.clone(),
                    inner.value.clone(),
                    share(new_left),
                    share(new_right),
                )
            }
            None => Node::branch(node.key, node.value, node.left, Some(right)),
        }
    } else {
        node
    }
}

// =============================================================================
// Recursive Node Operations
// =============================================================================

/// Persistent upsert. Returns the rebuilt subtree and the displaced value.
fn put_node<K, V, C>(link: &Link<K, V>, comparator: &C, key: K, value: V) -> (Node<K, V>, Option<V>)
where
    K: Clone,
    V: Clone,
    C: Comparator<K>,
{
    match link {
        None => (Node::leaf(key, value), None),
        Some(node) => match comparator.compare(&key, &node.key) {
            Ordering::Less => {
                let (new_left, displaced) = put_node(&node.left, comparator, key, value);
                let rebuilt = Node::branch(
                    node.key.clone(),
                    node.value.clone(),
                    share(new_left),
                    node.right.clone(),
                );
                (rebalance_left_heavy(rebuilt), displaced)
            }
            Ordering::Greater => {
                let (new_right, displaced) = put_node(&node.right, comparator, key, value);
                let rebuilt = Node::branch(
                    node.key.clone(),
                    node.value.clone(),
                    node.left.clone(),
                    share(new_right),
                );
                (rebalance_right_heavy(rebuilt), displaced)
            }
            Ordering::Equal => {
                // Same key: a fresh node at the same position, no duplicate.
                let replaced = Node {
                    key,
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

/// Persistent delete. Returns the rebuilt subtree and the removed value.
fn remove_node<K, V, C>(link: &Link<K, V>, comparator: &C, key: &K) -> (Link<K, V>, Option<V>)
where
    K: Clone,
    V: Clone,
    C: Comparator<K>,
{
    match link {
        None => (None, None),
        Some(node) => match comparator.compare(key, &node.key) {
            Ordering::Less => {
                let (new_left, removed) = remove_node(&node.left, comparator, key);
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
                let (new_right, removed) = remove_node(&node.right, comparator, key);
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
            Ordering::Equal => (remove_root(node), Some(node.value.clone())),
        },
    }
}

/// Removes the root of a subtree, promoting a replacement drawn from the
/// heavier child so the detach cannot worsen the skew.
pub(crate) fn remove_root<K: Clone, V: Clone>(node: &ReferenceCounter<Node<K, V>>) -> Link<K, V> {
    match (&node.left, &node.right) {
        (None, None) => None,
        (Some(left), None) => Some(left.clone()),
        (None, Some(right)) => Some(right.clone()),
        (Some(left), Some(right)) => {
            if left.weight >= right.weight {
                let (rest, key, value) = detach_max(left);
                let rebuilt = Node::branch(key, value, rest, Some(right.clone()));
                share(rebalance_right_heavy(rebuilt))
            } else {
                let (rest, key, value) = detach_min(right);
                let rebuilt = Node::branch(key, value, Some(left.clone()), rest);
                share(rebalance_left_heavy(rebuilt))
            }
        }
    }
}

/// Detaches the minimum entry of a subtree, rebalancing on the way up.
fn detach_min<K: Clone, V: Clone>(node: &ReferenceCounter<Node<K, V>>) -> (Link<K, V>, K, V) {
    match &node.left {
        None => (node.right.clone(), node.key.clone(), node.value.clone()),
        Some(left) => {
            let (rest, key, value) = detach_min(left);
            let rebuilt = Node::branch(node.key.clone(), node.value.clone(), rest, node.right.clone());
            (share(rebalance_right_heavy(rebuilt)), key, value)
        }
    }
}

/// Detaches the maximum entry of a subtree, rebalancing on the way up.
fn detach_max<K: Clone, V: Clone>(node: &ReferenceCounter<Node<K, V>>) -> (Link<K, V>, K, V) {
    match &node.right {
        None => (node.left.clone(), node.key.clone(), node.value.clone()),
        Some(right) => {
            let (rest, key, value) = detach_max(right);
            let rebuilt = Node::branch(node.key.clone(), node.value.clone(), node.left.clone(), rest);
            (share(rebalance_left_heavy(rebuilt)), key, value)
        }
    }
}

/// Re-verifies the weight, sortedness, and balance invariants of a subtree.
/// Returns the verified weight. Panics on any violation: a broken invariant
/// is a bug in the tree algebra itself, never a recoverable condition.
pub(crate) fn check_node<K, V, C>(
    link: &Link<K, V>,
    comparator: &C,
    lower: Option<&K>,
    upper: Option<&K>,
) -> usize
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
// Errors
// =============================================================================

/// Error returned by [`OrderedTree::get_by_rank`] for a rank outside
/// `[0, len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rank {rank} out of bounds for tree of {len} entries")]
pub struct RankError {
    /// The offending rank.
    pub rank: usize,
    /// The tree size at the time of the call.
    pub len: usize,
}

// =============================================================================
// OrderedTree Definition
// =============================================================================

/// A persistent (applicative) weight-balanced ordered map.
///
/// A handle is a lightweight value — the root pointer plus the comparator —
/// and cloning one is O(1). Mutating operations return a new handle; the
/// original keeps observing the version it pointed at.
///
/// # Time Complexity
///
/// | Operation     | Complexity |
/// |---------------|------------|
/// | `get`         | O(log N)   |
/// | `put`         | O(log N)   |
/// | `remove`      | O(log N)   |
/// | `get_by_rank` | O(log N)   |
/// | `index_of`    | O(log N)   |
/// | `min`/`max`   | O(log N)   |
/// | `len`/`clone` | O(1)       |
///
/// # Examples
///
/// ```rust
/// use balsa::tree::OrderedTree;
///
/// let tree = OrderedTree::new().insert(1, "one");
/// let (newer, displaced) = tree.put(1, "ONE");
///
/// assert_eq!(displaced, Some("one"));
/// assert_eq!(tree.get(&1), Some(&"one"));   // Original unchanged
/// assert_eq!(newer.get(&1), Some(&"ONE"));  // New version
/// ```
pub struct OrderedTree<K, V, C = NaturalOrder> {
    root: Link<K, V>,
    comparator: C,
}

impl<K, V, C: Clone> Clone for OrderedTree<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            comparator: self.comparator.clone(),
        }
    }
}

impl<K, V, C: Default> OrderedTree<K, V, C> {
    /// Creates a new empty tree with the default comparator.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: None,
            comparator: C::default(),
        }
    }
}

impl<K, V, C> OrderedTree<K, V, C> {
    /// Creates a new empty tree ordered by the supplied comparator.
    #[inline]
    #[must_use]
    pub const fn with_comparator(comparator: C) -> Self {
        Self {
            root: None,
            comparator,
        }
    }

    /// Returns the number of entries.
    ///
    /// # Complexity
    ///
    /// O(1) — the root node caches its subtree weight.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        weight(&self.root)
    }

    /// Returns `true` if the tree contains no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the comparator this tree orders by.
    #[inline]
    pub const fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Returns an iterator over entries in ascending key order.
    #[must_use]
    pub fn iter(&self) -> OrderedTreeIterator<'_, K, V> {
        OrderedTreeIterator::from_root(self.root.as_deref(), self.len())
    }

    /// Returns an iterator over keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over values in ascending key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

impl<K, V, C: Comparator<K>> OrderedTree<K, V, C> {
    /// Returns a reference to the value stored under `key`.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balsa::tree::OrderedTree;
    ///
    /// let tree = OrderedTree::new().insert("hello", 42);
    /// assert_eq!(tree.get(&"hello"), Some(&42));
    /// assert_eq!(tree.get(&"world"), None);
    /// ```
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match self.comparator.compare(key, &node.key) {
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => current = node.right.as_deref(),
                Ordering::Equal => return Some(&node.value),
            }
        }
        None
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns the entry of the given rank (0-based, in key order).
    ///
    /// Descends by subtree weights, so no comparisons are made.
    ///
    /// # Errors
    ///
    /// [`RankError`] when `rank` is not in `[0, len)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balsa::tree::OrderedTree;
    ///
    /// let tree = OrderedTree::new().insert("b", 2).insert("a", 1);
    /// assert_eq!(tree.get_by_rank(0).unwrap(), (&"a", &1));
    /// assert!(tree.get_by_rank(2).is_err());
    /// ```
    pub fn get_by_rank(&self, rank: usize) -> Result<(&K, &V), RankError> {
        let len = self.len();
        if rank >= len {
            return Err(RankError { rank, len });
        }
        let mut remaining = rank;
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            let left_weight = weight(&node.left);
            match remaining.cmp(&left_weight) {
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Equal => return Ok((&node.key, &node.value)),
                Ordering::Greater => {
                    remaining -= left_weight + 1;
                    current = node.right.as_deref();
                }
            }
        }
        Err(RankError { rank, len })
    }

    /// Returns the key of the given rank.
    ///
    /// # Errors
    ///
    /// [`RankError`] when `rank` is not in `[0, len)`.
    pub fn get_key(&self, rank: usize) -> Result<&K, RankError> {
        self.get_by_rank(rank).map(|(key, _)| key)
    }

    /// Returns the rank of `key` if present; otherwise the bitwise
    /// complement of the rank the key would occupy after insertion.
    ///
    /// Callers test the sign to distinguish found from absent and recover
    /// the insertion position in O(1) with another complement.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balsa::tree::OrderedTree;
    ///
    /// let tree = OrderedTree::new().insert("a", 1).insert("c", 3);
    /// assert_eq!(tree.index_of(&"a"), 0);
    /// let missing = tree.index_of(&"b");
    /// assert!(missing < 0);
    /// assert_eq!(!missing, 1); // "b" would land between "a" and "c"
    /// ```
    #[must_use]
    pub fn index_of(&self, key: &K) -> isize {
        let mut rank: usize = 0;
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match self.comparator.compare(key, &node.key) {
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Equal => return to_rank(rank + weight(&node.left)),
                Ordering::Greater => {
                    rank += weight(&node.left) + 1;
                    current = node.right.as_deref();
                }
            }
        }
        !to_rank(rank)
    }

    /// Returns the entry with the minimum key.
    #[must_use]
    pub fn min(&self) -> Option<(&K, &V)> {
        let mut current = self.root.as_deref()?;
        while let Some(left) = current.left.as_deref() {
            current = left;
        }
        Some((&current.key, &current.value))
    }

    /// Returns the entry with the maximum key.
    #[must_use]
    pub fn max(&self) -> Option<(&K, &V)> {
        let mut current = self.root.as_deref()?;
        while let Some(right) = current.right.as_deref() {
            current = right;
        }
        Some((&current.key, &current.value))
    }

    /// Walks the whole tree and re-verifies the weight, sortedness, and
    /// balance invariants.
    ///
    /// Intended for tests. A violation is fatal — it indicates a bug in the
    /// tree algebra itself, so this panics rather than returning an error.
    pub fn check_invariants(&self) {
        let verified = check_node(&self.root, &self.comparator, None, None);
        assert!(
            verified == self.len(),
            "weight invariant violated at the root: cached {} but counted {verified}",
            self.len(),
        );
    }
}

impl<K: Clone, V: Clone, C: Comparator<K> + Clone> OrderedTree<K, V, C> {
    /// Inserts or replaces an entry, returning the new tree and the value
    /// previously stored under `key`, if any.
    ///
    /// # Complexity
    ///
    /// O(log N), sharing every subtree off the search path.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balsa::tree::OrderedTree;
    ///
    /// let tree = OrderedTree::new().insert(1, "one");
    /// let (updated, displaced) = tree.put(1, "ONE");
    /// assert_eq!(displaced, Some("one"));
    /// assert_eq!(updated.len(), 1);
    /// ```
    #[must_use]
    pub fn put(&self, key: K, value: V) -> (Self, Option<V>) {
        let (new_root, displaced) = put_node(&self.root, &self.comparator, key, value);
        let tree = Self {
            root: share(new_root),
            comparator: self.comparator.clone(),
        };
        (tree, displaced)
    }

    /// Inserts or replaces an entry, discarding any displaced value.
    ///
    /// Convenience wrapper around [`put`](Self::put) for chained
    /// construction.
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        self.put(key, value).0
    }

    /// Removes `key`, returning the new tree. An absent key returns an
    /// equal handle.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balsa::tree::OrderedTree;
    ///
    /// let tree = OrderedTree::new().insert(1, "one").insert(2, "two");
    /// let removed = tree.remove(&1);
    ///
    /// assert_eq!(tree.len(), 2);    // Original unchanged
    /// assert_eq!(removed.len(), 1);
    /// assert_eq!(removed.get(&1), None);
    /// ```
    #[must_use]
    pub fn remove(&self, key: &K) -> Self {
        let (new_root, _removed) = remove_node(&self.root, &self.comparator, key);
        Self {
            root: new_root,
            comparator: self.comparator.clone(),
        }
    }
}

// Tree sizes are bounded far below `isize::MAX` (every entry owns an
// allocation), so the cast preserves value.
#[allow(clippy::cast_possible_wrap)]
const fn to_rank(rank: usize) -> isize {
    rank as isize
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An in-order iterator over the entries of an [`OrderedTree`].
pub struct OrderedTreeIterator<'a, K, V> {
    stack: SmallVec<[&'a Node<K, V>; 16]>,
    remaining: usize,
}

impl<'a, K, V> OrderedTreeIterator<'a, K, V> {
    pub(crate) fn from_root(root: Option<&'a Node<K, V>>, remaining: usize) -> Self {
        let mut iterator = Self {
            stack: SmallVec::new(),
            remaining,
        };
        iterator.descend_left(root);
        iterator
    }

    fn descend_left(&mut self, mut current: Option<&'a Node<K, V>>) {
        while let Some(node) = current {
            self.stack.push(node);
            current = node.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for OrderedTreeIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.descend_left(node.right.as_deref());
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for OrderedTreeIterator<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V, C: Default> Default for OrderedTree<K, V, C> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone, C: Comparator<K> + Clone + Default> FromIterator<(K, V)>
    for OrderedTree<K, V, C>
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        for (key, value) in iter {
            tree = tree.insert(key, value);
        }
        tree
    }
}

impl<'a, K, V, C> IntoIterator for &'a OrderedTree<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = OrderedTreeIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V: PartialEq, C: Comparator<K>> PartialEq for OrderedTree<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|((ak, av), (bk, bv))| {
            self.comparator.compare(ak, bk) == Ordering::Equal && av == bv
        })
    }
}

impl<K, V: Eq, C: Comparator<K>> Eq for OrderedTree<K, V, C> {}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for OrderedTree<K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V, C> serde::Serialize for OrderedTree<K, V, C>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct OrderedTreeVisitor<K, V, C> {
    marker: std::marker::PhantomData<(K, V, C)>,
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> serde::de::Visitor<'de> for OrderedTreeVisitor<K, V, C>
where
    K: serde::Deserialize<'de> + Clone,
    V: serde::Deserialize<'de> + Clone,
    C: Comparator<K> + Clone + Default,
{
    type Value = OrderedTree<K, V, C>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut tree = OrderedTree::new();
        while let Some((key, value)) = access.next_entry()? {
            tree = tree.insert(key, value);
        }
        Ok(tree)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> serde::Deserialize<'de> for OrderedTree<K, V, C>
where
    K: serde::Deserialize<'de> + Clone,
    V: serde::Deserialize<'de> + Clone,
    C: Comparator<K> + Clone + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(OrderedTreeVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// SharedOrderedTree
// =============================================================================

/// A synchronized root cell over the immutable [`OrderedTree`] node algebra.
///
/// Two APIs coexist over one set of nodes: the pure handle API (via
/// [`snapshot`](Self::snapshot)) and this cell API, which holds the current
/// root under a lock. Because nodes are immutable, only the root swap needs
/// synchronization — readers take an O(1) snapshot and then proceed without
/// any lock at all.
///
/// # Examples
///
/// ```rust
/// use balsa::tree::SharedOrderedTree;
///
/// let shared: SharedOrderedTree<i32, &str> = SharedOrderedTree::new();
/// assert_eq!(shared.sync_put(1, "one"), None);
/// assert_eq!(shared.sync_put(1, "ONE"), Some("one"));
/// assert_eq!(shared.get(&1), Some("ONE"));
/// ```
pub struct SharedOrderedTree<K, V, C = NaturalOrder> {
    root: RwLock<OrderedTree<K, V, C>>,
}

impl<K, V, C: Default> SharedOrderedTree<K, V, C> {
    /// Creates an empty shared tree with the default comparator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RwLock::new(OrderedTree::new()),
        }
    }
}

impl<K, V, C> SharedOrderedTree<K, V, C> {
    /// Creates an empty shared tree ordered by the supplied comparator.
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            root: RwLock::new(OrderedTree::with_comparator(comparator)),
        }
    }

    /// Wraps an existing pure handle as the initial committed root.
    #[must_use]
    pub fn from_tree(tree: OrderedTree<K, V, C>) -> Self {
        Self {
            root: RwLock::new(tree),
        }
    }

    /// Returns the number of entries in the current root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.read().len()
    }

    /// Returns `true` if the current root is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.read().is_empty()
    }
}

impl<K, V, C: Clone> SharedOrderedTree<K, V, C> {
    /// Returns an O(1) pure snapshot of the current root.
    ///
    /// The snapshot never changes afterwards, no matter how many
    /// [`sync_put`](Self::sync_put) calls race past it.
    #[must_use]
    pub fn snapshot(&self) -> OrderedTree<K, V, C> {
        self.root.read().clone()
    }
}

impl<K, V: Clone, C: Comparator<K>> SharedOrderedTree<K, V, C> {
    /// Looks up `key` in the current root.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.root.read().get(key).cloned()
    }
}

impl<K: Clone, V: Clone, C: Comparator<K> + Clone> SharedOrderedTree<K, V, C> {
    /// Inserts or replaces an entry by swapping the shared root under the
    /// write lock.
    ///
    /// Returns the pre-existing value when the key was already present
    /// (total weight unchanged by the insertion). Under concurrent calls
    /// for the same key, the returned value is whichever write observed
    /// the key first — existing nodes are immutable, so racing readers
    /// always see a consistent root.
    pub fn sync_put(&self, key: K, value: V) -> Option<V> {
        let mut guard = self.root.write();
        let (next, displaced) = guard.put(key, value);
        *guard = next;
        displaced
    }

    /// Removes an entry by swapping the shared root under the write lock.
    pub fn sync_remove(&self, key: &K) {
        let mut guard = self.root.write();
        let next = guard.remove(key);
        *guard = next;
    }
}

impl<K, V, C: Default> Default for SharedOrderedTree<K, V, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for SharedOrderedTree<K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.read().fmt(formatter)
    }
}

static_assertions::assert_impl_all!(OrderedTree<i32, String>: Send, Sync);
static_assertions::assert_impl_all!(SharedOrderedTree<i32, String>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================
