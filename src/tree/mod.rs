//! Persistent (applicative) weight-balanced search trees.
//!
//! This module provides a family of immutable search trees that use
//! structural sharing to make snapshots free:
//!
//! - [`OrderedTree`]: key → value map with order statistics and rank search
//! - [`SetTree`]: key-only tree with split/join-based set algebra
//! - [`PairKeyTree`]: [`OrderedTree`] over lexicographic composite keys
//! - [`DualValueTree`]: [`OrderedTree`] variant with two payloads per key
//! - [`EquivalenceTree`]: lookup keys canonicalized through a translator
//!
//! # Structural Sharing
//!
//! Nodes are never mutated after construction. A "put" or "remove" returns
//! a new handle whose root chains to fresh nodes along the search path and
//! shares every unaffected subtree with the original. Cloning a handle is
//! O(1); any previously returned handle remains valid and consistent, even
//! across threads.
//!
//! # Weight Balance
//!
//! Every node tracks the size of its subtree (`weight`). A child may not
//! outweigh its sibling by more than a per-family shift factor; rebalancing
//! happens on the way out of an insert or delete with the classic single /
//! double rotation tie-break. The key/value families tolerate roughly 2×
//! skew; [`SetTree`] deliberately tolerates 4× in exchange for cheaper
//! split/join.
//!
//! # Examples
//!
//! ```rust
//! use balsa::tree::OrderedTree;
//!
//! let tree = OrderedTree::new().insert(2, "two").insert(1, "one");
//! let newer = tree.insert(3, "three");
//!
//! assert_eq!(tree.len(), 2);   // Original unchanged
//! assert_eq!(newer.len(), 3);  // New version
//! ```
//!
//! ```rust
//! use balsa::tree::SetTree;
//!
//! let evens: SetTree<i32> = (0..10).step_by(2).collect();
//! let small: SetTree<i32> = (0..5).collect();
//!
//! let both = evens.intersection(&small);
//! assert_eq!(both.iter().copied().collect::<Vec<_>>(), vec![0, 2, 4]);
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type for tree nodes.
///
/// Handles are expected to cross threads (the shared root cells, bounding
/// maps, and memoizers all hand snapshots between threads), so nodes are
/// always `Arc`-backed.
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

mod compare;
mod dual_value;
mod equivalence;
mod ordered;
mod pair;
mod set;

pub use compare::Comparator;
pub use compare::LexicographicComparator;
pub use compare::NaturalOrder;
pub use dual_value::DualValueTree;
pub use equivalence::EquivalenceResolver;
pub use equivalence::EquivalenceTree;
pub use equivalence::EquivalenceTreeIterator;
pub use ordered::OrderedTree;
pub use ordered::OrderedTreeIterator;
pub use ordered::RankError;
pub use ordered::SharedOrderedTree;
pub use pair::PairKeyTree;
pub use set::SetTree;
pub use set::SetTreeIterator;

// =============================================================================
// Tests
// =============================================================================
