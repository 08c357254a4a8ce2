//! # balsa
//!
//! Persistent weight-balanced search trees, lattice interval maps, and
//! transactional memoization.
//!
//! ## Overview
//!
//! This library provides the storage core for constraint-propagation and
//! incremental-construction workloads:
//!
//! - **Persistent trees**: [`tree::OrderedTree`], [`tree::SetTree`],
//!   [`tree::PairKeyTree`], [`tree::DualValueTree`], and
//!   [`tree::EquivalenceTree`] — applicative weight-balanced search trees
//!   with O(log n) operations, order statistics, and O(1) structural-sharing
//!   snapshots.
//! - **Lattice interval maps**: [`lattice::BoundingMap`] narrows a
//!   `[lower, upper]` interval per key over a caller-supplied
//!   [`lattice::Lattice`], with an aliased dual view and O(1) backtracking.
//! - **Memoization**: [`memo::Memoizer`] and [`memo::TransactionalMemoizer`]
//!   cache lazily-constructed values, the latter isolating possibly-recursive
//!   construction from concurrent readers via copy-on-write shadow snapshots.
//!
//! All tree handles are cheap values: cloning shares the root, mutation
//! returns a new handle, and every previously returned handle stays valid
//! and consistent without coordination.
//!
//! ## Feature Flags
//!
//! - `tree`: persistent tree families (default)
//! - `lattice`: lattices and bounding maps (default, implies `tree`)
//! - `memo`: memoizers (default, implies `tree`)
//! - `serde`: `Serialize`/`Deserialize` for the natural-order trees
//!
//! ## Example
//!
//! ```rust
//! use balsa::tree::OrderedTree;
//!
//! let tree: OrderedTree<&str, i32> = OrderedTree::new()
//!     .insert("b", 2)
//!     .insert("a", 1)
//!     .insert("c", 3);
//!
//! assert_eq!(tree.get(&"a"), Some(&1));
//! assert_eq!(tree.index_of(&"a"), 0);
//! // Absent keys report their insertion rank as a bitwise complement.
//! assert_eq!(!tree.index_of(&"z"), 3);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use balsa::prelude::*;
/// ```
pub mod prelude {

    #[cfg(feature = "tree")]
    pub use crate::tree::*;

    #[cfg(feature = "lattice")]
    pub use crate::lattice::*;

    #[cfg(feature = "memo")]
    pub use crate::memo::*;
}

#[cfg(feature = "tree")]
pub mod tree;

#[cfg(feature = "lattice")]
pub mod lattice;

#[cfg(feature = "memo")]
pub mod memo;
