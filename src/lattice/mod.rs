//! Lattices and lattice-bounded interval maps.
//!
//! This module provides the [`Lattice`] strategy trait, two concrete
//! lattices ([`BitMaskLattice`] and [`MinMaxLattice`]), and
//! [`BoundingMap`], a map from keys to `[lower, upper]` intervals drawn
//! from a caller-supplied lattice.
//!
//! Bounding maps drive constraint propagation: `meet_put` narrows an upper
//! bound, `join_put` raises a lower bound, and a narrowing that would
//! invert `lower ≤ upper` is rejected with [`EmptyLatticeInterval`] —
//! signalling an unsatisfiable constraint without disturbing the entry.
//! `copy`/`assign` give O(1) snapshot and restore for speculative solving,
//! and [`BoundingMap::dual`] aliases the same storage with the endpoints
//! and operators swapped.
//!
//! # Examples
//!
//! ```rust
//! use balsa::lattice::{BitMaskLattice, BoundingMap};
//!
//! let map: BoundingMap<&str, u64, _> = BoundingMap::new(BitMaskLattice::full());
//! map.meet_put("x", 0b1111).unwrap();
//! map.meet_put("x", 0b1010).unwrap();
//! assert_eq!(map.get_upper(&"x"), Some(0b1010));
//! ```

use std::cmp::Ordering;

mod bitset;
mod bounding;
mod numeric;

pub use bitset::BitMaskLattice;
pub use bounding::BoundingMap;
pub use bounding::EmptyLatticeInterval;
pub use numeric::MinMaxLattice;

/// A bounded lattice over values of type `V`, supplied by the caller.
///
/// `zero` is the bottom element, `one` the top; `meet` computes the
/// greatest lower bound and `join` the least upper bound. [`dual`]
/// produces the operator-swapped view of the same carrier, and
/// [`is_forward`] distinguishes a lattice from its dual at runtime.
///
/// Implementations must satisfy the usual lattice laws: `meet`/`join` are
/// commutative, associative, idempotent, and absorb each other, with
/// `zero`/`one` as their respective identities.
///
/// [`dual`]: Lattice::dual
/// [`is_forward`]: Lattice::is_forward
pub trait Lattice<V>: Clone {
    /// The bottom element (identity of `join`).
    fn zero(&self) -> V;

    /// The top element (identity of `meet`).
    fn one(&self) -> V;

    /// The greatest lower bound of two values.
    fn meet(&self, a: &V, b: &V) -> V;

    /// The least upper bound of two values.
    fn join(&self, a: &V, b: &V) -> V;

    /// The operator-swapped view: meet and join, zero and one exchanged.
    /// `l.dual().dual()` behaves as `l`.
    #[must_use]
    fn dual(&self) -> Self;

    /// `true` for a lattice in its original orientation, `false` for a
    /// dual view.
    fn is_forward(&self) -> bool;

    /// The lattice partial order: `a ≤ b` exactly when `meet(a, b) == a`.
    fn leq(&self, a: &V, b: &V) -> bool
    where
        V: PartialEq,
    {
        self.meet(a, b) == *a
    }

    /// Three-way comparison where defined: `Equal` for equal values,
    /// `Less`/`Greater` where the partial order relates them, `None` for
    /// incomparable values.
    fn partial_cmp(&self, a: &V, b: &V) -> Option<Ordering>
    where
        V: PartialEq,
    {
        match (self.leq(a, b), self.leq(b, a)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}
