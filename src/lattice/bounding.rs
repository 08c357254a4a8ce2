//! Lattice-bounded interval map with dual views and O(1) backtracking.

use super::Lattice;
use crate::tree::{Comparator, DualValueTree, NaturalOrder};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Error returned by [`BoundingMap::meet_put`] and
/// [`BoundingMap::join_put`] when the narrowing would invert
/// `lower ≤ upper`. The entry is left unchanged; the caller decides whether
/// this signals an unsatisfiable constraint or a backtrack point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("interval narrowing rejected: new bound would put lower above upper")]
pub struct EmptyLatticeInterval;

/// Shared state behind a bounding map and all of its views.
///
/// Entries are stored in forward orientation: first payload = lower bound,
/// second payload = upper bound. Views reinterpret, never restore.
struct MapCore<K, V, L, C> {
    entries: Mutex<DualValueTree<K, V, V, C>>,
    lattice: L,
}

/// A map from keys to lattice intervals `[lower, upper]`, incrementally
/// narrowed.
///
/// Each entry's interval only shrinks: [`meet_put`](Self::meet_put) lowers
/// the upper bound, [`join_put`](Self::join_put) raises the lower bound,
/// and a mutation that would invert `lower ≤ upper` fails with
/// [`EmptyLatticeInterval`] leaving the entry unchanged — until
/// [`assign`](Self::assign) replaces the whole backing tree, the
/// backtracking primitive for speculative constraint solving.
///
/// A handle is an `Arc`-shared core plus an orientation flag;
/// [`dual`](Self::dual) returns the view with endpoints and operators
/// swapped, aliasing the same storage. The backing store is a
/// [`DualValueTree`], so [`copy`](Self::copy) snapshots in O(1) through
/// structural sharing.
///
/// # Examples
///
/// ```rust
/// use balsa::lattice::{BitMaskLattice, BoundingMap};
///
/// let map: BoundingMap<&str, u64, _> = BoundingMap::new(BitMaskLattice::full());
///
/// map.meet_put("x", 0b1111).unwrap();
/// map.meet_put("x", 0b1010).unwrap();
/// map.meet_put("x", 0b1011).unwrap();
/// assert_eq!(map.get_upper(&"x"), Some(0b1010));
///
/// // The dual view reads the same entry upside down.
/// assert_eq!(map.dual().get(&"x"), map.get_upper(&"x"));
/// ```
pub struct BoundingMap<K, V, L, C = NaturalOrder> {
    core: Arc<MapCore<K, V, L, C>>,
    forward: bool,
}

impl<K, V, L, C: Default> BoundingMap<K, V, L, C> {
    /// Creates an empty forward map over the supplied lattice.
    #[must_use]
    pub fn new(lattice: L) -> Self {
        Self::with_comparator(lattice, C::default())
    }
}

impl<K, V, L, C> BoundingMap<K, V, L, C> {
    /// Creates an empty forward map with an explicit key comparator.
    #[must_use]
    pub fn with_comparator(lattice: L, comparator: C) -> Self {
        Self {
            core: Arc::new(MapCore {
                entries: Mutex::new(DualValueTree::with_comparator(comparator)),
                lattice,
            }),
            forward: true,
        }
    }

    /// Returns the number of bounded keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.entries.lock().len()
    }

    /// Returns `true` if no key is bounded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.core.entries.lock().is_empty()
    }

    /// `true` for the forward map, `false` for its dual view.
    #[must_use]
    pub const fn is_forward(&self) -> bool {
        self.forward
    }

    /// Returns the aliased view with endpoints and lattice operators
    /// swapped.
    ///
    /// The view shares this map's storage, so mutations through either
    /// handle are visible through both. Dualizing is identity-stable:
    /// `m.dual().dual()` is the same view as `m` (see
    /// [`ptr_eq`](Self::ptr_eq)) — no separate wrapper state exists to
    /// construct or invalidate.
    #[must_use]
    pub fn dual(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            forward: !self.forward,
        }
    }

    /// `true` when two handles are the same view over the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core) && self.forward == other.forward
    }
}

impl<K, V, L, C: Clone> BoundingMap<K, V, L, C> {
    /// Returns an O(1) structural-sharing snapshot of the backing tree,
    /// in this view's orientation only insofar as the caller interprets
    /// the payloads: triples are `(key, lower, upper)` of the forward map.
    #[must_use]
    pub fn snapshot(&self) -> DualValueTree<K, V, V, C> {
        self.core.entries.lock().clone()
    }
}

impl<K, V, L, C> BoundingMap<K, V, L, C>
where
    L: Lattice<V>,
{
    /// The lattice of this view: the constructor's lattice for the forward
    /// map, its dual for the dual view.
    #[must_use]
    pub fn lattice(&self) -> L {
        if self.forward {
            self.core.lattice.clone()
        } else {
            self.core.lattice.dual()
        }
    }

    fn view_meet(&self, a: &V, b: &V) -> V {
        if self.forward {
            self.core.lattice.meet(a, b)
        } else {
            self.core.lattice.join(a, b)
        }
    }

    fn view_join(&self, a: &V, b: &V) -> V {
        if self.forward {
            self.core.lattice.join(a, b)
        } else {
            self.core.lattice.meet(a, b)
        }
    }

    fn view_zero(&self) -> V {
        if self.forward {
            self.core.lattice.zero()
        } else {
            self.core.lattice.one()
        }
    }

    fn view_one(&self) -> V {
        if self.forward {
            self.core.lattice.one()
        } else {
            self.core.lattice.zero()
        }
    }

    fn view_leq(&self, a: &V, b: &V) -> bool
    where
        V: PartialEq,
    {
        self.view_meet(a, b) == *a
    }
}

impl<K, V, L, C> BoundingMap<K, V, L, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K>,
{
    /// Returns this view's lower bound for `key` (same as
    /// [`get_lower`](Self::get_lower); the dual view's `get` therefore
    /// reads the forward map's upper bound).
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_lower(key)
    }

    /// Returns this view's lower bound for `key`.
    #[must_use]
    pub fn get_lower(&self, key: &K) -> Option<V> {
        let entries = self.core.entries.lock();
        entries.get(key).map(|(lower, upper)| {
            if self.forward {
                lower.clone()
            } else {
                upper.clone()
            }
        })
    }

    /// Returns this view's upper bound for `key`.
    #[must_use]
    pub fn get_upper(&self, key: &K) -> Option<V> {
        let entries = self.core.entries.lock();
        entries.get(key).map(|(lower, upper)| {
            if self.forward {
                upper.clone()
            } else {
                lower.clone()
            }
        })
    }

    /// Returns `true` if `key` is bounded.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.core.entries.lock().contains_key(key)
    }
}

impl<K, V, L, C> BoundingMap<K, V, L, C>
where
    K: Clone,
    V: Clone + PartialEq,
    L: Lattice<V>,
    C: Comparator<K> + Clone,
{
    /// Narrows the upper bound of `key` to `meet(old_upper, value)`.
    ///
    /// An absent key is seeded with the interval `[zero, value]`. Returns
    /// the new upper bound.
    ///
    /// # Errors
    ///
    /// [`EmptyLatticeInterval`] when the narrowed upper bound would fall
    /// below the lower bound; the entry is left unchanged.
    pub fn meet_put(&self, key: K, value: V) -> Result<V, EmptyLatticeInterval> {
        let mut entries = self.core.entries.lock();
        let current = entries
            .get(&key)
            .map(|(lower, upper)| (lower.clone(), upper.clone()));
        match current {
            Some((stored_lower, stored_upper)) => {
                let (view_lower, view_upper) = if self.forward {
                    (stored_lower, stored_upper)
                } else {
                    (stored_upper, stored_lower)
                };
                let new_upper = self.view_meet(&view_upper, &value);
                if !self.view_leq(&view_lower, &new_upper) {
                    return Err(EmptyLatticeInterval);
                }
                let (first, second) = if self.forward {
                    (view_lower, new_upper.clone())
                } else {
                    (new_upper.clone(), view_lower)
                };
                let next = entries.insert(key, first, second);
                *entries = next;
                Ok(new_upper)
            }
            None => {
                // Seed [zero, value]; bottom bounds everything, so no check.
                let lower = self.view_zero();
                let (first, second) = if self.forward {
                    (lower, value.clone())
                } else {
                    (value.clone(), lower)
                };
                let next = entries.insert(key, first, second);
                *entries = next;
                Ok(value)
            }
        }
    }

    /// Raises the lower bound of `key` to `join(old_lower, value)`.
    ///
    /// An absent key is seeded with the interval `[value, one]`. Returns
    /// the new lower bound.
    ///
    /// # Errors
    ///
    /// [`EmptyLatticeInterval`] when the raised lower bound would exceed
    /// the upper bound; the entry is left unchanged.
    pub fn join_put(&self, key: K, value: V) -> Result<V, EmptyLatticeInterval> {
        let mut entries = self.core.entries.lock();
        let current = entries
            .get(&key)
            .map(|(lower, upper)| (lower.clone(), upper.clone()));
        match current {
            Some((stored_lower, stored_upper)) => {
                let (view_lower, view_upper) = if self.forward {
                    (stored_lower, stored_upper)
                } else {
                    (stored_upper, stored_lower)
                };
                let new_lower = self.view_join(&view_lower, &value);
                if !self.view_leq(&new_lower, &view_upper) {
                    return Err(EmptyLatticeInterval);
                }
                let (first, second) = if self.forward {
                    (new_lower.clone(), view_upper)
                } else {
                    (view_upper, new_lower.clone())
                };
                let next = entries.insert(key, first, second);
                *entries = next;
                Ok(new_lower)
            }
            None => {
                let upper = self.view_one();
                let (first, second) = if self.forward {
                    (value.clone(), upper)
                } else {
                    (upper, value.clone())
                };
                let next = entries.insert(key, first, second);
                *entries = next;
                Ok(value)
            }
        }
    }
}

impl<K, V, L, C> BoundingMap<K, V, L, C>
where
    L: Clone,
    C: Clone,
{
    /// Returns an independent map over the same entries.
    ///
    /// O(1): the backing tree is persistent, so the copy shares all nodes
    /// until either map mutates. The copy has its own core — mutations and
    /// dual views on one side never touch the other.
    #[must_use]
    pub fn copy(&self) -> Self {
        let entries = self.core.entries.lock().clone();
        Self {
            core: Arc::new(MapCore {
                entries: Mutex::new(entries),
                lattice: self.core.lattice.clone(),
            }),
            forward: self.forward,
        }
    }

    /// Replaces this map's entire backing tree with `source`'s.
    ///
    /// This is the backtracking primitive: snapshot with
    /// [`copy`](Self::copy), mutate speculatively, and `assign` the
    /// snapshot back to revert. The replacement is visible through every
    /// view of this map immediately — dual views alias the core, so there
    /// is no cached state to invalidate. Entries transfer verbatim in
    /// storage orientation regardless of either handle's view.
    pub fn assign(&self, source: &Self) {
        if Arc::ptr_eq(&self.core, &source.core) {
            return;
        }
        // Clone outside our own lock so two sequential acquisitions never
        // nest.
        let replacement = source.core.entries.lock().clone();
        *self.core.entries.lock() = replacement;
    }
}

impl<K, V, L, C> fmt::Debug for BoundingMap<K, V, L, C>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.core.entries.lock();
        let mut map = formatter.debug_map();
        for (key, lower, upper) in entries.iter() {
            if self.forward {
                map.entry(&key, &(lower, upper));
            } else {
                map.entry(&key, &(upper, lower));
            }
        }
        map.finish()
    }
}

static_assertions::assert_impl_all!(
    BoundingMap<String, u64, super::BitMaskLattice>: Send, Sync
);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{BitMaskLattice, MinMaxLattice};
    use rstest::rstest;

    fn bit_map() -> BoundingMap<&'static str, u64, BitMaskLattice> {
        BoundingMap::new(BitMaskLattice::full())
    }

    #[rstest]
    fn test_meet_put_narrows_the_upper_bound() {
        let map = bit_map();
        assert_eq!(map.meet_put("x", 0b1111), Ok(0b1111));
        assert_eq!(map.meet_put("x", 0b1010), Ok(0b1010));
        assert_eq!(map.meet_put("x", 0b1011), Ok(0b1010));
        assert_eq!(map.get_upper(&"x"), Some(0b1010));
        assert_eq!(map.get_lower(&"x"), Some(0));
    }

    #[rstest]
    fn test_join_put_raises_the_lower_bound() {
        let map = bit_map();
        assert_eq!(map.join_put("x", 0b0001), Ok(0b0001));
        assert_eq!(map.join_put("x", 0b0100), Ok(0b0101));
        assert_eq!(map.get_lower(&"x"), Some(0b0101));
        assert_eq!(map.get_upper(&"x"), Some(u64::MAX));
    }

    #[rstest]
    fn test_inverting_narrow_fails_and_leaves_entry_unchanged() {
        let map = bit_map();
        map.join_put("x", 0b1100).unwrap();
        map.meet_put("x", 0b1111).unwrap();
        // Upper would drop to 0b0011, strictly below the 0b1100 lower bound.
        assert_eq!(map.meet_put("x", 0b0011), Err(EmptyLatticeInterval));
        assert_eq!(map.get_lower(&"x"), Some(0b1100));
        assert_eq!(map.get_upper(&"x"), Some(0b1111));
        // And symmetrically for an over-raised lower bound.
        let numbers = BoundingMap::<&str, i64, _>::new(MinMaxLattice::new(i64::MIN, i64::MAX));
        numbers.meet_put("n", 10).unwrap();
        assert_eq!(numbers.join_put("n", 11), Err(EmptyLatticeInterval));
        assert_eq!(numbers.get_upper(&"n"), Some(10));
        assert_eq!(numbers.get_lower(&"n"), Some(i64::MIN));
    }

    #[rstest]
    fn test_dual_view_swaps_endpoints_and_shares_storage() {
        let map = bit_map();
        map.meet_put("x", 0b0110).unwrap();
        let dual = map.dual();
        assert!(!dual.is_forward());
        assert_eq!(dual.get(&"x"), map.get_upper(&"x"));
        assert_eq!(dual.get_upper(&"x"), map.get_lower(&"x"));
        // Narrowing through the dual raises the forward lower bound.
        dual.meet_put("x", 0b0100).unwrap();
        assert_eq!(map.get_lower(&"x"), Some(0b0100));
    }

    #[rstest]
    fn test_dual_is_identity_stable() {
        let map = bit_map();
        let round_trip = map.dual().dual();
        assert!(round_trip.ptr_eq(&map));
        assert!(!map.dual().ptr_eq(&map));
        assert!(map.dual().ptr_eq(&map.dual()));
    }

    #[rstest]
    fn test_dual_lattice_is_the_dual() {
        use crate::lattice::Lattice;
        let map = bit_map();
        assert!(map.lattice().is_forward());
        assert!(!map.dual().lattice().is_forward());
    }

    #[rstest]
    fn test_copy_is_independent() {
        let map = bit_map();
        map.meet_put("x", 0b1111).unwrap();
        let copy = map.copy();
        assert!(!copy.ptr_eq(&map));
        assert_eq!(copy.get_upper(&"x"), Some(0b1111));
        map.meet_put("x", 0b0011).unwrap();
        assert_eq!(copy.get_upper(&"x"), Some(0b1111));
        assert_eq!(map.get_upper(&"x"), Some(0b0011));
    }

    #[rstest]
    fn test_assign_restores_a_snapshot() {
        let map = bit_map();
        map.meet_put("x", 0b1111).unwrap();
        map.meet_put("y", 0b0111).unwrap();
        let saved = map.copy();

        map.meet_put("x", 0b0001).unwrap();
        map.join_put("z", 0b1000).unwrap();
        assert_eq!(map.len(), 3);

        map.assign(&saved);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_upper(&"x"), Some(0b1111));
        assert_eq!(map.get_upper(&"y"), Some(0b0111));
        assert_eq!(map.get_upper(&"z"), None);
    }

    #[rstest]
    fn test_assign_to_own_view_is_a_no_op() {
        let map = bit_map();
        map.meet_put("x", 0b1111).unwrap();
        map.assign(&map.dual());
        assert_eq!(map.get_upper(&"x"), Some(0b1111));
    }

    #[rstest]
    fn test_snapshot_exposes_forward_orientation() {
        let map = bit_map();
        map.join_put("x", 0b0001).unwrap();
        let snapshot = map.snapshot();
        assert_eq!(snapshot.get(&"x"), Some((&0b0001, &u64::MAX)));
        snapshot.check_invariants();
    }
}
