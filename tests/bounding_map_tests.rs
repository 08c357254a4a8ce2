//! Integration tests for `BoundingMap` over the provided lattices.

use balsa::lattice::{BitMaskLattice, BoundingMap, EmptyLatticeInterval, Lattice, MinMaxLattice};
use rstest::rstest;
use std::sync::Arc;
use std::thread;

// =============================================================================
// Bit-Mask Lattice Scenarios
// =============================================================================

#[rstest]
fn test_bitmask_meet_put_chain() {
    let map: BoundingMap<&str, u64, _> = BoundingMap::new(BitMaskLattice::full());
    map.meet_put("x", 0b1111).unwrap();
    map.meet_put("x", 0b1010).unwrap();
    map.meet_put("x", 0b1011).unwrap();
    assert_eq!(map.get_upper(&"x"), Some(0b1010));
}

#[rstest]
fn test_meet_put_composes_with_meet() {
    let bits = BitMaskLattice::full();
    let map: BoundingMap<&str, u64, _> = BoundingMap::new(bits);
    let old = 0b1111_0000u64;
    let v1 = 0b1010_1010u64;
    let v2 = 0b1100_1100u64;
    map.meet_put("k", old).unwrap();
    map.meet_put("k", v1).unwrap();
    map.meet_put("k", v2).unwrap();
    assert_eq!(
        map.get_upper(&"k"),
        Some(bits.meet(&bits.meet(&old, &v1), &v2))
    );
}

#[rstest]
fn test_numeric_interval_narrows_from_both_ends() {
    let map: BoundingMap<char, i64, _> =
        BoundingMap::new(MinMaxLattice::new(i64::MIN, i64::MAX));
    map.meet_put('n', 100).unwrap();
    map.join_put('n', 10).unwrap();
    map.meet_put('n', 50).unwrap();
    map.join_put('n', 20).unwrap();
    assert_eq!(map.get_lower(&'n'), Some(20));
    assert_eq!(map.get_upper(&'n'), Some(50));

    // Narrowing past the other end is rejected and changes nothing.
    assert_eq!(map.meet_put('n', 19), Err(EmptyLatticeInterval));
    assert_eq!(map.join_put('n', 51), Err(EmptyLatticeInterval));
    assert_eq!(map.get_lower(&'n'), Some(20));
    assert_eq!(map.get_upper(&'n'), Some(50));
}

// =============================================================================
// Dual View Tests
// =============================================================================

#[rstest]
fn test_dual_identity_and_swapped_reads() {
    let map: BoundingMap<&str, u64, _> = BoundingMap::new(BitMaskLattice::full());
    map.join_put("x", 0b0011).unwrap();

    let dual = map.dual();
    assert!(map.is_forward());
    assert!(!dual.is_forward());
    assert!(dual.dual().ptr_eq(&map));
    assert_eq!(dual.get(&"x"), map.get_upper(&"x"));
    assert_eq!(dual.get_lower(&"x"), map.get_upper(&"x"));
    assert_eq!(dual.get_upper(&"x"), map.get_lower(&"x"));
}

#[rstest]
fn test_dual_mutations_are_visible_through_the_forward_map() {
    let map: BoundingMap<&str, u64, _> = BoundingMap::new(BitMaskLattice::new(0b1111));
    let dual = map.dual();

    // meet_put through the dual narrows the dual's upper bound, which is
    // the forward lower bound raised by OR.
    dual.meet_put("x", 0b0101).unwrap();
    assert_eq!(map.get_lower(&"x"), Some(0b0101));
    assert_eq!(map.get_upper(&"x"), Some(0b1111));
}

// =============================================================================
// Copy / Assign (Backtracking) Tests
// =============================================================================

#[rstest]
fn test_copy_then_assign_restores_key_by_key_state() {
    let map: BoundingMap<i32, i64, _> =
        BoundingMap::new(MinMaxLattice::new(i64::MIN, i64::MAX));
    for key in 0..20 {
        map.meet_put(key, i64::from(key) * 10).unwrap();
    }
    let saved = map.copy();

    // Speculate: narrow some intervals, add some keys, fail one.
    for key in 0..10 {
        map.meet_put(key, 1).unwrap();
    }
    map.join_put(99, 5).unwrap();
    assert!(map.meet_put(99, 4).is_err());

    map.assign(&saved);
    assert_eq!(map.len(), saved.len());
    for key in 0..20 {
        assert_eq!(map.get_upper(&key), saved.get_upper(&key));
        assert_eq!(map.get_lower(&key), saved.get_lower(&key));
    }
    assert_eq!(map.get_upper(&99), None);
}

#[rstest]
fn test_copy_is_order_one_but_independent() {
    let map: BoundingMap<i32, u64, _> = BoundingMap::new(BitMaskLattice::full());
    for key in 0..100 {
        map.meet_put(key, u64::MAX >> (key % 16)).unwrap();
    }
    let copy = map.copy();
    map.meet_put(0, 1).unwrap();
    assert_eq!(map.get_upper(&0), Some(1));
    assert_ne!(copy.get_upper(&0), Some(1));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[rstest]
fn test_concurrent_narrowing_reaches_the_combined_meet() {
    let map: Arc<BoundingMap<u32, u64, BitMaskLattice>> =
        Arc::new(BoundingMap::new(BitMaskLattice::full()));
    map.meet_put(7, u64::MAX).unwrap();

    let handles: Vec<_> = (0..8u64)
        .map(|bit| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                // Each thread clears one bit; meets commute, so the final
                // upper bound is independent of interleaving.
                map.meet_put(7, u64::MAX & !(1 << bit)).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(map.get_upper(&7), Some(u64::MAX & !0xFF));
}
