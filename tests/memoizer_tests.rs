//! Integration tests for the memoizers, including multi-threaded and
//! recursive construction.

use balsa::memo::{Memoizer, TransactionalMemoizer};
use rstest::rstest;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

// =============================================================================
// Agreement Under Contention
// =============================================================================

#[rstest]
fn test_default_memoizer_concurrent_callers_observe_equal_values() {
    let memo: Arc<Memoizer<u32, (u32, usize)>> = Arc::new(Memoizer::new());
    let runs = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8usize)
        .map(|thread_id| {
            let memo = Arc::clone(&memo);
            let runs = Arc::clone(&runs);
            thread::spawn(move || {
                memo.make(7, thread_id, |&key, thread_id| {
                    // Tag the value with the builder so disagreement shows.
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>((key * 2, thread_id))
                })
                .unwrap()
            })
        })
        .collect();

    let observed: Vec<(u32, usize)> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    // The factory may have raced, but exactly one result was committed and
    // every caller returned it.
    for value in &observed {
        assert_eq!(value, &observed[0]);
    }
    assert_eq!(memo.get(&7), Some(observed[0]));
    assert!(runs.load(Ordering::SeqCst) >= 1);
}

#[rstest]
fn test_transactional_memoizer_concurrent_callers_observe_equal_values() {
    let memo: Arc<TransactionalMemoizer<u32, usize>> = Arc::new(TransactionalMemoizer::new());

    let handles: Vec<_> = (0..8usize)
        .map(|thread_id| {
            let memo = Arc::clone(&memo);
            thread::spawn(move || memo.make(1, (), |_, ()| Ok::<_, ()>(thread_id)).unwrap())
        })
        .collect();

    let observed: Vec<usize> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    for value in &observed {
        assert_eq!(value, &observed[0]);
    }
    assert_eq!(memo.len(), 1);
}

// =============================================================================
// Recursive Construction
// =============================================================================

fn fib(memo: &TransactionalMemoizer<u32, u64>, n: u32) -> Result<u64, ()> {
    memo.make(n, (), |&n, ()| {
        if n < 2 {
            Ok(u64::from(n))
        } else {
            Ok(fib(memo, n - 1)? + fib(memo, n - 2)?)
        }
    })
}

#[rstest]
fn test_recursive_factory_completes_without_deadlock() {
    let memo: TransactionalMemoizer<u32, u64> = TransactionalMemoizer::new();
    assert_eq!(fib(&memo, 30), Ok(832_040));
    assert_eq!(memo.len(), 31);
}

#[rstest]
fn test_recursive_factories_under_thread_contention() {
    let memo: Arc<TransactionalMemoizer<u32, u64>> = Arc::new(TransactionalMemoizer::new());

    let handles: Vec<_> = (0..4u32)
        .map(|offset| {
            let memo = Arc::clone(&memo);
            thread::spawn(move || fib(&memo, 20 + offset).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(memo.get(&20), Some(6765));
    assert_eq!(memo.len(), 24);
    memo.snapshot().check_invariants();
}

// =============================================================================
// Readers During Transactions
// =============================================================================

#[rstest]
fn test_readers_never_block_on_an_open_transaction() {
    let memo: Arc<TransactionalMemoizer<u32, u32>> = Arc::new(TransactionalMemoizer::new());
    memo.make(1, (), |_, ()| Ok::<_, ()>(10)).unwrap();

    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let writer = {
        let memo = Arc::clone(&memo);
        thread::spawn(move || {
            memo.make(2, (), move |_, ()| {
                // Hold the transaction open until the reader has finished.
                release_rx.recv().map_err(|_| ())?;
                Ok::<_, ()>(20)
            })
        })
    };

    // Committed reads go through the snapshot, not the transaction lock.
    let reader = {
        let memo = Arc::clone(&memo);
        thread::spawn(move || memo.get(&1))
    };
    assert_eq!(reader.join().unwrap(), Some(10));

    release_tx.send(()).unwrap();
    assert_eq!(writer.join().unwrap(), Ok(20));
    assert_eq!(memo.get(&2), Some(20));
}
