//! Memoizer implementations: racy keep-first and reentrant transactional.

use crate::tree::{Comparator, NaturalOrder, OrderedTree};
use parking_lot::{ReentrantMutex, RwLock};
use std::cell::RefCell;
use std::fmt;

// =============================================================================
// Memoizer (default variant)
// =============================================================================

/// A lazy-factory cache with a lock-free read path and keep-first commits.
///
/// [`make`](Self::make) returns the committed value for a key, running the
/// supplied factory on a miss. Concurrent first accesses may each run the
/// factory, but only one result is committed; every caller returns the
/// committed one. Use [`TransactionalMemoizer`] instead when the factory
/// itself memoizes other keys on the same cache.
///
/// # Examples
///
/// ```rust
/// use balsa::memo::Memoizer;
///
/// let memo: Memoizer<&str, usize> = Memoizer::new();
/// let len = memo.make("key", (), |key, ()| Ok::<_, ()>(key.len())).unwrap();
/// assert_eq!(len, 3);
/// ```
pub struct Memoizer<K, V, C = NaturalOrder> {
    committed: RwLock<OrderedTree<K, V, C>>,
}

impl<K, V, C: Default> Memoizer<K, V, C> {
    /// Creates an empty cache with the default key comparator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            committed: RwLock::new(OrderedTree::new()),
        }
    }
}

impl<K, V, C> Memoizer<K, V, C> {
    /// Creates an empty cache with an explicit key comparator.
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            committed: RwLock::new(OrderedTree::with_comparator(comparator)),
        }
    }

    /// Returns the number of committed values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.committed.read().len()
    }

    /// Returns `true` if nothing has been committed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.committed.read().is_empty()
    }
}

impl<K, V, C: Clone> Memoizer<K, V, C> {
    /// Returns an O(1) snapshot of the committed tree.
    #[must_use]
    pub fn snapshot(&self) -> OrderedTree<K, V, C> {
        self.committed.read().clone()
    }
}

impl<K: Clone, V: Clone, C: Comparator<K> + Clone> Memoizer<K, V, C> {
    /// Returns the committed value for `key` if present.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.committed.read().get(key).cloned()
    }

    /// Returns the committed value for `key`, invoking `factory` on a miss.
    ///
    /// The factory runs outside any lock, so it may block or take long
    /// without stalling other keys; under a first-access race it may run
    /// more than once, and whichever result commits first is returned to
    /// every caller.
    ///
    /// # Errors
    ///
    /// Propagates the factory's error; nothing is committed in that case.
    pub fn make<P, E, F>(&self, key: K, param: P, factory: F) -> Result<V, E>
    where
        F: FnOnce(&K, P) -> Result<V, E>,
    {
        if let Some(value) = self.committed.read().get(&key) {
            return Ok(value.clone());
        }
        let value = factory(&key, param)?;
        let mut guard = self.committed.write();
        if let Some(winner) = guard.get(&key) {
            // Another thread committed while the factory ran.
            return Ok(winner.clone());
        }
        let (next, _displaced) = guard.put(key, value.clone());
        *guard = next;
        Ok(value)
    }
}

impl<K, V, C: Default> Default for Memoizer<K, V, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for Memoizer<K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.committed.read().fmt(formatter)
    }
}

// =============================================================================
// TransactionalMemoizer (locking variant)
// =============================================================================

/// Clears the shadow slot on every exit path of an outermost transaction.
/// The commit path takes the shadow out first, so the reset only ever
/// clears leftovers from error or panic unwinds.
struct ShadowReset<'a, T> {
    slot: &'a RefCell<Option<T>>,
}

impl<T> Drop for ShadowReset<'_, T> {
    fn drop(&mut self) {
        self.slot.replace(None);
    }
}

/// A lazy-factory cache whose construction runs inside a reentrant shadow
/// transaction, isolating possibly-recursive writers from readers.
///
/// On a miss the calling thread takes the transaction lock, clones the
/// committed tree into a private shadow, and runs the factory against it.
/// Re-entry by the same thread (a factory memoizing further keys) finds
/// the shadow installed and reads/writes it directly; other threads block
/// on the lock until the transaction commits or rolls back. Readers whose
/// key is already committed never touch the lock at all.
///
/// On success the shadow becomes the committed snapshot; on failure the
/// shadow is discarded — scoped guards release the lock and clear the
/// shadow on every exit path, including panics — and the prior commit
/// stays intact.
///
/// See the [module docs](crate::memo) for the cross-memoizer deadlock
/// hazard.
pub struct TransactionalMemoizer<K, V, C = NaturalOrder> {
    committed: RwLock<OrderedTree<K, V, C>>,
    transaction: ReentrantMutex<RefCell<Option<OrderedTree<K, V, C>>>>,
}

impl<K, V, C: Default> TransactionalMemoizer<K, V, C> {
    /// Creates an empty cache with the default key comparator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            committed: RwLock::new(OrderedTree::new()),
            transaction: ReentrantMutex::new(RefCell::new(None)),
        }
    }
}

impl<K, V, C> TransactionalMemoizer<K, V, C> {
    /// Creates an empty cache with an explicit key comparator.
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            committed: RwLock::new(OrderedTree::with_comparator(comparator)),
            transaction: ReentrantMutex::new(RefCell::new(None)),
        }
    }

    /// Returns the number of committed values. In-flight shadow writes are
    /// not visible here until their transaction commits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.committed.read().len()
    }

    /// Returns `true` if nothing has been committed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.committed.read().is_empty()
    }
}

impl<K, V, C: Clone> TransactionalMemoizer<K, V, C> {
    /// Returns an O(1) snapshot of the committed tree.
    #[must_use]
    pub fn snapshot(&self) -> OrderedTree<K, V, C> {
        self.committed.read().clone()
    }
}

impl<K: Clone, V: Clone, C: Comparator<K> + Clone> TransactionalMemoizer<K, V, C> {
    /// Returns the committed value for `key` if present, without touching
    /// the transaction lock.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.committed.read().get(key).cloned()
    }

    /// Returns the memoized value for `key`, invoking `factory` inside a
    /// shadow transaction on a miss.
    ///
    /// The factory may recursively call [`make`](Self::make) on the same
    /// memoizer; those frames read and write the shadow directly. At most
    /// one value is ever committed per key — when an inner frame already
    /// built this key, its value wins and the outer result is dropped.
    ///
    /// # Errors
    ///
    /// Propagates the factory's error; the shadow is discarded and the
    /// prior commit is untouched.
    pub fn make<P, E, F>(&self, key: K, param: P, factory: F) -> Result<V, E>
    where
        F: FnOnce(&K, P) -> Result<V, E>,
    {
        // Fast path: committed snapshots are never mutated, so a read lock
        // held only for the descent suffices.
        if let Some(value) = self.committed.read().get(&key) {
            return Ok(value.clone());
        }

        let guard = self.transaction.lock();
        let outermost = guard.borrow().is_none();
        if outermost {
            let snapshot = self.committed.read().clone();
            *guard.borrow_mut() = Some(snapshot);
        }

        // The shadow may already hold the key: another thread committed it
        // while we waited for the lock, or an earlier frame of this
        // transaction built it.
        let shadow_hit = guard
            .borrow()
            .as_ref()
            .and_then(|shadow| shadow.get(&key).cloned());
        if let Some(value) = shadow_hit {
            if outermost {
                // Nothing new to build; close the transaction.
                guard.replace(None);
            }
            return Ok(value);
        }

        if outermost {
            let reset = ShadowReset { slot: &*guard };
            let value = factory(&key, param)?;
            let shadow = reset.slot.borrow_mut().take();
            let tree = match shadow {
                Some(tree) => tree,
                // The factory cleared the slot through a nested path that
                // never runs for well-formed factories; fall back to the
                // committed tree rather than lose the transaction.
                None => self.committed.read().clone(),
            };
            let (next, displaced) = tree.put(key, value.clone());
            let committed = if displaced.is_some() { tree } else { next };
            *self.committed.write() = committed;
            Ok(displaced.unwrap_or(value))
        } else {
            // Nested frame of the same thread: construct against the
            // shadow in place; the outermost frame commits or discards.
            let value = factory(&key, param)?;
            let mut slot = guard.borrow_mut();
            if let Some(shadow) = slot.as_mut() {
                let (next, displaced) = shadow.put(key, value.clone());
                if let Some(prior) = displaced {
                    return Ok(prior);
                }
                *shadow = next;
            }
            Ok(value)
        }
    }
}

impl<K, V, C: Default> Default for TransactionalMemoizer<K, V, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for TransactionalMemoizer<K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.committed.read().fmt(formatter)
    }
}

static_assertions::assert_impl_all!(Memoizer<i32, String>: Send, Sync);
static_assertions::assert_impl_all!(TransactionalMemoizer<i32, String>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;

    #[rstest]
    fn test_memoizer_caches_the_first_commit() {
        let memo: Memoizer<i32, i32> = Memoizer::new();
        let runs = Cell::new(0);
        let build = |key: &i32, ()| {
            runs.set(runs.get() + 1);
            Ok::<_, ()>(key * 2)
        };
        assert_eq!(memo.make(21, (), build), Ok(42));
        assert_eq!(memo.make(21, (), build), Ok(42));
        assert_eq!(runs.get(), 1);
        assert_eq!(memo.len(), 1);
    }

    #[rstest]
    fn test_memoizer_error_commits_nothing() {
        let memo: Memoizer<i32, i32> = Memoizer::new();
        let result = memo.make(1, (), |_, ()| Err::<i32, _>("boom"));
        assert_eq!(result, Err("boom"));
        assert!(memo.is_empty());
        assert_eq!(memo.make(1, (), |key, ()| Ok::<_, &str>(*key)), Ok(1));
    }

    #[rstest]
    fn test_transactional_memoizer_basic_hit_and_miss() {
        let memo: TransactionalMemoizer<&str, usize> = TransactionalMemoizer::new();
        assert_eq!(memo.get(&"a"), None);
        assert_eq!(memo.make("a", (), |key, ()| Ok::<_, ()>(key.len())), Ok(1));
        assert_eq!(memo.get(&"a"), Some(1));
        assert_eq!(memo.make("a", (), |_, ()| Err(())), Ok(1));
    }

    #[rstest]
    fn test_recursive_factory_completes_on_one_thread() {
        let memo: TransactionalMemoizer<u32, u64> = TransactionalMemoizer::new();

        fn fib(memo: &TransactionalMemoizer<u32, u64>, n: u32) -> Result<u64, ()> {
            memo.make(n, (), |&n, ()| {
                if n < 2 {
                    Ok(u64::from(n))
                } else {
                    Ok(fib(memo, n - 1)? + fib(memo, n - 2)?)
                }
            })
        }

        assert_eq!(fib(&memo, 20), Ok(6765));
        // Every intermediate value was committed by the one transaction.
        assert_eq!(memo.len(), 21);
        assert_eq!(memo.get(&10), Some(55));
        memo.snapshot().check_invariants();
    }

    #[rstest]
    fn test_failed_transaction_discards_the_shadow() {
        let memo: TransactionalMemoizer<u32, u32> = TransactionalMemoizer::new();
        memo.make(1, (), |_, ()| Ok::<_, &str>(10)).unwrap();

        let result = memo.make(2, (), |_, ()| {
            // A nested success lands in the shadow...
            memo.make(3, (), |_, ()| Ok(30))?;
            // ...then the outer construction fails.
            Err::<u32, _>("boom")
        });
        assert_eq!(result, Err("boom"));

        // The prior commit stands; the shadow writes are gone.
        assert_eq!(memo.len(), 1);
        assert_eq!(memo.get(&1), Some(10));
        assert_eq!(memo.get(&3), None);

        // And the memoizer still works afterwards.
        assert_eq!(memo.make(2, (), |_, ()| Ok::<_, &str>(20)), Ok(20));
    }

    #[rstest]
    fn test_shadow_survives_panicking_factory() {
        let memo: std::sync::Arc<TransactionalMemoizer<u32, u32>> =
            std::sync::Arc::new(TransactionalMemoizer::new());
        memo.make(1, (), |_, ()| Ok::<_, ()>(10)).unwrap();

        let panicking = std::sync::Arc::clone(&memo);
        let outcome = std::thread::spawn(move || {
            let _ = panicking.make(2, (), |_, ()| -> Result<u32, ()> {
                panic!("factory exploded")
            });
        })
        .join();
        assert!(outcome.is_err());

        // The transaction rolled back and the lock was released.
        assert_eq!(memo.len(), 1);
        assert_eq!(memo.make(2, (), |_, ()| Ok::<_, ()>(20)), Ok(20));
    }
}
