use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

/// Advisory lock serializing write transactions against one store.
///
/// Held for exactly one write transaction through a scoped guard; dropping
/// the guard releases it on every exit path, including errors and panics.
#[derive(Debug, Default)]
pub struct StoreLock {
    inner: Mutex<()>,
}

/// Proof that the holder has exclusive write access to the store.
#[derive(Debug)]
pub struct StoreLockGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl StoreLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock is free, then hold it until the guard drops.
    ///
    /// The lock protects no data, so a guard dropped during a panic leaves
    /// nothing inconsistent behind and poisoning is ignored.
    pub fn acquire(&self) -> StoreLockGuard<'_> {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        StoreLockGuard { _guard: guard }
    }

    /// Whether some guard is currently alive.
    pub fn is_held(&self) -> bool {
        matches!(self.inner.try_lock(), Err(TryLockError::WouldBlock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn guard_releases_on_drop() {
        let lock = StoreLock::new();
        {
            let _guard = lock.acquire();
            assert!(lock.is_held());
        }
        assert!(!lock.is_held());
    }

    #[test]
    fn released_after_panic() {
        let lock = Arc::new(StoreLock::new());
        let cloned = Arc::clone(&lock);
        let result = thread::spawn(move || {
            let _guard = cloned.acquire();
            panic!("writer failed mid-transaction");
        })
        .join();

        assert!(result.is_err());
        assert!(!lock.is_held());
        let _guard = lock.acquire();
    }

    #[test]
    fn holders_never_overlap() {
        let lock = Arc::new(StoreLock::new());
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let active = Arc::clone(&active);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    for _ in 0..5 {
                        let _guard = lock.acquire();
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(1));
                        active.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
