//! Non-recursive mutex with scoped acquisition.

use crate::time::Duration;

/// Non-recursive mutual exclusion primitive.
///
/// The lock carries no data: it protects whatever the surrounding structure
/// says it protects, matching the RTOS-port contract. Re-acquiring from the
/// owning thread deadlocks; release happens through the guard on every exit
/// path.
pub struct Mutex {
    inner: parking_lot::Mutex<()>,
}

impl Mutex {
    pub const fn new() -> Self {
        Self {
            inner: parking_lot::Mutex::new(()),
        }
    }

    /// Block until the mutex is owned.
    pub fn acquire(&self) -> MutexGuard<'_> {
        MutexGuard {
            _guard: self.inner.lock(),
        }
    }

    /// Try to acquire within `timeout`. A [`Duration::myriad`] timeout waits
    /// forever; zero polls once.
    pub fn acquire_timeout(&self, timeout: Duration) -> Option<MutexGuard<'_>> {
        if timeout.is_myriad() {
            return Some(self.acquire());
        }
        self.inner
            .try_lock_for(timeout.to_std())
            .map(|guard| MutexGuard { _guard: guard })
    }

    /// Non-blocking acquisition attempt.
    pub fn try_acquire(&self) -> Option<MutexGuard<'_>> {
        self.inner.try_lock().map(|guard| MutexGuard { _guard: guard })
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped acquisition: the mutex is released when the guard drops, on every
/// exit path.
pub struct MutexGuard<'a> {
    _guard: parking_lot::MutexGuard<'a, ()>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn guard_releases_on_drop() {
        let mutex = Mutex::new();
        {
            let _guard = mutex.acquire();
            assert!(mutex.try_acquire().is_none());
        }
        assert!(mutex.try_acquire().is_some());
    }

    #[test]
    fn timeout_expires_while_held() {
        let mutex = Mutex::new();
        let _guard = mutex.acquire();
        assert!(mutex.acquire_timeout(Duration::milliseconds(10)).is_none());
    }

    #[test]
    fn myriad_timeout_blocks_until_available() {
        let mutex = Arc::new(Mutex::new());
        let counter = Arc::new(AtomicU32::new(0));

        let guard = mutex.acquire();
        let worker = {
            let mutex = Arc::clone(&mutex);
            let counter = Arc::clone(&counter);
            std::thread::spawn(move || {
                let _guard = mutex.acquire_timeout(Duration::myriad()).unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
            })
        };

        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        drop(guard);

        worker.join().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn exclusion_under_contention() {
        let mutex = Arc::new(Mutex::new());
        let counter = Arc::new(AtomicU32::new(0));
        let mut workers = Vec::new();

        for _ in 0..4 {
            let mutex = Arc::clone(&mutex);
            let counter = Arc::clone(&counter);
            workers.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    let _guard = mutex.acquire();
                    let value = counter.load(Ordering::Relaxed);
                    counter.store(value + 1, Ordering::Relaxed);
                }
            }));
        }

        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 4000);
    }
}
