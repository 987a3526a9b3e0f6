//! Counting and binary semaphores.
//!
//! Both types carry the ISR-safe entry points of the RTOS ports as the
//! `acquire_from_isr`/`release_from_isr` pair: never blocking, reporting
//! through `woken` whether a higher-priority task became runnable and the
//! ISR should request a context switch on exit. On the hosted backend the
//! kernel performs wakeups itself, so only `release_from_isr` ever sets the
//! flag. The plain `try_*` operations are ordinary non-blocking attempts
//! for thread context.

use parking_lot::{Condvar, Mutex};

use crate::time::Duration;

/// Counting semaphore.
///
/// Created with an initial count; `acquire` decrements and blocks at zero,
/// `release` increments and wakes one waiter.
pub struct Semaphore {
    count: Mutex<u32>,
    available: Condvar,
}

impl Semaphore {
    pub fn new(initial: u32) -> Self {
        Self {
            count: Mutex::new(initial),
            available: Condvar::new(),
        }
    }

    /// Decrement the count, blocking while it is zero.
    pub fn acquire(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.available.wait(&mut count);
        }
        *count -= 1;
    }

    /// Decrement the count, giving up after `timeout`.
    ///
    /// Returns `true` if the semaphore was acquired. A
    /// [`Duration::myriad`] timeout waits forever.
    pub fn acquire_timeout(&self, timeout: Duration) -> bool {
        if timeout.is_myriad() {
            self.acquire();
            return true;
        }

        let deadline = std::time::Instant::now() + timeout.to_std();
        let mut count = self.count.lock();
        while *count == 0 {
            if self.available.wait_until(&mut count, deadline).timed_out() {
                return false;
            }
        }
        *count -= 1;
        true
    }

    /// Non-blocking decrement from thread context. From interrupt context
    /// use [`acquire_from_isr`](Self::acquire_from_isr).
    pub fn try_acquire(&self) -> bool {
        let mut count = self.count.lock();
        if *count == 0 {
            false
        } else {
            *count -= 1;
            true
        }
    }

    /// Non-blocking decrement; only to be used from within ISRs on RTOS
    /// ports. Returns `true` if the count was greater than zero and the
    /// semaphore was obtained.
    ///
    /// `woken` is set when a higher-priority task became runnable through
    /// the call; acquiring cannot wake anyone on the hosted backend, so the
    /// flag stays `false` here.
    pub fn acquire_from_isr(&self, woken: &mut bool) -> bool {
        *woken = false;
        self.try_acquire()
    }

    /// Increment the count and wake one waiter. Never blocks.
    pub fn release(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_add(1);
        drop(count);
        self.available.notify_one();
    }

    /// Non-blocking increment; only to be used from within ISRs on RTOS
    /// ports. Sets `woken` when a waiter became runnable.
    pub fn release_from_isr(&self, woken: &mut bool) {
        let mut count = self.count.lock();
        *count = count.saturating_add(1);
        drop(count);
        *woken = self.available.notify_one();
    }
}

/// State of a [`BinarySemaphore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryState {
    Acquired,
    Released,
}

/// Binary semaphore: a single token that is either held or available.
///
/// Releasing an already released semaphore is a no-op; the token does not
/// accumulate.
pub struct BinarySemaphore {
    released: Mutex<bool>,
    available: Condvar,
}

impl BinarySemaphore {
    /// Create in the given initial state.
    pub fn new(initial: BinaryState) -> Self {
        Self {
            released: Mutex::new(initial == BinaryState::Released),
            available: Condvar::new(),
        }
    }

    pub fn acquire(&self) {
        let mut released = self.released.lock();
        while !*released {
            self.available.wait(&mut released);
        }
        *released = false;
    }

    /// Acquire with a timeout; `true` on success. A [`Duration::myriad`]
    /// timeout waits forever.
    pub fn acquire_timeout(&self, timeout: Duration) -> bool {
        if timeout.is_myriad() {
            self.acquire();
            return true;
        }

        let deadline = std::time::Instant::now() + timeout.to_std();
        let mut released = self.released.lock();
        while !*released {
            if self.available.wait_until(&mut released, deadline).timed_out() {
                return false;
            }
        }
        *released = false;
        true
    }

    /// Non-blocking acquisition from thread context. From interrupt context
    /// use [`acquire_from_isr`](Self::acquire_from_isr).
    pub fn try_acquire(&self) -> bool {
        let mut released = self.released.lock();
        if *released {
            *released = false;
            true
        } else {
            false
        }
    }

    /// Non-blocking acquisition; only to be used from within ISRs on RTOS
    /// ports. Returns `true` if the token was available and was obtained.
    ///
    /// `woken` is set when a higher-priority task became runnable through
    /// the call; acquiring cannot wake anyone on the hosted backend, so the
    /// flag stays `false` here.
    pub fn acquire_from_isr(&self, woken: &mut bool) -> bool {
        *woken = false;
        self.try_acquire()
    }

    /// Release the token. Releasing a released semaphore does not count.
    pub fn release(&self) {
        let mut released = self.released.lock();
        *released = true;
        drop(released);
        self.available.notify_one();
    }

    /// Non-blocking release; only to be used from within ISRs on RTOS
    /// ports. Sets `woken` when a waiter became runnable.
    pub fn release_from_isr(&self, woken: &mut bool) {
        let mut released = self.released.lock();
        *released = true;
        drop(released);
        *woken = self.available.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn counting_semaphore_counts() {
        let sem = Semaphore::new(2);
        assert!(sem.try_acquire());
        assert!(sem.try_acquire());
        assert!(!sem.try_acquire());

        sem.release();
        assert!(sem.try_acquire());
    }

    #[test]
    fn acquire_timeout_expires_at_zero() {
        let sem = Semaphore::new(0);
        assert!(!sem.acquire_timeout(Duration::milliseconds(10)));
    }

    #[test]
    fn zero_timeout_polls() {
        let sem = Semaphore::new(1);
        assert!(sem.acquire_timeout(Duration::zero()));
        assert!(!sem.acquire_timeout(Duration::zero()));
    }

    #[test]
    fn release_wakes_blocked_acquirer() {
        let sem = Arc::new(Semaphore::new(0));
        let done = Arc::new(AtomicU32::new(0));

        let worker = {
            let sem = Arc::clone(&sem);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                sem.acquire();
                done.fetch_add(1, Ordering::SeqCst);
            })
        };

        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(done.load(Ordering::SeqCst), 0);
        sem.release();

        worker.join().unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn binary_semaphore_does_not_accumulate() {
        let sem = BinarySemaphore::new(BinaryState::Released);
        sem.release();
        sem.release();

        assert!(sem.try_acquire());
        // only one token regardless of how many releases happened
        assert!(!sem.try_acquire());
    }

    #[test]
    fn binary_semaphore_initial_states() {
        let acquired = BinarySemaphore::new(BinaryState::Acquired);
        assert!(!acquired.try_acquire());

        let released = BinarySemaphore::new(BinaryState::Released);
        assert!(released.try_acquire());
    }

    #[test]
    fn binary_acquire_timeout() {
        let sem = BinarySemaphore::new(BinaryState::Acquired);
        assert!(!sem.acquire_timeout(Duration::milliseconds(5)));
        sem.release();
        assert!(sem.acquire_timeout(Duration::milliseconds(5)));
    }

    #[test]
    fn isr_acquire_never_blocks_and_never_wakes() {
        let sem = Semaphore::new(1);
        let mut woken = true;

        assert!(sem.acquire_from_isr(&mut woken));
        assert!(!woken, "acquiring cannot wake a waiter");

        woken = true;
        assert!(!sem.acquire_from_isr(&mut woken));
        assert!(!woken);
    }

    #[test]
    fn binary_isr_pair_round_trips() {
        let sem = BinarySemaphore::new(BinaryState::Acquired);
        let mut woken = true;

        assert!(!sem.acquire_from_isr(&mut woken));
        assert!(!woken);

        sem.release_from_isr(&mut woken);
        assert!(sem.acquire_from_isr(&mut woken));
        assert!(!woken);
    }

    #[test]
    fn isr_release_reports_woken_waiter() {
        let sem = Arc::new(Semaphore::new(0));
        let worker = {
            let sem = Arc::clone(&sem);
            std::thread::spawn(move || sem.acquire())
        };

        // Wait until the worker has very likely parked on the condvar.
        std::thread::sleep(std::time::Duration::from_millis(20));
        let mut woken = false;
        sem.release_from_isr(&mut woken);
        worker.join().unwrap();
        assert!(woken);
    }
}
