//! N-thread rendezvous.
//!
//! Built from two binary semaphores and a mutex-guarded counter so the same
//! construction works on every concurrency backend, including ports whose
//! native API has no barrier. The wait semaphore gates the release wave; the
//! release semaphore keeps latecomers out until the previous wave has fully
//! drained, which is what makes the barrier reusable.

use parking_lot::Mutex;

use crate::sync::semaphore::{BinarySemaphore, BinaryState};

/// Reusable rendezvous point for a fixed number of threads.
pub struct Barrier {
    counter: Mutex<u32>,
    wait_semaphore: BinarySemaphore,
    release_semaphore: BinarySemaphore,
    max_waiting: u32,
}

impl Barrier {
    /// Create a barrier for `number_of_threads` participants. Zero is
    /// normalized to one (a barrier nobody shares trips immediately).
    pub fn new(number_of_threads: u32) -> Self {
        Self {
            counter: Mutex::new(0),
            wait_semaphore: BinarySemaphore::new(BinaryState::Acquired),
            release_semaphore: BinarySemaphore::new(BinaryState::Released),
            max_waiting: number_of_threads.max(1),
        }
    }

    /// Block until all participants are waiting, then release them together.
    pub fn wait(&self) {
        // Keep newcomers of the next round out until the current release
        // wave has drained.
        self.release_semaphore.acquire();

        let my_number = {
            let mut counter = self.counter.lock();
            *counter += 1;
            *counter
        };

        if my_number < self.max_waiting {
            self.release_semaphore.release();

            // Wait for the release wave, then pass it on.
            self.wait_semaphore.acquire();
            self.wait_semaphore.release();
        } else {
            // Last arrival starts the release wave.
            self.wait_semaphore.release();
        }

        let remaining = {
            let mut counter = self.counter.lock();
            *counter -= 1;
            *counter
        };

        if remaining == 0 {
            // Last one out restores the semaphores to their initial state.
            self.wait_semaphore.acquire();
            self.release_semaphore.release();
        }
    }
}
