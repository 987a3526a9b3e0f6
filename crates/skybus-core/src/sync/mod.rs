//! Concurrency primitives abstracted from the host RTOS.
//!
//! These types fix the *contracts* of the portability layer: the hosted
//! (std) implementation in this module doubles as the POSIX port and is what
//! simulation hosts and the test-suite run on. Blocking happens only in
//! `Mutex::acquire`, the semaphore acquires, `Queue::send`/`receive`,
//! `Thread::sleep`, `PeriodicTimer::next_period` and `Barrier::wait`;
//! everything else is non-blocking.
//!
//! Exactly these operations are legal from interrupt context on the RTOS
//! ports: [`Semaphore::acquire_from_isr`] / [`Semaphore::release_from_isr`],
//! the [`BinarySemaphore`] equivalents, and [`Queue::send_from_isr`]. Each
//! reports through its `woken` flag whether the ISR should request a context
//! switch on exit. No other primitive may be called from an ISR.

pub mod failure;

mod barrier;
mod mutex;
mod periodic_timer;
mod queue;
mod semaphore;
mod thread;

pub use barrier::Barrier;
pub use failure::{FailureCode, fatal, reset_failure_handler, set_failure_handler};
pub use mutex::{Mutex, MutexGuard};
pub use periodic_timer::PeriodicTimer;
pub use queue::Queue;
pub use semaphore::{BinarySemaphore, BinaryState, Semaphore};
pub use thread::{FloatingPointSupport, Thread, ThreadIdentifier};
