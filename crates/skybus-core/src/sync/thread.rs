//! Thread wrapper carrying flight-software scheduling metadata.
//!
//! Priorities are integers 0..=255 with 0 as the lowest non-idle priority.
//! The hosted backend cannot honour fixed priorities and keeps them as
//! metadata; the RTOS ports map them onto the native priority range. Flight
//! threads run forever: a body that returns is a fatal condition.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::sync::failure::{self, FailureCode};
use crate::time::Duration;

/// Whether the thread uses the floating-point unit (ports that must
/// save/restore FPU context lazily need to know up front).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatingPointSupport {
    NoFloatingPoint,
    FloatingPoint,
}

/// Unique identifier of a started thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadIdentifier(u64);

static NEXT_IDENTIFIER: AtomicU64 = AtomicU64::new(1);

/// A fixed-priority thread.
///
/// Construction only records the configuration; [`Thread::start`] hands the
/// body to the scheduler. The body is expected to loop forever — returning
/// from it routes [`FailureCode::ReturnFromThread`] through the failure
/// handler.
pub struct Thread {
    priority: u8,
    stack_size: usize,
    name: String,
    floating_point: FloatingPointSupport,
    identifier: Option<ThreadIdentifier>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl Thread {
    /// Use the platform's default stack size.
    pub const DEFAULT_STACK_SIZE: usize = 0;

    pub fn new(
        priority: u8,
        stack_size: usize,
        name: &str,
        floating_point: FloatingPointSupport,
    ) -> Self {
        Self {
            priority,
            stack_size,
            name: name.to_owned(),
            floating_point,
            identifier: None,
            handle: None,
        }
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn floating_point(&self) -> FloatingPointSupport {
        self.floating_point
    }

    /// Identifier of this thread; `None` until started.
    pub fn identifier(&self) -> Option<ThreadIdentifier> {
        self.identifier
    }

    /// Begin execution of `body`.
    ///
    /// Creation failure and a returning body are both fatal conditions. The
    /// spawned thread is detached — there is no cancellation and no join in
    /// the flight model; threads end with the process.
    pub fn start<F>(&mut self, body: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let identifier = ThreadIdentifier(NEXT_IDENTIFIER.fetch_add(1, Ordering::Relaxed));
        self.identifier = Some(identifier);

        let mut builder = std::thread::Builder::new().name(self.name.clone());
        if self.stack_size != Self::DEFAULT_STACK_SIZE {
            builder = builder.stack_size(self.stack_size);
        }

        log::debug!(
            "starting thread '{}' (priority {}, stack {})",
            self.name,
            self.priority,
            self.stack_size
        );

        let name = self.name.clone();
        let spawned = builder.spawn(move || {
            body();
            log::error!("thread '{name}' returned from its body");
            failure::fatal(FailureCode::ReturnFromThread);
        });

        match spawned {
            Ok(handle) => self.handle = Some(handle),
            Err(_) => failure::fatal(FailureCode::ResourceAllocationFailed),
        }
    }

    /// Suspend the calling thread for `duration`.
    pub fn sleep(duration: Duration) {
        std::thread::sleep(duration.to_std());
    }

    /// Give up the processor but stay runnable.
    pub fn yield_now() {
        std::thread::yield_now();
    }
}
