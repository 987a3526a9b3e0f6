//! Process-wide failure handler for unrecoverable conditions.
//!
//! Invariant violations that cannot be handled in flight — a thread could
//! not be created at startup, a thread body returned, a runtime invariant
//! broke — do not surface as `Result`s. They route through one handler so
//! that integrators can hook their supervision concept (processor reset,
//! safe mode) in a single place. The default handler logs and aborts.

use std::sync::OnceLock;

use parking_lot::RwLock;

/// Reason for a fatal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCode {
    /// An OS resource (thread, semaphore, queue) could not be created.
    ResourceAllocationFailed,
    /// A thread body returned; flight threads must run forever.
    ReturnFromThread,
    /// Generic runtime invariant violation.
    GenericRuntimeError,
    /// Integrator-defined code.
    User(u32),
}

type Handler = Box<dyn Fn(FailureCode) + Send + Sync>;

fn handler_slot() -> &'static RwLock<Handler> {
    static HANDLER: OnceLock<RwLock<Handler>> = OnceLock::new();
    HANDLER.get_or_init(|| RwLock::new(Box::new(default_handler)))
}

fn default_handler(code: FailureCode) {
    log::error!("fatal failure: {code:?}, aborting");
    std::process::abort();
}

/// Install a custom failure handler, returning control of fatal conditions
/// to the integrator. The handler may return, in which case the failing
/// thread continues to its natural end (for [`FailureCode::ReturnFromThread`]
/// that means the thread simply exits).
pub fn set_failure_handler<F>(handler: F)
where
    F: Fn(FailureCode) + Send + Sync + 'static,
{
    *handler_slot().write() = Box::new(handler);
}

/// Restore the aborting default handler.
pub fn reset_failure_handler() {
    *handler_slot().write() = Box::new(default_handler);
}

/// Report a fatal condition through the installed handler.
pub fn fatal(code: FailureCode) {
    let handler = handler_slot().read();
    (*handler)(code);
}
