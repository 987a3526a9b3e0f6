//! Heap-free zero-copy dataflow: pool-backed, reference-counted buffers.
//!
//! A producer allocates a buffer from a [`SharedBufferPool`], fills it while
//! it is uniquely owned, then hands out handles (possibly narrowed to
//! [`SharedChildPtr`] sub-views or frozen to the const variants). Handles
//! flow through queues and across threads without copying bytes; the last
//! handle dropped returns the slot to its pool. Reference counts are the
//! only synchronization a buffer carries — it is not a lock, and concurrent
//! writers must be coordinated by the surrounding protocol.
//!
//! Pools never allocate after construction, and the
//! [`ExternalSharedBufferPool`] variant places the byte storage in a
//! caller-provided memory region for targets with dedicated buffer banks.

mod pointer;
mod pool;

pub use pointer::{
    ConstSharedBufferPtr, ConstSharedChildPtr, SharedBufferPtr, SharedChildPtr,
};
pub use pool::{ExternalSharedBufferPool, SharedBufferPool};
