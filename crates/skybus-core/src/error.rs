//! Result surface shared by every subsystem.
//!
//! All public operations fail by value: the caller always sees the specific
//! kind of failure as an [`Error`] variant. Nothing in the core panics,
//! throws or logs on the hot path. Conditions that cannot be recovered in
//! flight (thread creation failure, a thread body returning) do not go
//! through this enum at all — they route through the process-wide
//! [failure handler](crate::sync::failure).

use thiserror::Error;

/// Closed enumeration of every failure the core can report by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Error {
    /// Generic invalid request or state.
    #[error("invalid operation")]
    Invalid,

    /// An index or range lies outside the addressed region.
    #[error("out of bounds")]
    OutOfBounds,

    /// A receive operation found no message within the timeout.
    #[error("no message available")]
    NoMessageAvailable,

    /// A send operation could not enqueue (queue full or filter refused).
    #[error("send failed")]
    SendFailed,

    /// No free buffer in the pool, or the target queue is full.
    #[error("no buffer available")]
    NoBufferAvailable,

    /// The payload exceeds the pool element size.
    #[error("message too long")]
    MessageTooLong,

    /// Channel registration is exhausted, or a default channel is already set.
    #[error("maximum number of channels reached")]
    MaxChannelsReached,

    /// Another writer currently holds the parameter write flag.
    #[error("concurrent write in progress")]
    ConcurrentWrite,

    /// The object has not been initialized yet.
    #[error("not initialized")]
    NotInitialized,

    /// A parameter carries the reserved invalid id.
    #[error("invalid parameter")]
    InvalidParameter,

    /// A registered parameter was never initialized.
    #[error("uninitialized parameter")]
    UninitializedParameter,

    /// Two registered parameters share one id.
    #[error("duplicated id")]
    DuplicatedId,

    /// More elements than the fixed capacity allows.
    #[error("too many elements")]
    TooManyElements,

    /// Lookup for an id that is not registered.
    #[error("no such id")]
    NoSuchId,

    /// The stored type does not match the requested one.
    #[error("incorrect type")]
    IncorrectType,
}
