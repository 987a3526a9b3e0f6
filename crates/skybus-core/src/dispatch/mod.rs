//! Incoming packet demultiplexing: a receiver contract and the
//! [`ProtocolDispatcher`] that fans length-delimited packets out onto
//! per-id shared-buffer queues.

mod dispatcher;
mod receiver;

pub use dispatcher::{DispatcherStatistics, ProtocolDispatcher};
pub use receiver::PacketReceiver;
