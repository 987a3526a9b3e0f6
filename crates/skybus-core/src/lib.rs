//! # skybus-core
//!
//! **Flight-software middleware for on-board computers.**
//!
//! `skybus-core` is a portable foundation layer for spacecraft software:
//! application code written against it runs unchanged on the real-time
//! targets and on simulation hosts. The heart of the crate is zero-copy
//! dataflow on fixed resources — reference-counted buffers from fixed-size
//! pools, routed through a non-blocking software bus with explicit overflow
//! accounting.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use skybus_core::buffer::SharedBufferPool;
//! use skybus_core::swb::{BufferedBusChannel, HeartbeatSource, SoftwareBus};
//! use skybus_core::time::Duration;
//!
//! // A bus over a pool of twenty 1 KiB buffers.
//! let pool = SharedBufferPool::new(1024, 20);
//! let mut bus = SoftwareBus::<u16>::new(
//!     pool,
//!     10,
//!     HeartbeatSource(1),
//!     Duration::milliseconds(100),
//! );
//!
//! // One subscriber channel that accepts every id.
//! let telemetry: Arc<BufferedBusChannel<u16>> = Arc::new(BufferedBusChannel::new(10));
//! bus.register_channel(telemetry.clone());
//!
//! // Publish and route a message.
//! bus.send_message(123, &[1, 2, 3, 4]).unwrap();
//! bus.dispatch_one(Duration::zero());
//!
//! let message = telemetry.receive_message(Duration::zero()).unwrap();
//! assert_eq!(message.id, 123);
//! assert_eq!(&message.payload()[..4], &[1, 2, 3, 4]);
//! ```
//!
//! ## Architecture
//!
//! Producers → SharedBufferPool → SoftwareBus → BufferedBusChannels
//!
//! - [`time`]: microsecond durations, epoch-tagged time points, clocks and
//!   deadlines. Everything blocking takes a `Duration` timeout;
//!   `Duration::myriad()` means "wait forever".
//! - [`container`]: the init-time lists and maps the other layers are wired
//!   with.
//! - [`sync`]: the RTOS-portable primitives (mutex, semaphores, bounded
//!   queue, thread, periodic timer, barrier) in their hosted rendition,
//!   plus the process-wide failure handler for unrecoverable conditions.
//! - [`base`]: saturating slice views, bitfield access in both byte orders,
//!   and the bit-serial append stream.
//! - [`buffer`]: the shared-buffer core — pools, handles, child views,
//!   const views.
//! - [`smpc`]: synchronous typed publish/subscribe with init-time wiring.
//! - [`swb`]: the software bus — filtered, bounded fan-out over shared
//!   buffers.
//! - [`parameter`]: on-board parameters with lock-free reads.
//! - [`dispatch`]: demultiplexing of incoming length-delimited packets onto
//!   per-id buffer queues.
//!
//! Failures are values (`Result` with the crate-wide [`Error`]); fatal
//! conditions route
//! through [`sync::failure`]. After startup, nothing allocates: all runtime
//! storage is pool-backed or caller-provided.

pub mod base;
pub mod buffer;
pub mod container;
pub mod dispatch;
pub mod error;
pub mod parameter;
pub mod smpc;
pub mod swb;
pub mod sync;
pub mod time;

pub use error::Error;

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
