//! # skybus-testing
//!
//! Deterministic test harness utilities for `skybus-core`: scripted packet
//! sources, single-step bus drivers, recording sinks and collecting
//! subscribers. Everything here exists so middleware tests can run without
//! threads, timers or real links — packets and messages move exactly when
//! the test says so.
//!
//! ```
//! use std::sync::Arc;
//! use skybus_core::buffer::SharedBufferPool;
//! use skybus_core::swb::{BufferedBusChannel, HeartbeatSource, SoftwareBus};
//! use skybus_core::time::Duration;
//! use skybus_testing::TestingSoftwareBus;
//!
//! let pool = SharedBufferPool::new(64, 4);
//! let mut bus = SoftwareBus::<u16>::new(pool, 4, HeartbeatSource(0), Duration::zero());
//! let channel: Arc<BufferedBusChannel<u16>> = Arc::new(BufferedBusChannel::new(4));
//! bus.register_channel(channel.clone());
//!
//! let bus = Arc::new(bus);
//! let testing = TestingSoftwareBus::new(Arc::clone(&bus));
//!
//! bus.send_message(7, &[1, 2, 3]).unwrap();
//! assert!(testing.single_message());
//! assert_eq!(channel.receive_message(Duration::zero()).unwrap().id, 7);
//! ```

mod channel;
mod harness;
mod receiver;

pub use channel::PacketChannel;
pub use harness::{CollectingSubscriber, RecordingHeartbeat, TestingSoftwareBus};
pub use receiver::ScriptedReceiver;
