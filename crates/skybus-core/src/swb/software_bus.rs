//! The central message router.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::base::CopyFrom;
use crate::buffer::{ConstSharedBufferPtr, SharedBufferPool};
use crate::error::Error;
use crate::swb::channel::BusChannel;
use crate::swb::message::{BusMessage, MessageId};
use crate::sync::{FloatingPointSupport, Queue, Thread};
use crate::time::Duration;

/// Tag identifying a dispatcher in liveness telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeartbeatSource(pub u16);

/// Receives the dispatcher's periodic liveness signal.
///
/// `timeout` is the declared worst-case interval until the next report; a
/// supervisor that has not heard from `source` within it may assume the
/// dispatcher is stuck.
pub trait HeartbeatSink: Send + Sync {
    fn report(&self, source: HeartbeatSource, timeout: Duration);
}

/// How `send_buffer` treats the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    /// Enqueue the handle as-is; the payload bytes are never copied.
    ZeroCopy,
    /// Copy the payload into a fresh buffer from the bus pool, so the bus
    /// owns the payload lifetime.
    CopyOnce,
}

/// Non-blocking pub/sub router.
///
/// One bus owns an input queue and an input buffer pool. Producers enqueue
/// from any thread; one dispatcher (a dedicated thread, or a test driving
/// [`dispatch_one`](SoftwareBus::dispatch_one)) drains the queue and fans
/// each message out to the registered channels whose filter matches, or to
/// the default channel when none does.
///
/// Registration is a distinct phase: channels are added through `&mut self`
/// before the bus is shared, and are only read afterwards.
///
/// Everything observable is a monotonic counter; the bus never logs or
/// blocks on the message path (the bounded queues absorb or shed load).
pub struct SoftwareBus<I: MessageId> {
    pool: SharedBufferPool,
    input: Queue<BusMessage<I>>,
    channels: Vec<Arc<dyn BusChannel<I>>>,
    default_channel: Option<Arc<dyn BusChannel<I>>>,
    heartbeat_source: HeartbeatSource,
    heartbeat_timeout: Duration,
    heartbeat_sink: Option<Arc<dyn HeartbeatSink>>,
    accepted: AtomicU32,
    failed_copies: AtomicU32,
    failed_sends: AtomicU32,
    handled: AtomicU32,
    forwarded: AtomicU32,
    defaulted: AtomicU32,
    declined: AtomicU32,
}

impl<I: MessageId> SoftwareBus<I> {
    /// Create a bus over `pool` with an input queue of `input_capacity`
    /// messages. `heartbeat_timeout` is the declared dispatch interval
    /// reported with every heartbeat.
    pub fn new(
        pool: SharedBufferPool,
        input_capacity: usize,
        heartbeat_source: HeartbeatSource,
        heartbeat_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            input: Queue::new(input_capacity),
            channels: Vec::new(),
            default_channel: None,
            heartbeat_source,
            heartbeat_timeout,
            heartbeat_sink: None,
            accepted: AtomicU32::new(0),
            failed_copies: AtomicU32::new(0),
            failed_sends: AtomicU32::new(0),
            handled: AtomicU32::new(0),
            forwarded: AtomicU32::new(0),
            defaulted: AtomicU32::new(0),
            declined: AtomicU32::new(0),
        }
    }

    /// Attach the liveness sink the dispatcher reports to.
    pub fn set_heartbeat_sink(&mut self, sink: Arc<dyn HeartbeatSink>) {
        self.heartbeat_sink = Some(sink);
    }

    /// Register a subscriber channel. Registration happens before dispatch
    /// starts; once the bus is shared, channels are only read.
    pub fn register_channel(&mut self, channel: Arc<dyn BusChannel<I>>) {
        log::debug!("bus channel {} registered", self.channels.len());
        self.channels.push(channel);
    }

    /// Install the channel that receives unmatched messages.
    ///
    /// At most one default channel exists; a second call fails with
    /// [`Error::MaxChannelsReached`] and the first assignment stays.
    pub fn set_default_channel(&mut self, channel: Arc<dyn BusChannel<I>>) -> Result<(), Error> {
        if self.default_channel.is_some() {
            return Err(Error::MaxChannelsReached);
        }
        self.default_channel = Some(channel);
        Ok(())
    }

    pub fn number_of_channels(&self) -> usize {
        self.channels.len()
    }

    /// Copy `payload` into a pool buffer and enqueue it under `id`.
    ///
    /// Empty payloads enqueue a signal message without touching the pool.
    pub fn send_message(&self, id: I, payload: &[u8]) -> Result<(), Error> {
        if payload.len() > self.pool.element_size() {
            self.failed_copies.fetch_add(1, Ordering::Relaxed);
            return Err(Error::MessageTooLong);
        }

        let buffer = if payload.is_empty() {
            None
        } else {
            let Some(mut buffer) = self.pool.allocate() else {
                self.failed_copies.fetch_add(1, Ordering::Relaxed);
                return Err(Error::NoBufferAvailable);
            };
            buffer.as_mut_slice().copy_from(payload);
            Some(buffer.into())
        };

        self.enqueue(BusMessage::new(id, buffer))
    }

    /// Enqueue a caller-owned buffer under `id`.
    ///
    /// With [`CopyMode::ZeroCopy`] the handle is enqueued as-is; the
    /// reference the message holds keeps the payload alive regardless of
    /// what the caller does with its own handles. With
    /// [`CopyMode::CopyOnce`] the payload is copied into a fresh buffer
    /// from the bus pool first.
    pub fn send_buffer(
        &self,
        id: I,
        buffer: Option<ConstSharedBufferPtr>,
        mode: CopyMode,
    ) -> Result<(), Error> {
        let buffer = match (mode, buffer) {
            (_, None) => None,
            (CopyMode::ZeroCopy, Some(buffer)) => Some(buffer),
            (CopyMode::CopyOnce, Some(source)) => {
                if source.len() > self.pool.element_size() {
                    self.failed_copies.fetch_add(1, Ordering::Relaxed);
                    return Err(Error::MessageTooLong);
                }
                let Some(mut copy) = self.pool.allocate() else {
                    self.failed_copies.fetch_add(1, Ordering::Relaxed);
                    return Err(Error::NoBufferAvailable);
                };
                copy.as_mut_slice().copy_from(source.as_slice());
                Some(copy.into())
            }
        };

        self.enqueue(BusMessage::new(id, buffer))
    }

    /// Enqueue a prebuilt message as-is (zero-copy).
    pub fn send(&self, message: BusMessage<I>) -> Result<(), Error> {
        self.enqueue(message)
    }

    fn enqueue(&self, message: BusMessage<I>) -> Result<(), Error> {
        match self.input.try_send(message) {
            Ok(()) => {
                self.accepted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(_rejected) => {
                self.failed_sends.fetch_add(1, Ordering::Relaxed);
                Err(Error::SendFailed)
            }
        }
    }

    /// Route one input message; the single-step entry point for tests and
    /// the body of the dispatcher loop.
    ///
    /// Returns `false` when no message arrived within `timeout` (a no-op).
    pub fn dispatch_one(&self, timeout: Duration) -> bool {
        let Some(message) = self.input.receive(timeout) else {
            return false;
        };
        self.handled.fetch_add(1, Ordering::Relaxed);

        let mut matched = false;
        let mut delivered = false;
        for channel in &self.channels {
            if channel.matches(&message) {
                matched = true;
                if channel.send_message(message.clone()).is_ok() {
                    delivered = true;
                }
                // a full channel only counts on that channel; the bus
                // continues with the remaining ones
            }
        }

        if delivered {
            self.forwarded.fetch_add(1, Ordering::Relaxed);
        }

        if !matched {
            let defaulted = self
                .default_channel
                .as_ref()
                .filter(|channel| channel.matches(&message))
                .is_some_and(|channel| channel.send_message(message.clone()).is_ok());
            if defaulted {
                self.defaulted.fetch_add(1, Ordering::Relaxed);
            } else {
                // nobody wanted it: the message and its buffer drop here
                self.declined.fetch_add(1, Ordering::Relaxed);
            }
        }

        true
    }

    /// Current depth of the input queue.
    pub fn input_queue_depth(&self) -> usize {
        self.input.len()
    }

    pub fn number_of_accepted_messages(&self) -> u32 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn number_of_failed_copy_operations(&self) -> u32 {
        self.failed_copies.load(Ordering::Relaxed)
    }

    pub fn number_of_failed_send_operations(&self) -> u32 {
        self.failed_sends.load(Ordering::Relaxed)
    }

    pub fn number_of_handled_messages(&self) -> u32 {
        self.handled.load(Ordering::Relaxed)
    }

    pub fn number_of_forwarded_messages(&self) -> u32 {
        self.forwarded.load(Ordering::Relaxed)
    }

    pub fn number_of_defaulted_messages(&self) -> u32 {
        self.defaulted.load(Ordering::Relaxed)
    }

    pub fn number_of_declined_messages(&self) -> u32 {
        self.declined.load(Ordering::Relaxed)
    }

    /// Run the dispatcher loop on a dedicated thread.
    ///
    /// Registration must be complete: the bus is shared from here on. Each
    /// iteration waits up to the heartbeat timeout for input and then
    /// reports liveness, so a silent bus still heartbeats.
    pub fn start(bus: Arc<Self>, priority: u8, stack_size: usize) -> Thread {
        let mut thread = Thread::new(
            priority,
            stack_size,
            "swb-dispatch",
            FloatingPointSupport::NoFloatingPoint,
        );
        log::debug!(
            "software bus dispatcher starting ({} channels, default {})",
            bus.number_of_channels(),
            bus.default_channel.is_some()
        );
        thread.start(move || {
            loop {
                bus.dispatch_one(bus.heartbeat_timeout);
                if let Some(sink) = &bus.heartbeat_sink {
                    sink.report(bus.heartbeat_source, bus.heartbeat_timeout * 2);
                }
            }
        });
        thread
    }
}
