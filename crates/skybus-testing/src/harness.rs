//! Single-step drivers and recording sinks.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use skybus_core::swb::{HeartbeatSink, HeartbeatSource, MessageId, SoftwareBus};
use skybus_core::time::Duration;

/// Drives a [`SoftwareBus`] one message at a time, replacing the dispatcher
/// thread in unit tests.
pub struct TestingSoftwareBus<I: MessageId> {
    bus: Arc<SoftwareBus<I>>,
}

impl<I: MessageId> TestingSoftwareBus<I> {
    pub fn new(bus: Arc<SoftwareBus<I>>) -> Self {
        Self { bus }
    }

    /// Route exactly one input message, if one is queued. Returns whether a
    /// message was handled.
    pub fn single_message(&self) -> bool {
        self.bus.dispatch_one(Duration::zero())
    }

    /// Route input messages until the queue is empty; returns how many were
    /// handled.
    pub fn drain(&self) -> usize {
        let mut handled = 0;
        while self.single_message() {
            handled += 1;
        }
        handled
    }
}

/// Heartbeat sink that records every report for later inspection.
#[derive(Default)]
pub struct RecordingHeartbeat {
    reports: AtomicU32,
    last: Mutex<Option<(HeartbeatSource, Duration)>>,
}

impl RecordingHeartbeat {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn number_of_reports(&self) -> u32 {
        self.reports.load(Ordering::SeqCst)
    }

    pub fn last_report(&self) -> Option<(HeartbeatSource, Duration)> {
        *self.last.lock()
    }
}

impl HeartbeatSink for RecordingHeartbeat {
    fn report(&self, source: HeartbeatSource, timeout: Duration) {
        *self.last.lock() = Some((source, timeout));
        self.reports.fetch_add(1, Ordering::SeqCst);
    }
}

/// Collects published values for assertion; the subscriber-side counterpart
/// of [`PacketChannel`](crate::PacketChannel).
pub struct CollectingSubscriber<T: Clone + Send + 'static> {
    received: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone + Send + 'static> CollectingSubscriber<T> {
    pub fn new() -> Self {
        Self {
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Callback to hand to `Subscription::new` / `with_registry`.
    pub fn callback(&self) -> impl Fn(&T) + Send + Sync + 'static {
        let sink = Arc::clone(&self.received);
        move |value: &T| sink.lock().push(value.clone())
    }

    pub fn received(&self) -> Vec<T> {
        self.received.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.received.lock().len()
    }
}

impl<T: Clone + Send + 'static> Default for CollectingSubscriber<T> {
    fn default() -> Self {
        Self::new()
    }
}
