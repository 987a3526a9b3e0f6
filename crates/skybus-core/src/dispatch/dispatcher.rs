//! Incoming packet demultiplexer.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::base::CopyFrom;
use crate::buffer::{SharedBufferPool, SharedBufferPtr};
use crate::dispatch::receiver::PacketReceiver;
use crate::swb::{HeartbeatSink, HeartbeatSource, MessageId};
use crate::sync::{FloatingPointSupport, Queue, Thread};
use crate::time::Duration;

/// Dispatcher-level counters, shared so they stay observable after the
/// dispatcher moved onto its thread.
#[derive(Default)]
pub struct DispatcherStatistics {
    dropped: AtomicU32,
    overflowed_bytes: AtomicU32,
    partial: AtomicU32,
    unmatched: AtomicU32,
}

impl DispatcherStatistics {
    pub fn number_of_dropped_packages(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn number_of_overflowed_bytes(&self) -> u32 {
        self.overflowed_bytes.load(Ordering::Relaxed)
    }

    pub fn number_of_partial_packages(&self) -> u32 {
        self.partial.load(Ordering::Relaxed)
    }

    pub fn number_of_unmatched_packages(&self) -> u32 {
        self.unmatched.load(Ordering::Relaxed)
    }
}

struct Route<I: MessageId> {
    id: Option<I>,
    pool: SharedBufferPool,
    queue: Arc<Queue<SharedBufferPtr>>,
    drop_incomplete: bool,
    dropped: AtomicU32,
    overflowed_bytes: AtomicU32,
    partial: AtomicU32,
}

/// Demultiplexes length-delimited packets onto per-id buffer queues.
///
/// Each received packet is inspected for its leading id and copied into a
/// pool buffer for *every* matching registration (several queues may listen
/// on one id, one queue may serve several ids). Packets nobody matches go
/// to the default route if one is set, otherwise they count as unmatched.
///
/// Truncation is tracked at two levels: a packet larger than the scratch
/// buffer counts on the dispatcher (`partial`/`overflowed`), and a packet
/// larger than a target pool's element additionally counts on that queue.
/// Registrations made with `drop_incomplete` discard packets that would
/// arrive truncated instead of forwarding the fragment.
pub struct ProtocolDispatcher<I: MessageId> {
    receiver: Box<dyn PacketReceiver>,
    scratch: Box<[u8]>,
    max_queues: usize,
    routes: Vec<Route<I>>,
    default_route: Option<Route<I>>,
    statistics: Arc<DispatcherStatistics>,
    heartbeat_source: HeartbeatSource,
    heartbeat_sink: Option<Arc<dyn HeartbeatSink>>,
    receive_timeout: Duration,
}

impl<I: MessageId> ProtocolDispatcher<I> {
    /// Create a dispatcher reading from `receiver` through the
    /// caller-provided `scratch` buffer, accepting at most `max_queues`
    /// registrations.
    pub fn new(
        receiver: Box<dyn PacketReceiver>,
        scratch: Box<[u8]>,
        max_queues: usize,
        heartbeat_source: HeartbeatSource,
        receive_timeout: Duration,
    ) -> Self {
        Self {
            receiver,
            scratch,
            max_queues,
            routes: Vec::new(),
            default_route: None,
            statistics: Arc::new(DispatcherStatistics::default()),
            heartbeat_source,
            heartbeat_sink: None,
            receive_timeout,
        }
    }

    /// Shared handle onto the dispatcher-level counters.
    pub fn statistics(&self) -> Arc<DispatcherStatistics> {
        Arc::clone(&self.statistics)
    }

    pub fn set_heartbeat_sink(&mut self, sink: Arc<dyn HeartbeatSink>) {
        self.heartbeat_sink = Some(sink);
    }

    /// Register `(pool, queue)` for packets starting with `id`.
    ///
    /// Duplicate ids and shared queues are legal. Returns `false` once
    /// `max_queues` registrations exist.
    pub fn add_queue(
        &mut self,
        id: I,
        pool: &SharedBufferPool,
        queue: &Arc<Queue<SharedBufferPtr>>,
        drop_incomplete: bool,
    ) -> bool {
        if self.routes.len() >= self.max_queues {
            return false;
        }
        log::debug!("packet queue registered for id {id:?}");
        self.routes.push(Route {
            id: Some(id),
            pool: pool.clone(),
            queue: Arc::clone(queue),
            drop_incomplete,
            dropped: AtomicU32::new(0),
            overflowed_bytes: AtomicU32::new(0),
            partial: AtomicU32::new(0),
        });
        true
    }

    /// Install the route for packets no registration matches. Returns
    /// `false` if a default is already set; the first assignment stays.
    pub fn set_default_queue(
        &mut self,
        pool: &SharedBufferPool,
        queue: &Arc<Queue<SharedBufferPtr>>,
    ) -> bool {
        if self.default_route.is_some() {
            return false;
        }
        self.default_route = Some(Route {
            id: None,
            pool: pool.clone(),
            queue: Arc::clone(queue),
            drop_incomplete: false,
            dropped: AtomicU32::new(0),
            overflowed_bytes: AtomicU32::new(0),
            partial: AtomicU32::new(0),
        });
        true
    }

    pub fn number_of_dropped_packages(&self) -> u32 {
        self.statistics.number_of_dropped_packages()
    }

    pub fn number_of_overflowed_bytes(&self) -> u32 {
        self.statistics.number_of_overflowed_bytes()
    }

    pub fn number_of_partial_packages(&self) -> u32 {
        self.statistics.number_of_partial_packages()
    }

    pub fn number_of_unmatched_packages(&self) -> u32 {
        self.statistics.number_of_unmatched_packages()
    }

    fn per_queue_sum<F>(&self, queue: &Arc<Queue<SharedBufferPtr>>, read: F) -> u32
    where
        F: Fn(&Route<I>) -> u32,
    {
        self.routes
            .iter()
            .chain(self.default_route.as_ref())
            .filter(|route| Arc::ptr_eq(&route.queue, queue))
            .map(read)
            .sum()
    }

    /// Packets dropped on routes feeding `queue`.
    pub fn number_of_dropped_packages_for(&self, queue: &Arc<Queue<SharedBufferPtr>>) -> u32 {
        self.per_queue_sum(queue, |route| route.dropped.load(Ordering::Relaxed))
    }

    /// Bytes lost to truncation on routes feeding `queue`.
    pub fn number_of_overflowed_bytes_for(&self, queue: &Arc<Queue<SharedBufferPtr>>) -> u32 {
        self.per_queue_sum(queue, |route| route.overflowed_bytes.load(Ordering::Relaxed))
    }

    /// Truncated packets forwarded on routes feeding `queue`.
    pub fn number_of_partial_packages_for(&self, queue: &Arc<Queue<SharedBufferPtr>>) -> u32 {
        self.per_queue_sum(queue, |route| route.partial.load(Ordering::Relaxed))
    }

    /// Receive and route one packet; the single-step entry point for tests
    /// and the body of the dispatcher loop.
    ///
    /// Returns `false` when the receiver produced nothing.
    pub fn handle_package(&mut self, timeout: Duration) -> bool {
        let received = self.receiver.receive(&mut self.scratch, timeout) as usize;
        if received == 0 {
            return false;
        }

        let copied = received.min(self.scratch.len());
        if received > self.scratch.len() {
            self.statistics
                .overflowed_bytes
                .fetch_add((received - self.scratch.len()) as u32, Ordering::Relaxed);
            self.statistics.partial.fetch_add(1, Ordering::Relaxed);
        }

        let packet_id = I::from_wire(&self.scratch[..copied]);

        let mut matched = false;
        for route in &self.routes {
            if route.id == packet_id && packet_id.is_some() {
                matched = true;
                Self::deliver(&self.statistics, route, &self.scratch[..copied], received);
            }
        }

        if !matched {
            match &self.default_route {
                Some(route) => {
                    Self::deliver(&self.statistics, route, &self.scratch[..copied], received);
                }
                None => {
                    self.statistics.unmatched.fetch_add(1, Ordering::Relaxed);
                    self.statistics.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        true
    }

    fn deliver(
        statistics: &DispatcherStatistics,
        route: &Route<I>,
        payload: &[u8],
        received: usize,
    ) {
        let stored = payload.len().min(route.pool.element_size());

        if route.drop_incomplete && stored < received {
            route.dropped.fetch_add(1, Ordering::Relaxed);
            statistics.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let Some(mut buffer) = route.pool.allocate() else {
            route.dropped.fetch_add(1, Ordering::Relaxed);
            statistics.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };
        buffer.as_mut_slice().copy_from(&payload[..stored]);

        if route.queue.try_send(buffer).is_err() {
            // the rejected buffer drops here and its slot returns to the pool
            route.dropped.fetch_add(1, Ordering::Relaxed);
            statistics.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        if stored < received {
            route.partial.fetch_add(1, Ordering::Relaxed);
            route
                .overflowed_bytes
                .fetch_add((received - stored) as u32, Ordering::Relaxed);
        }
    }

    /// Run the receive/demux loop on a dedicated thread, reporting
    /// liveness after every receive cycle. Registration must be complete.
    pub fn start(mut self, priority: u8, stack_size: usize, name: &str) -> Thread {
        let mut thread = Thread::new(priority, stack_size, name, FloatingPointSupport::NoFloatingPoint);
        log::debug!(
            "protocol dispatcher starting ({} routes, default {})",
            self.routes.len(),
            self.default_route.is_some()
        );
        thread.start(move || {
            loop {
                self.handle_package(self.receive_timeout);
                if let Some(sink) = &self.heartbeat_sink {
                    sink.report(self.heartbeat_source, self.receive_timeout * 2);
                }
            }
        });
        thread
    }
}
