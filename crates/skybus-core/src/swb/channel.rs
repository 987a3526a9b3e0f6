//! Bounded subscriber channels.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::Error;
use crate::swb::filter::{Filter, FilterNone};
use crate::swb::message::{BusMessage, MessageId};
use crate::sync::Queue;
use crate::time::Duration;

/// Receiving side of the software bus: anything that can be offered a
/// message. The bus consults [`matches`](BusChannel::matches) before
/// delivering, and the channel filters again on direct sends.
pub trait BusChannel<I: MessageId>: Send + Sync {
    fn matches(&self, message: &BusMessage<I>) -> bool;

    /// Offer a message to the channel. Non-blocking.
    fn send_message(&self, message: BusMessage<I>) -> Result<(), Error>;
}

/// Buffered channel: a fixed-capacity FIFO of messages plus a filter.
///
/// Consumers poll with [`receive_message`](BufferedBusChannel::receive_message);
/// producers (normally the bus dispatcher) deliver through
/// [`BusChannel::send_message`]. All four counters are monotonic:
/// `incoming` counts every offer, `appended` the accepted ones,
/// `failed_receptions` offers lost to a full queue, `retrieved` the
/// messages a consumer has taken out.
pub struct BufferedBusChannel<I: MessageId, F: Filter<I> = FilterNone> {
    queue: Queue<BusMessage<I>>,
    filter: F,
    incoming: AtomicU32,
    appended: AtomicU32,
    failed_receptions: AtomicU32,
    retrieved: AtomicU32,
}

impl<I: MessageId> BufferedBusChannel<I, FilterNone> {
    /// Channel that accepts every id.
    pub fn new(capacity: usize) -> Self {
        Self::with_filter(capacity, FilterNone)
    }
}

impl<I: MessageId, F: Filter<I>> BufferedBusChannel<I, F> {
    pub fn with_filter(capacity: usize, filter: F) -> Self {
        Self {
            queue: Queue::new(capacity),
            filter,
            incoming: AtomicU32::new(0),
            appended: AtomicU32::new(0),
            failed_receptions: AtomicU32::new(0),
            retrieved: AtomicU32::new(0),
        }
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    /// Take one message, waiting up to `timeout`.
    pub fn receive_message(&self, timeout: Duration) -> Result<BusMessage<I>, Error> {
        match self.queue.receive(timeout) {
            Some(message) => {
                self.retrieved.fetch_add(1, Ordering::Relaxed);
                Ok(message)
            }
            None => Err(Error::NoMessageAvailable),
        }
    }

    pub fn current_number_of_messages(&self) -> usize {
        self.queue.len()
    }

    pub fn number_of_incoming_messages(&self) -> u32 {
        self.incoming.load(Ordering::Relaxed)
    }

    pub fn number_of_appended_messages(&self) -> u32 {
        self.appended.load(Ordering::Relaxed)
    }

    pub fn number_of_failed_receptions(&self) -> u32 {
        self.failed_receptions.load(Ordering::Relaxed)
    }

    pub fn number_of_retrieved_messages(&self) -> u32 {
        self.retrieved.load(Ordering::Relaxed)
    }
}

impl<I: MessageId, F: Filter<I>> BusChannel<I> for BufferedBusChannel<I, F> {
    fn matches(&self, message: &BusMessage<I>) -> bool {
        self.filter.matches(message)
    }

    fn send_message(&self, message: BusMessage<I>) -> Result<(), Error> {
        self.incoming.fetch_add(1, Ordering::Relaxed);

        if !self.filter.matches(&message) {
            return Err(Error::SendFailed);
        }

        match self.queue.try_send(message) {
            Ok(()) => {
                self.appended.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(_rejected) => {
                self.failed_receptions.fetch_add(1, Ordering::Relaxed);
                Err(Error::NoBufferAvailable)
            }
        }
    }
}
