//! Bounded multi-producer multi-consumer FIFO.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};

use crate::time::Duration;

/// Bounded FIFO of `T` with a capacity fixed at construction.
///
/// `send` blocks up to its timeout while the queue is full, `receive` blocks
/// up to its timeout while it is empty; both sides are safe for any number
/// of producers and consumers. [`send_from_isr`](Self::send_from_isr) is the
/// one queue operation legal from interrupt context on the RTOS ports;
/// everything else is thread-context only.
pub struct Queue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    capacity: usize,
}

impl<T> Queue<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.rx.len() >= self.capacity
    }

    /// Enqueue `value`, waiting up to `timeout` for space.
    ///
    /// Returns `false` (with the value dropped) if the queue stayed full.
    /// [`Duration::myriad`] waits forever, [`Duration::zero`] polls once.
    pub fn send(&self, value: T, timeout: Duration) -> bool {
        if timeout.is_myriad() {
            return self.tx.send(value).is_ok();
        }
        if timeout.is_zero() {
            return self.tx.try_send(value).is_ok();
        }
        self.tx.send_timeout(value, timeout.to_std()).is_ok()
    }

    /// Non-blocking enqueue from thread context. Returns the value on
    /// failure so the caller can account for it. From interrupt context use
    /// [`send_from_isr`](Self::send_from_isr).
    pub fn try_send(&self, value: T) -> Result<(), T> {
        match self.tx.try_send(value) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(value)) | Err(TrySendError::Disconnected(value)) => Err(value),
        }
    }

    /// Non-blocking enqueue; only to be used from within ISRs on RTOS
    /// ports. Returns the value on failure so the caller can account for
    /// it.
    ///
    /// `woken` is set when a receiver became runnable through the call and
    /// the ISR should request a context switch on exit. The hosted backend
    /// wakes receivers inside the channel itself, so the flag stays `false`
    /// here.
    pub fn send_from_isr(&self, value: T, woken: &mut bool) -> Result<(), T> {
        *woken = false;
        self.try_send(value)
    }

    /// Dequeue one element, waiting up to `timeout`.
    pub fn receive(&self, timeout: Duration) -> Option<T> {
        if timeout.is_myriad() {
            return self.rx.recv().ok();
        }
        if timeout.is_zero() {
            return self.rx.try_recv().ok();
        }
        match self.rx.recv_timeout(timeout.to_std()) {
            Ok(value) => Some(value),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Non-blocking dequeue.
    pub fn try_receive(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}
