//! SWB — the software message bus.
//!
//! Producers push `(id, payload)` messages into one shared input queue;
//! the dispatcher routes each message to every registered
//! [`BufferedBusChannel`] whose filter matches, falling back to an optional
//! default channel. Payloads travel as reference-counted pool buffers, so a
//! fan-out to N channels costs N handle clones and zero byte copies.

mod channel;
mod filter;
mod message;
mod software_bus;

pub use channel::{BufferedBusChannel, BusChannel};
pub use filter::{BusSubscription, Filter, FilterNone, RangeFilter, SubscriptionFilter};
pub use message::{BusMessage, MessageId};
pub use software_bus::{CopyMode, HeartbeatSink, HeartbeatSource, SoftwareBus};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::buffer::{ConstSharedBufferPtr, SharedBufferPool};
    use crate::error::Error;
    use crate::time::Duration;

    type MessageIdType = u16;

    fn test_bus(pool: &SharedBufferPool) -> SoftwareBus<MessageIdType> {
        SoftwareBus::new(
            pool.clone(),
            10,
            HeartbeatSource(123),
            Duration::milliseconds(100),
        )
    }

    fn allocated(pool: &SharedBufferPool) -> ConstSharedBufferPtr {
        pool.allocate().unwrap().into()
    }

    fn patterned_payload() -> [u8; 16] {
        let mut payload = [0u8; 16];
        for (i, byte) in payload.iter_mut().enumerate() {
            *byte = i as u8;
        }
        payload
    }

    #[test]
    fn fresh_bus_has_zero_counters() {
        let pool = SharedBufferPool::new(1024, 20);
        let bus = test_bus(&pool);

        assert_eq!(bus.number_of_accepted_messages(), 0);
        assert_eq!(bus.number_of_channels(), 0);
        assert_eq!(bus.number_of_failed_copy_operations(), 0);
        assert_eq!(bus.number_of_failed_send_operations(), 0);
        assert_eq!(bus.number_of_declined_messages(), 0);
        assert_eq!(bus.number_of_defaulted_messages(), 0);
    }

    #[test]
    fn sending_without_channels_is_accepted() {
        let pool = SharedBufferPool::new(1024, 20);
        let bus = test_bus(&pool);

        assert_eq!(bus.send(BusMessage::new(0, Some(allocated(&pool)))), Ok(()));
        assert_eq!(bus.number_of_accepted_messages(), 1);

        // signal without buffer is equally legal
        assert_eq!(bus.send(BusMessage::signal(0)), Ok(()));
        assert_eq!(bus.number_of_accepted_messages(), 2);
        assert_eq!(bus.number_of_failed_send_operations(), 0);
    }

    #[test]
    fn zero_copy_send_does_not_touch_the_pool() {
        let pool = SharedBufferPool::new(1024, 20);
        let bus = test_bus(&pool);

        assert_eq!(bus.send_buffer(0, None, CopyMode::ZeroCopy), Ok(()));
        assert_eq!(pool.number_of_free_elements(), 20);

        let buffer = allocated(&pool);
        assert_eq!(pool.number_of_free_elements(), 19);
        assert_eq!(bus.send_buffer(0, Some(buffer), CopyMode::ZeroCopy), Ok(()));
        assert_eq!(pool.number_of_free_elements(), 19);
        assert_eq!(bus.number_of_accepted_messages(), 2);
    }

    #[test]
    fn copy_once_takes_a_pool_element() {
        let pool = SharedBufferPool::new(1024, 20);
        let bus = test_bus(&pool);

        assert_eq!(bus.send_buffer(0, None, CopyMode::CopyOnce), Ok(()));
        assert_eq!(pool.number_of_free_elements(), 20);

        let buffer = allocated(&pool);
        assert_eq!(pool.number_of_free_elements(), 19);
        assert_eq!(bus.send_buffer(0, Some(buffer), CopyMode::CopyOnce), Ok(()));
        assert_eq!(pool.number_of_free_elements(), 18);
    }

    #[test]
    fn copy_once_fails_when_the_pool_is_exhausted() {
        let source_pool = SharedBufferPool::new(1024, 20);
        let bus_pool = SharedBufferPool::new(1024, 5);
        let bus = SoftwareBus::<MessageIdType>::new(
            bus_pool.clone(),
            10,
            HeartbeatSource(123),
            Duration::milliseconds(100),
        );

        for i in 0..5 {
            let buffer = allocated(&source_pool);
            assert_eq!(bus.send_buffer(0, Some(buffer), CopyMode::CopyOnce), Ok(()));
            assert_eq!(bus_pool.number_of_free_elements(), 4 - i);
        }
        assert_eq!(bus.number_of_accepted_messages(), 5);

        let buffer = allocated(&source_pool);
        assert_eq!(
            bus.send_buffer(0, Some(buffer), CopyMode::CopyOnce),
            Err(Error::NoBufferAvailable)
        );
        assert_eq!(bus.number_of_accepted_messages(), 5);
        assert_eq!(bus.number_of_failed_copy_operations(), 1);
        assert_eq!(bus.number_of_failed_send_operations(), 0);

        // draining the queue returns the copies to the bus pool
        while bus.dispatch_one(Duration::zero()) {}
        assert_eq!(bus.number_of_handled_messages(), 5);
        assert_eq!(bus.number_of_forwarded_messages(), 0);
        assert_eq!(bus_pool.number_of_free_elements(), 5);
    }

    #[test]
    fn empty_slice_sends_without_allocating() {
        let pool = SharedBufferPool::new(1024, 20);
        let bus = test_bus(&pool);

        assert_eq!(bus.send_message(0, &[]), Ok(()));
        assert_eq!(pool.number_of_free_elements(), 20);
        assert_eq!(bus.number_of_accepted_messages(), 1);
    }

    #[test]
    fn overlong_slice_is_a_failed_copy() {
        let pool = SharedBufferPool::new(1024, 20);
        let bus = test_bus(&pool);

        let payload = vec![0u8; 1025];
        assert_eq!(bus.send_message(0, &payload), Err(Error::MessageTooLong));
        assert_eq!(pool.number_of_free_elements(), 20);
        assert_eq!(bus.number_of_accepted_messages(), 0);
        assert_eq!(bus.number_of_failed_copy_operations(), 1);
    }

    #[test]
    fn unroutable_message_is_declined_and_releases_its_buffer() {
        let pool = SharedBufferPool::new(1024, 20);
        let bus = test_bus(&pool);

        let payload = [7u8; 128];
        assert_eq!(bus.send_message(0, &payload), Ok(()));
        assert_eq!(pool.number_of_free_elements(), 19);

        assert!(bus.dispatch_one(Duration::zero()));
        assert_eq!(bus.number_of_handled_messages(), 1);
        assert_eq!(bus.number_of_forwarded_messages(), 0);
        assert_eq!(bus.number_of_defaulted_messages(), 0);
        assert_eq!(bus.number_of_declined_messages(), 1);
        assert_eq!(pool.number_of_free_elements(), 20);
    }

    #[test]
    fn fan_out_to_all_matching_channels() {
        let pool = SharedBufferPool::new(1024, 20);
        let mut bus = test_bus(&pool);

        let channel1: Arc<BufferedBusChannel<MessageIdType>> =
            Arc::new(BufferedBusChannel::new(10));
        let channel2: Arc<BufferedBusChannel<MessageIdType>> =
            Arc::new(BufferedBusChannel::new(10));
        bus.register_channel(channel1.clone());
        bus.register_channel(channel2.clone());
        assert_eq!(bus.number_of_channels(), 2);

        let payload = patterned_payload();
        assert_eq!(bus.send_message(123, &payload), Ok(()));
        assert_eq!(bus.number_of_handled_messages(), 0);

        assert!(bus.dispatch_one(Duration::zero()));
        assert_eq!(bus.number_of_accepted_messages(), 1);
        assert_eq!(bus.number_of_handled_messages(), 1);
        assert_eq!(bus.number_of_forwarded_messages(), 1);
        assert_eq!(bus.number_of_defaulted_messages(), 0);

        for channel in [&channel1, &channel2] {
            assert_eq!(channel.current_number_of_messages(), 1);
            let message = channel.receive_message(Duration::zero()).unwrap();
            assert_eq!(message.id, 123);
            assert_eq!(&message.payload()[..16], &payload);
        }
    }

    #[test]
    fn unmatched_messages_go_to_the_default_channel() {
        let pool = SharedBufferPool::new(1024, 20);
        let mut bus = test_bus(&pool);

        let ranged: Arc<BufferedBusChannel<MessageIdType, RangeFilter<MessageIdType>>> =
            Arc::new(BufferedBusChannel::with_filter(10, RangeFilter::new(0, 100)));
        let fallback: Arc<BufferedBusChannel<MessageIdType>> =
            Arc::new(BufferedBusChannel::new(10));
        bus.register_channel(ranged.clone());
        bus.set_default_channel(fallback.clone()).unwrap();

        let payload = patterned_payload();

        // not matched -> to default
        bus.send_message(101, &payload).unwrap();
        assert!(bus.dispatch_one(Duration::zero()));
        assert_eq!(bus.number_of_handled_messages(), 1);
        assert_eq!(bus.number_of_forwarded_messages(), 0);
        assert_eq!(bus.number_of_defaulted_messages(), 1);
        assert!(ranged.receive_message(Duration::zero()).is_err());
        let message = fallback.receive_message(Duration::zero()).unwrap();
        assert_eq!(message.id, 101);
        assert_eq!(&message.payload()[..16], &payload);

        // matched -> not to default
        bus.send_message(100, &payload).unwrap();
        assert!(bus.dispatch_one(Duration::zero()));
        assert_eq!(bus.number_of_handled_messages(), 2);
        assert_eq!(bus.number_of_forwarded_messages(), 1);
        assert_eq!(bus.number_of_defaulted_messages(), 1);
        assert!(fallback.receive_message(Duration::zero()).is_err());
        let message = ranged.receive_message(Duration::zero()).unwrap();
        assert_eq!(message.id, 100);
    }

    #[test]
    fn first_default_channel_assignment_sticks() {
        let pool = SharedBufferPool::new(1024, 20);
        let mut bus = test_bus(&pool);

        let first: Arc<BufferedBusChannel<MessageIdType>> = Arc::new(BufferedBusChannel::new(10));
        let second: Arc<BufferedBusChannel<MessageIdType>> = Arc::new(BufferedBusChannel::new(10));

        assert_eq!(bus.set_default_channel(first.clone()), Ok(()));
        assert_eq!(
            bus.set_default_channel(second.clone()),
            Err(Error::MaxChannelsReached)
        );
        // re-adding the original fails too
        assert_eq!(
            bus.set_default_channel(first.clone()),
            Err(Error::MaxChannelsReached)
        );

        bus.send_message(11, &patterned_payload()).unwrap();
        assert!(bus.dispatch_one(Duration::zero()));
        assert_eq!(bus.number_of_defaulted_messages(), 1);

        assert_eq!(first.receive_message(Duration::zero()).unwrap().id, 11);
        assert!(second.receive_message(Duration::zero()).is_err());
    }

    #[test]
    fn the_default_channel_filters_as_well() {
        let pool = SharedBufferPool::new(1024, 20);
        let mut bus = test_bus(&pool);

        let ranged: Arc<BufferedBusChannel<MessageIdType, RangeFilter<MessageIdType>>> =
            Arc::new(BufferedBusChannel::with_filter(10, RangeFilter::new(0, 100)));
        let picky_default: Arc<BufferedBusChannel<MessageIdType, RangeFilter<MessageIdType>>> =
            Arc::new(BufferedBusChannel::with_filter(10, RangeFilter::new(0, 200)));
        bus.register_channel(ranged.clone());
        bus.set_default_channel(picky_default.clone()).unwrap();

        let payload = patterned_payload();

        // in the default's range
        bus.send_message(200, &payload).unwrap();
        assert!(bus.dispatch_one(Duration::zero()));
        assert_eq!(bus.number_of_defaulted_messages(), 1);
        assert_eq!(bus.number_of_declined_messages(), 0);
        assert_eq!(picky_default.receive_message(Duration::zero()).unwrap().id, 200);

        // outside everyone's range: dropped
        bus.send_message(201, &payload).unwrap();
        assert!(bus.dispatch_one(Duration::zero()));
        assert_eq!(bus.number_of_handled_messages(), 2);
        assert_eq!(bus.number_of_forwarded_messages(), 0);
        assert_eq!(bus.number_of_defaulted_messages(), 1);
        assert_eq!(bus.number_of_declined_messages(), 1);
        assert!(picky_default.receive_message(Duration::zero()).is_err());
        assert!(ranged.receive_message(Duration::zero()).is_err());
        assert_eq!(pool.number_of_free_elements(), 20);
    }

    #[test]
    fn full_input_queue_rejects_the_eleventh_message() {
        let pool = SharedBufferPool::new(1024, 20);
        let mut bus = test_bus(&pool);
        let channel: Arc<BufferedBusChannel<MessageIdType>> =
            Arc::new(BufferedBusChannel::new(10));
        bus.register_channel(channel.clone());

        for _ in 0..10 {
            assert_eq!(bus.send(BusMessage::new(0, Some(allocated(&pool)))), Ok(()));
        }
        assert_eq!(bus.number_of_accepted_messages(), 10);
        assert_eq!(bus.number_of_failed_send_operations(), 0);

        assert_eq!(
            bus.send(BusMessage::new(0, Some(allocated(&pool)))),
            Err(Error::SendFailed)
        );
        assert_eq!(bus.number_of_accepted_messages(), 10);
        assert_eq!(bus.number_of_failed_send_operations(), 1);

        for i in 0..10 {
            assert!(bus.dispatch_one(Duration::zero()));
            assert_eq!(bus.number_of_handled_messages(), i + 1);
            assert_eq!(bus.number_of_forwarded_messages(), i + 1);
        }

        // the eleventh step is a no-op on an empty queue
        assert!(!bus.dispatch_one(Duration::zero()));
        assert_eq!(bus.number_of_handled_messages(), 10);
        assert_eq!(bus.number_of_forwarded_messages(), 10);
    }

    #[test]
    fn accounting_identity_holds() {
        // accepted == handled + input_queue_depth (no failed sends here)
        let pool = SharedBufferPool::new(64, 20);
        let bus = test_bus(&pool);

        for i in 0..7u16 {
            bus.send_message(i, &[1, 2, 3]).unwrap();
        }
        bus.dispatch_one(Duration::zero());
        bus.dispatch_one(Duration::zero());

        assert_eq!(
            bus.number_of_accepted_messages() as usize,
            bus.number_of_handled_messages() as usize + bus.input_queue_depth()
        );
    }

    #[test]
    fn full_subscriber_channel_does_not_stop_the_fan_out() {
        let pool = SharedBufferPool::new(64, 20);
        let mut bus = test_bus(&pool);

        let tiny: Arc<BufferedBusChannel<MessageIdType>> = Arc::new(BufferedBusChannel::new(1));
        let roomy: Arc<BufferedBusChannel<MessageIdType>> = Arc::new(BufferedBusChannel::new(10));
        bus.register_channel(tiny.clone());
        bus.register_channel(roomy.clone());

        for _ in 0..3 {
            bus.send_message(1, &[0xAA]).unwrap();
            bus.dispatch_one(Duration::zero());
        }

        assert_eq!(tiny.number_of_appended_messages(), 1);
        assert_eq!(tiny.number_of_failed_receptions(), 2);
        assert_eq!(roomy.number_of_appended_messages(), 3);
        // every round had at least one accepting channel
        assert_eq!(bus.number_of_forwarded_messages(), 3);
    }

    struct CountingSink {
        reports: std::sync::atomic::AtomicU32,
    }

    impl HeartbeatSink for CountingSink {
        fn report(&self, source: HeartbeatSource, timeout: Duration) {
            assert_eq!(source, HeartbeatSource(123));
            assert!(timeout > Duration::zero());
            self.reports
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[test]
    fn dispatcher_thread_routes_and_heartbeats() {
        let pool = SharedBufferPool::new(64, 8);
        let mut bus = SoftwareBus::<MessageIdType>::new(
            pool.clone(),
            8,
            HeartbeatSource(123),
            Duration::milliseconds(5),
        );
        let channel: Arc<BufferedBusChannel<MessageIdType>> = Arc::new(BufferedBusChannel::new(8));
        bus.register_channel(channel.clone());
        let sink = Arc::new(CountingSink {
            reports: std::sync::atomic::AtomicU32::new(0),
        });
        bus.set_heartbeat_sink(sink.clone());

        let bus = Arc::new(bus);
        let _thread = SoftwareBus::start(Arc::clone(&bus), 10, 64 * 1024);

        bus.send_message(42, &[1, 2, 3]).unwrap();
        let message = channel.receive_message(Duration::seconds(2)).unwrap();
        assert_eq!(message.id, 42);

        // idle iterations keep the heartbeat alive
        std::thread::sleep(std::time::Duration::from_millis(40));
        assert!(sink.reports.load(std::sync::atomic::Ordering::SeqCst) >= 2);
    }
}
