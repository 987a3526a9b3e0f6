//! Typed topics for synchronous in-process publish/subscribe.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::smpc::subscription::{SubscriptionRegistry, TopicRegistration, global_registry};

pub(crate) type SubscriberFn<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub(crate) struct TopicCore<T: ?Sized + 'static> {
    subscribers: Mutex<Vec<SubscriberFn<T>>>,
}

impl<T: ?Sized + 'static> TopicCore<T> {
    pub(crate) fn connect(&self, subscriber: SubscriberFn<T>) {
        self.subscribers.lock().push(subscriber);
    }

    pub(crate) fn clear(&self) {
        self.subscribers.lock().clear();
    }
}

/// Named sink for messages of type `T`.
///
/// `publish` invokes every connected subscriber synchronously in the
/// publisher's context, under the topic's mutex. A subscriber may publish to
/// *other* topics from its callback; publishing back to the same topic
/// deadlocks on that mutex and is forbidden. Invocation order within one
/// publish call is unspecified.
///
/// Subscribers are attached through [`Subscription`](crate::smpc::Subscription)
/// handles and become active once
/// [`connect_subscriptions_to_topics`](crate::smpc::connect_subscriptions_to_topics)
/// has run.
pub struct Topic<T: ?Sized + 'static> {
    core: Arc<TopicCore<T>>,
    _registration: TopicRegistration,
}

/// Length-erased topic for payloads whose type varies at runtime.
pub type TopicRaw = Topic<[u8]>;

impl<T: ?Sized + 'static> Topic<T> {
    /// Create a topic wired through the process-global registry.
    pub fn new() -> Self {
        Self::with_registry(global_registry())
    }

    /// Create a topic wired through a caller-owned registry (used by tests
    /// to keep wiring isolated).
    pub fn with_registry(registry: &Arc<SubscriptionRegistry>) -> Self {
        let core = Arc::new(TopicCore {
            subscribers: Mutex::new(Vec::new()),
        });
        let registration = SubscriptionRegistry::register_topic(registry, {
            let core = Arc::clone(&core);
            move || core.clear()
        });
        Self {
            core,
            _registration: registration,
        }
    }

    /// Deliver `message` to every connected subscriber, synchronously.
    pub fn publish(&self, message: &T) {
        let subscribers = self.core.subscribers.lock();
        for subscriber in subscribers.iter() {
            subscriber(message);
        }
    }

    /// Number of currently connected subscribers.
    pub fn number_of_subscribers(&self) -> usize {
        self.core.subscribers.lock().len()
    }

    pub(crate) fn core(&self) -> Arc<TopicCore<T>> {
        Arc::clone(&self.core)
    }
}

impl<T: ?Sized + 'static> Default for Topic<T> {
    fn default() -> Self {
        Self::new()
    }
}
