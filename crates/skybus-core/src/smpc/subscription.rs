//! Subscription handles and the startup wiring registry.
//!
//! Subscriptions do not attach to their topic immediately: creating one
//! registers a wiring entry, and a single pass —
//! [`connect_subscriptions_to_topics`] — builds every topic's subscriber
//! list at startup. This moves the wiring cost to init-time, needs no
//! central component list, and makes the set of links independent of
//! construction order.

use std::sync::{Arc, OnceLock};

use crate::container::{RegistrationId, Registry};
use crate::smpc::topic::{SubscriberFn, Topic};

type Thunk = Box<dyn Fn() + Send + Sync>;

/// Registry of topics and pending subscriptions.
///
/// One process-global instance backs the plain [`Topic::new`] /
/// [`Subscription::new`] API; tests construct their own to keep wiring
/// isolated between cases.
pub struct SubscriptionRegistry {
    /// Per-topic thunks that clear the topic's subscriber list.
    topics: Registry<Thunk>,
    /// Per-subscription thunks that link the subscriber into its topic.
    subscriptions: Registry<Thunk>,
}

impl SubscriptionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            topics: Registry::new(),
            subscriptions: Registry::new(),
        })
    }

    /// Connect every registered subscription to its topic.
    ///
    /// Topic subscriber lists are rebuilt from scratch, so the pass is
    /// idempotent and also serves as the re-wiring step after a
    /// subscription was dropped.
    pub fn connect(&self) {
        self.topics.for_each(|clear| clear());
        self.subscriptions.for_each(|link| link());
        log::debug!(
            "connected {} subscriptions across {} topics",
            self.subscriptions.len(),
            self.topics.len()
        );
    }

    /// Detach every subscriber from every topic; inverse of
    /// [`connect`](Self::connect).
    pub fn release_all(&self) {
        self.topics.for_each(|clear| clear());
    }

    pub(crate) fn register_topic(
        registry: &Arc<Self>,
        clear: impl Fn() + Send + Sync + 'static,
    ) -> TopicRegistration {
        TopicRegistration {
            registry: Arc::clone(registry),
            id: registry.topics.register(Box::new(clear)),
        }
    }
}

/// Keeps a topic's clear-thunk registered for the topic's lifetime.
pub(crate) struct TopicRegistration {
    registry: Arc<SubscriptionRegistry>,
    id: RegistrationId,
}

impl Drop for TopicRegistration {
    fn drop(&mut self) {
        self.registry.topics.unregister(self.id);
    }
}

/// Binds one subscriber callback to a [`Topic`].
///
/// The handle keeps the wiring entry alive: dropping it removes the entry
/// and rebuilds the remaining links, so tear-down during runtime behaves
/// like the original connect pass minus this subscriber. Creating and
/// destroying subscriptions concurrently with publishes on the affected
/// topics is not thread-safe; do it in init/teardown phases.
pub struct Subscription {
    registry: Arc<SubscriptionRegistry>,
    id: RegistrationId,
}

impl Subscription {
    /// Subscribe `callback` to `topic` through the process-global registry.
    ///
    /// The callback runs in the publisher's thread, under the topic mutex —
    /// it must not block indefinitely and must not publish to the same
    /// topic.
    pub fn new<T, F>(topic: &Topic<T>, callback: F) -> Self
    where
        T: ?Sized + 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self::with_registry(global_registry(), topic, callback)
    }

    /// Subscribe through a caller-owned registry.
    pub fn with_registry<T, F>(
        registry: &Arc<SubscriptionRegistry>,
        topic: &Topic<T>,
        callback: F,
    ) -> Self
    where
        T: ?Sized + 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        let core = topic.core();
        let subscriber: SubscriberFn<T> = Arc::new(callback);
        let id = registry.subscriptions.register(Box::new(move || {
            core.connect(Arc::clone(&subscriber));
        }));
        Self {
            registry: Arc::clone(registry),
            id,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.subscriptions.unregister(self.id);
        // Rebuild the remaining links, like the original teardown protocol.
        self.registry.connect();
    }
}

fn global() -> &'static Arc<SubscriptionRegistry> {
    static GLOBAL: OnceLock<Arc<SubscriptionRegistry>> = OnceLock::new();
    GLOBAL.get_or_init(SubscriptionRegistry::new)
}

/// The process-global wiring registry.
pub fn global_registry() -> &'static Arc<SubscriptionRegistry> {
    global()
}

/// Connect all globally registered subscriptions to their topics. Call once
/// at the top of `main`, after the static structure is built.
pub fn connect_subscriptions_to_topics() {
    global().connect();
}

/// Release all globally registered subscriptions; counterpart to
/// [`connect_subscriptions_to_topics`] for program teardown.
pub fn release_all_subscriptions() {
    global().release_all();
}
