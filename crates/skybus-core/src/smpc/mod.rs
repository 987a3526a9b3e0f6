//! SMPC — simple message passing for components.
//!
//! Typed topics with synchronous delivery and init-time wiring. A component
//! creates [`Subscription`]s next to its state; one call to
//! [`connect_subscriptions_to_topics`] at startup links everything, and
//! from then on [`Topic::publish`] fans a borrowed message out to every
//! subscriber in the publisher's context.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use skybus_core::smpc::{Subscription, SubscriptionRegistry, Topic};
//!
//! let registry = SubscriptionRegistry::new();
//! let temperatures: Topic<i32> = Topic::with_registry(&registry);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let _subscription = Subscription::with_registry(&registry, &temperatures, move |value| {
//!     sink.lock().unwrap().push(*value);
//! });
//!
//! registry.connect();
//! temperatures.publish(&21);
//! assert_eq!(*seen.lock().unwrap(), vec![21]);
//! ```

mod subscription;
mod topic;

pub use subscription::{
    Subscription, SubscriptionRegistry, connect_subscriptions_to_topics, global_registry,
    release_all_subscriptions,
};
pub use topic::{Topic, TopicRaw};
