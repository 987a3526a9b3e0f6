//! Message filters owned by bus channels.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::swb::message::{BusMessage, MessageId};

/// Decides whether a channel is interested in a message.
pub trait Filter<I: MessageId>: Send + Sync {
    fn matches(&self, message: &BusMessage<I>) -> bool;
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterNone;

impl<I: MessageId> Filter<I> for FilterNone {
    fn matches(&self, _message: &BusMessage<I>) -> bool {
        true
    }
}

/// Accepts ids in the inclusive range `[min, max]`.
#[derive(Debug, Clone, Copy)]
pub struct RangeFilter<I: MessageId> {
    min: I,
    max: I,
}

impl<I: MessageId> RangeFilter<I> {
    pub fn new(min: I, max: I) -> Self {
        Self { min, max }
    }

    pub fn min(&self) -> I {
        self.min
    }

    pub fn max(&self) -> I {
        self.max
    }
}

impl<I: MessageId> Filter<I> for RangeFilter<I> {
    fn matches(&self, message: &BusMessage<I>) -> bool {
        self.min <= message.id && message.id <= self.max
    }
}

/// One masked-id subscription inside a [`SubscriptionFilter`].
///
/// Matches when `message.id & mask == id & mask`. Each subscription counts
/// how many messages it matched, which is the observability hook used to
/// verify routing tables in flight.
#[derive(Debug)]
pub struct BusSubscription<I: MessageId> {
    id: I,
    mask: I,
    matched: AtomicU32,
}

impl<I: MessageId> BusSubscription<I> {
    /// Exact-id subscription.
    pub fn new(id: I) -> Arc<Self> {
        Self::with_mask(id, I::FULL_MASK)
    }

    /// Masked subscription: only the bits set in `mask` take part in the
    /// comparison.
    pub fn with_mask(id: I, mask: I) -> Arc<Self> {
        Arc::new(Self {
            id,
            mask,
            matched: AtomicU32::new(0),
        })
    }

    pub fn id(&self) -> I {
        self.id
    }

    pub fn mask(&self) -> I {
        self.mask
    }

    /// How many messages this subscription has matched.
    pub fn number_of_matched_messages(&self) -> u32 {
        self.matched.load(Ordering::Relaxed)
    }

    fn matches(&self, id: I) -> bool {
        if id.masked(self.mask) == self.id.masked(self.mask) {
            self.matched.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }
}

/// Accepts a message when any registered subscription matches it.
///
/// Evaluation short-circuits: the first matching subscription takes the hit
/// count, later ones are not consulted for that message.
#[derive(Default)]
pub struct SubscriptionFilter<I: MessageId> {
    subscriptions: Vec<Arc<BusSubscription<I>>>,
}

impl<I: MessageId> SubscriptionFilter<I> {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    pub fn register_subscription(&mut self, subscription: Arc<BusSubscription<I>>) {
        self.subscriptions.push(subscription);
    }

    pub fn number_of_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }
}

impl<I: MessageId> Filter<I> for SubscriptionFilter<I> {
    fn matches(&self, message: &BusMessage<I>) -> bool {
        self.subscriptions
            .iter()
            .any(|subscription| subscription.matches(message.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: u16) -> BusMessage<u16> {
        BusMessage::signal(id)
    }

    #[test]
    fn filter_none_accepts_everything() {
        let filter = FilterNone;
        assert!(Filter::matches(&filter, &message(0)));
        assert!(Filter::matches(&filter, &message(u16::MAX)));
    }

    #[test]
    fn range_filter_is_inclusive() {
        let filter = RangeFilter::new(10u16, 100);
        assert!(!filter.matches(&message(9)));
        assert!(filter.matches(&message(10)));
        assert!(filter.matches(&message(55)));
        assert!(filter.matches(&message(100)));
        assert!(!filter.matches(&message(101)));
    }

    #[test]
    fn exact_subscription_counts_its_matches() {
        let subscription = BusSubscription::new(0x1234u16);
        let mut filter = SubscriptionFilter::new();
        filter.register_subscription(Arc::clone(&subscription));

        assert!(filter.matches(&message(0x1234)));
        assert!(!filter.matches(&message(0x1235)));
        assert!(filter.matches(&message(0x1234)));
        assert_eq!(subscription.number_of_matched_messages(), 2);
    }

    #[test]
    fn masked_subscription_compares_masked_bits_only() {
        let subscription = BusSubscription::with_mask(0x1234u16, 0xFF00);
        let mut filter = SubscriptionFilter::new();
        filter.register_subscription(Arc::clone(&subscription));

        assert!(filter.matches(&message(0x1200)));
        assert!(filter.matches(&message(0x12FF)));
        assert!(!filter.matches(&message(0x1300)));
        assert_eq!(subscription.number_of_matched_messages(), 2);
    }

    #[test]
    fn first_matching_subscription_takes_the_hit() {
        let exact = BusSubscription::new(0x1234u16);
        let masked = BusSubscription::with_mask(0x1234u16, 0xFF00);
        let mut filter = SubscriptionFilter::new();
        filter.register_subscription(Arc::clone(&exact));
        filter.register_subscription(Arc::clone(&masked));
        assert_eq!(filter.number_of_subscriptions(), 2);

        // both would match, the first registered one counts
        assert!(filter.matches(&message(0x1234)));
        assert_eq!(exact.number_of_matched_messages(), 1);
        assert_eq!(masked.number_of_matched_messages(), 0);

        // only the masked one matches this id
        assert!(filter.matches(&message(0x1235)));
        assert_eq!(exact.number_of_matched_messages(), 1);
        assert_eq!(masked.number_of_matched_messages(), 1);

        assert!(!filter.matches(&message(0x1135)));
    }

    #[test]
    fn empty_subscription_filter_rejects_everything() {
        let filter: SubscriptionFilter<u16> = SubscriptionFilter::new();
        assert!(!filter.matches(&message(0)));
    }
}
