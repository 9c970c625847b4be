//! Receiving end of durable background delivery.
//!
//! When continuous updates are armed for background delivery, the platform
//! hands batches of fixes to a receiving endpoint even if no subscription is
//! open. [`DeliveryReceiver`] is that endpoint: it logs what arrives and
//! remembers the most recent fix.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::location::Location;
use crate::platform::DeliveryTarget;

/// A batch of fixes delivered in one platform callback (oldest first).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationBatch {
    locations: Vec<Location>,
}

impl LocationBatch {
    /// Create a batch from fixes in delivery order.
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }

    /// A batch holding one fix.
    pub fn single(location: Location) -> Self {
        Self::new(vec![location])
    }

    /// All fixes in the batch.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Most recent fix.
    pub fn last(&self) -> Option<&Location> {
        self.locations.last()
    }
}

/// Endpoint for background-delivered fixes.
#[derive(Debug)]
pub struct DeliveryReceiver {
    target: DeliveryTarget,
    deliveries: AtomicU64,
    latest: Mutex<Option<Location>>,
}

impl DeliveryReceiver {
    /// Create the endpoint for `target`.
    pub fn new(target: DeliveryTarget) -> Self {
        Self {
            target,
            deliveries: AtomicU64::new(0),
            latest: Mutex::new(None),
        }
    }

    /// Handle one delivery.
    ///
    /// A delivery may carry no location result at all; that is logged and
    /// ignored. Returns the most recent fix of the batch.
    pub fn on_delivery(&self, batch: Option<LocationBatch>) -> Option<Location> {
        let Some(batch) = batch else {
            warn!(endpoint = %self.target, "Delivery without a location result");
            return None;
        };

        self.deliveries.fetch_add(1, Ordering::Relaxed);
        for location in batch.locations() {
            debug!(endpoint = %self.target, %location, "Background location delivered");
        }

        let last = batch.last().cloned();
        if let Some(location) = &last {
            *self.latest.lock() = Some(location.clone());
        }
        last
    }

    /// Target this endpoint serves.
    pub fn target(&self) -> &DeliveryTarget {
        &self.target
    }

    /// Number of non-empty deliveries handled.
    pub fn deliveries(&self) -> u64 {
        self.deliveries.load(Ordering::Relaxed)
    }

    /// Most recent fix received.
    pub fn latest(&self) -> Option<Location> {
        self.latest.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receiver() -> DeliveryReceiver {
        DeliveryReceiver::new(DeliveryTarget::new(10, "boot"))
    }

    #[test]
    fn test_batch_returns_last_location() {
        let receiver = receiver();
        let batch = LocationBatch::new(vec![Location::new(1.0, 1.0), Location::new(2.0, 2.0)]);

        assert_eq!(receiver.on_delivery(Some(batch)), Some(Location::new(2.0, 2.0)));
        assert_eq!(receiver.deliveries(), 1);
        assert_eq!(receiver.latest(), Some(Location::new(2.0, 2.0)));
    }

    #[test]
    fn test_missing_result_is_ignored() {
        let receiver = receiver();
        assert_eq!(receiver.on_delivery(None), None);
        assert_eq!(receiver.deliveries(), 0);
        assert_eq!(receiver.latest(), None);
    }

    #[test]
    fn test_empty_batch_keeps_previous_latest() {
        let receiver = receiver();
        receiver.on_delivery(Some(LocationBatch::single(Location::new(5.0, 5.0))));
        assert_eq!(receiver.on_delivery(Some(LocationBatch::default())), None);
        assert_eq!(receiver.latest(), Some(Location::new(5.0, 5.0)));
        assert_eq!(receiver.deliveries(), 2);
    }
}
