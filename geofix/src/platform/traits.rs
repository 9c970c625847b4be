//! Platform boundary traits.
//!
//! These traits describe the three platform facilities the core talks to:
//!
//! - [`FusedLocationClient`] - high-level fused provider (backend A)
//! - [`SystemLocationManager`] - low-level per-provider manager (backend B)
//! - [`GeofencingClient`] - geofence registration
//!
//! Live updates are delivered through a [`LocationListener`] handle. The
//! platform keeps the handle while the registration is active and pushes
//! [`ListenerEvent`]s into it; the core side owns the receiving end.
//!
//! # Dyn Compatibility
//!
//! Async methods return [`BoxFuture`] so the facilities can be held as
//! `Arc<dyn Trait>`.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use super::error::PlatformError;
use crate::geofence::GeofenceRegistration;
use crate::location::{Location, LocationRequestProfile};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Events the platform delivers to a registered listener.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent {
    /// A new fix.
    Location(Location),
    /// Fused provider availability changed.
    Availability(bool),
    /// A system provider was enabled by the user.
    ProviderEnabled(String),
    /// A system provider was disabled by the user.
    ProviderDisabled(String),
}

/// Platform-side handle of a live listener registration.
///
/// Cloning the handle is cheap; every clone feeds the same subscription.
#[derive(Debug, Clone)]
pub struct LocationListener {
    id: ListenerId,
    tx: mpsc::UnboundedSender<ListenerEvent>,
}

impl LocationListener {
    /// Create a listener handle and the receiving end of its event channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ListenerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                id: ListenerId::next(),
                tx,
            },
            rx,
        )
    }

    /// Identity used to deregister this listener.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Deliver an event. Returns false once the subscription is gone.
    pub fn deliver(&self, event: ListenerEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Deliver a fix.
    pub fn on_location(&self, location: Location) -> bool {
        self.deliver(ListenerEvent::Location(location))
    }

    /// Whether the receiving subscription has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Opaque, stable identity of a durable platform delivery endpoint.
///
/// Registering again with the same request code replaces the previous
/// registration instead of adding a second one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeliveryTarget {
    /// Small integer identity.
    pub request_code: u32,
    /// Name of the receiving endpoint.
    pub endpoint: String,
}

impl DeliveryTarget {
    /// Create a delivery target.
    pub fn new(request_code: u32, endpoint: impl Into<String>) -> Self {
        Self {
            request_code,
            endpoint: endpoint.into(),
        }
    }
}

impl fmt::Display for DeliveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.endpoint, self.request_code)
    }
}

/// Accuracy criterion for picking a system provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyCriterion {
    /// Only providers with fine (GPS-grade) accuracy.
    Fine,
    /// Any provider.
    Coarse,
}

/// High-level fused location provider.
pub trait FusedLocationClient: Send + Sync {
    /// Whether the fused facility is installed and usable on this device.
    fn is_available(&self) -> bool;

    /// Read the cached last location.
    fn last_location(&self) -> BoxFuture<'_, Result<Option<Location>, PlatformError>>;

    /// Start live updates for `listener` at the given profile.
    fn request_location_updates(
        &self,
        profile: &LocationRequestProfile,
        listener: LocationListener,
    ) -> Result<(), PlatformError>;

    /// Stop live updates for a listener. Unknown ids are ignored.
    fn remove_location_updates(&self, listener: ListenerId);

    /// Register durable out-of-process delivery to `target`.
    fn request_background_updates(
        &self,
        profile: &LocationRequestProfile,
        target: &DeliveryTarget,
    ) -> Result<(), PlatformError>;
}

/// Low-level system location manager with named providers.
pub trait SystemLocationManager: Send + Sync {
    /// Best provider matching `criterion`, optionally restricted to enabled ones.
    fn best_provider(&self, criterion: AccuracyCriterion, enabled_only: bool) -> Option<String>;

    /// Cached last known location of `provider`.
    fn last_known_location(&self, provider: &str) -> Result<Option<Location>, PlatformError>;

    /// Start updates from `provider`.
    ///
    /// Requesting again with the same listener replaces its previous request.
    fn request_location_updates(
        &self,
        provider: &str,
        min_interval: Duration,
        min_distance_m: f32,
        listener: LocationListener,
    ) -> Result<(), PlatformError>;

    /// Stop all updates for a listener. Unknown ids are ignored.
    fn remove_updates(&self, listener: ListenerId);

    /// Register durable out-of-process delivery to `target`.
    fn request_background_updates(
        &self,
        provider: &str,
        min_interval: Duration,
        min_distance_m: f32,
        target: &DeliveryTarget,
    ) -> Result<(), PlatformError>;
}

/// Geofence registration facility.
///
/// Calling a method issues the request; the returned future only reports
/// its completion.
pub trait GeofencingClient: Send + Sync {
    /// Remove every geofence registered against `target`.
    fn remove_geofences(&self, target: &DeliveryTarget) -> BoxFuture<'static, Result<(), PlatformError>>;

    /// Add a geofence delivering transitions to `target`.
    fn add_geofences(
        &self,
        registration: &GeofenceRegistration,
        target: &DeliveryTarget,
    ) -> BoxFuture<'static, Result<(), PlatformError>>;
}
