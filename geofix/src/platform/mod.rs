//! Platform location facilities.
//!
//! The core never talks to a device directly. Everything it needs from the
//! platform goes through the traits re-exported here, so a real binding and
//! the in-process [`SimulatedPlatform`] are interchangeable.

mod error;
mod simulated;
mod traits;

pub use error::PlatformError;
pub use simulated::{
    SimulatedPlatform, SimulatedProvider, SimulationConfig, SimulationStats, FUSED_PROVIDER_NAME,
};
pub use traits::{
    AccuracyCriterion, BoxFuture, DeliveryTarget, FusedLocationClient, GeofencingClient,
    ListenerEvent, ListenerId, LocationListener, SystemLocationManager,
};
