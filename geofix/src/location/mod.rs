//! Location capability and its backends.
//!
//! ```text
//!            LocationSource (trait)
//!                   │
//!             ActiveSource ◄── ProviderSelector::select
//!              │        │
//!   FusedLocationSource  ManagerLocationSource
//!              │        │
//!              └─ subscription (callback → LocationStream bridge)
//! ```

mod error;
mod fused;
mod manager;
mod model;
mod profile;
mod selector;
mod source;
mod subscription;

pub use error::LocationError;
pub use fused::FusedLocationSource;
pub use manager::ManagerLocationSource;
pub use model::Location;
pub use profile::{
    DeviceClass, LocationRequestProfile, Priority, DEFAULT_LOCATION_TIMEOUT,
    MANAGER_MIN_DISTANCE_M, MANAGER_UPDATE_INTERVAL,
};
pub use selector::{ActiveSource, ProviderSelector, Selection};
pub use source::{BackendKind, LocationSource, FALLBACK_READ_SLACK};
pub use subscription::{LocationStream, StreamOptions};
