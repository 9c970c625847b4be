//! Application bootstrap.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          GeofixApp                           │
//! │                                                              │
//! │  AppConfig ──► ProviderSelector::select ──► ActiveSource     │
//! │                                               │              │
//! │                 ┌─────────────────┬───────────┴──────┐       │
//! │          GeofenceArmer   BootRegistration    LocationWorker  │
//! │                                                              │
//! │  DeliveryReceiver (boot delivery target)                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use geofix::app::{AppConfig, GeofixApp};
//!
//! let (app, platform) = GeofixApp::simulated(AppConfig::default());
//! let outcome = app.armer().arm().await;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::{GeofixApp, PlatformHandles};
pub use config::{AppConfig, BOOT_DELIVERY_ENDPOINT, GEOFENCE_ENDPOINT};
pub use error::AppError;
