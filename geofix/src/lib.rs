//! geofix - one "current location" over two platform location backends.
//!
//! This library hides a fused location provider and a lower-level system
//! location manager behind a single [`location::LocationSource`] capability,
//! and uses it to keep exactly one circular geofence armed around the most
//! recently observed position.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  boot signal ──► BootRegistration ──┬─► arm_background_delivery    │
//! │                                     └─► GeofenceArmer::trigger     │
//! │                                                                    │
//! │  GeofenceArmer ──► LocationSource::fetch_once ──► remove + add     │
//! │                          │                                         │
//! │               ┌──────────┴──────────┐                              │
//! │        FusedLocationSource   ManagerLocationSource                 │
//! │               │                     │                              │
//! │      FusedLocationClient    SystemLocationManager   (platform)     │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The platform facilities are traits in [`platform`]; an in-process
//! [`platform::SimulatedPlatform`] implements all of them for the CLI and
//! for tests.

pub mod app;
pub mod boot;
pub mod config;
pub mod delivery;
pub mod geofence;
pub mod location;
pub mod logging;
pub mod platform;
pub mod worker;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
