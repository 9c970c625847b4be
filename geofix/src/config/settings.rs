//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;

use crate::location::DeviceClass;
use crate::platform::SimulatedProvider;
use crate::worker::BackoffPolicy;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofixConfig {
    pub location: LocationSettings,
    pub geofence: GeofenceSettings,
    pub boot: BootSettings,
    pub worker: WorkerSettings,
    pub simulation: SimulationSettings,
    pub logging: LoggingSettings,
}

/// Location backend selection and timing.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSettings {
    /// Seconds a stream waits for its first fix.
    pub timeout_secs: u64,
    /// Device class, selects the request profile.
    pub device_class: DeviceClass,
    /// Whether the fused provider is available on this device.
    pub fused_available: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceSettings {
    /// Request code of the geofence transition delivery target.
    pub target_request_code: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootSettings {
    /// Request code of the boot-time background delivery target.
    pub delivery_request_code: u32,
}

/// Periodic worker schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSettings {
    /// Seconds between successful steps.
    pub interval_secs: u64,
    /// Retry delay policy (kind and base delay).
    pub backoff: BackoffPolicy,
}

/// Simulated platform world.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters moved between fixes.
    pub step_m: f64,
    /// Milliseconds between fixes.
    pub fix_interval_ms: u64,
    /// Whether a cached location exists at startup.
    pub has_last_known: bool,
    /// System providers in preference order.
    pub providers: Vec<SimulatedProvider>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log directory.
    pub directory: PathBuf,
    /// Log file name inside `directory`.
    pub file: String,
}
