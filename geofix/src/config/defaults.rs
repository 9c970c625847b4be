//! Default values for all configuration settings, and
//! the `GeofixConfig::default()` implementation.

use super::settings::*;
use crate::boot::BOOT_DELIVERY_REQUEST_CODE;
use crate::geofence::GEOFENCE_TARGET_REQUEST_CODE;
use crate::location::{DeviceClass, DEFAULT_LOCATION_TIMEOUT};
use crate::logging::DEFAULT_LOG_FILE;
use crate::platform::{AccuracyCriterion, SimulatedProvider};
use crate::worker::{BackoffPolicy, DEFAULT_BACKOFF_BASE};

// =============================================================================
// Location
// =============================================================================

/// Default wait for the first fix, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = DEFAULT_LOCATION_TIMEOUT.as_secs();

// =============================================================================
// Worker
// =============================================================================

/// Default interval between successful worker steps (15 minutes).
pub const DEFAULT_WORKER_INTERVAL_SECS: u64 = 15 * 60;

/// Default retry base delay in seconds.
pub const DEFAULT_BACKOFF_BASE_SECS: u64 = DEFAULT_BACKOFF_BASE.as_secs();

// =============================================================================
// Simulation
// =============================================================================

pub const DEFAULT_SIM_LATITUDE: f64 = 53.5511;
pub const DEFAULT_SIM_LONGITUDE: f64 = 9.9937;
pub const DEFAULT_SIM_STEP_M: f64 = 150.0;
pub const DEFAULT_SIM_FIX_INTERVAL_MS: u64 = 1000;

/// Default simulated providers: a fine "gps" and a coarse "network".
pub fn default_sim_providers() -> Vec<SimulatedProvider> {
    vec![
        SimulatedProvider::new("gps", AccuracyCriterion::Fine),
        SimulatedProvider::new("network", AccuracyCriterion::Coarse),
    ]
}

impl Default for GeofixConfig {
    fn default() -> Self {
        Self {
            location: LocationSettings {
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                device_class: DeviceClass::Standard,
                fused_available: true,
            },
            geofence: GeofenceSettings {
                target_request_code: GEOFENCE_TARGET_REQUEST_CODE,
            },
            boot: BootSettings {
                delivery_request_code: BOOT_DELIVERY_REQUEST_CODE,
            },
            worker: WorkerSettings {
                interval_secs: DEFAULT_WORKER_INTERVAL_SECS,
                backoff: BackoffPolicy::default(),
            },
            simulation: SimulationSettings {
                latitude: DEFAULT_SIM_LATITUDE,
                longitude: DEFAULT_SIM_LONGITUDE,
                step_m: DEFAULT_SIM_STEP_M,
                fix_interval_ms: DEFAULT_SIM_FIX_INTERVAL_MS,
                has_last_known: true,
                providers: default_sim_providers(),
            },
            logging: LoggingSettings {
                directory: super::file::config_directory().join("logs"),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
