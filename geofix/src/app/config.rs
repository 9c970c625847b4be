//! Application configuration for `GeofixApp`.
//!
//! `AppConfig` is the immutable configuration object passed to the
//! application at startup. It is built once from the config file and never
//! changes afterwards; nothing downstream reads the file or any global.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::GeofixConfig;
use crate::location::{DeviceClass, Location};
use crate::platform::{DeliveryTarget, SimulationConfig};
use crate::worker::BackoffPolicy;

/// Endpoint name of the boot-time background delivery target.
pub const BOOT_DELIVERY_ENDPOINT: &str = "boot-location-updates";

/// Endpoint name of the geofence transition delivery target.
pub const GEOFENCE_ENDPOINT: &str = "geofence-transitions";

/// Application configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Wait for the first fix.
    pub location_timeout: Duration,

    /// Device class, selects the request profile.
    pub device_class: DeviceClass,

    /// Whether the fused provider may be used.
    pub fused_available: bool,

    /// Where boot-time background updates are delivered.
    pub boot_delivery_target: DeliveryTarget,

    /// Where geofence transitions are delivered.
    pub geofence_target: DeliveryTarget,

    /// Interval between successful worker steps.
    pub worker_interval: Duration,

    /// Worker retry policy.
    pub worker_backoff: BackoffPolicy,

    /// Simulated platform world.
    pub simulation: SimulationConfig,

    /// Log directory.
    pub log_directory: PathBuf,

    /// Log file name.
    pub log_file: String,
}

impl AppConfig {
    /// Create application config from the configuration file.
    pub fn from_config_file(config: &GeofixConfig) -> Self {
        let sim = &config.simulation;
        Self {
            location_timeout: Duration::from_secs(config.location.timeout_secs),
            device_class: config.location.device_class,
            fused_available: config.location.fused_available,
            boot_delivery_target: DeliveryTarget::new(
                config.boot.delivery_request_code,
                BOOT_DELIVERY_ENDPOINT,
            ),
            geofence_target: DeliveryTarget::new(
                config.geofence.target_request_code,
                GEOFENCE_ENDPOINT,
            ),
            worker_interval: Duration::from_secs(config.worker.interval_secs),
            worker_backoff: config.worker.backoff,
            simulation: SimulationConfig {
                start: Location::new(sim.latitude, sim.longitude),
                step_m: sim.step_m,
                fix_interval: Duration::from_millis(sim.fix_interval_ms),
                has_last_known: sim.has_last_known,
                fused_available: config.location.fused_available,
                providers: sim.providers.clone(),
                ..SimulationConfig::default()
            },
            log_directory: config.logging.directory.clone(),
            log_file: config.logging.file.clone(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_config_file(&GeofixConfig::default())
    }
}
