//! Application bootstrap.
//!
//! `GeofixApp` makes the one-time backend choice and builds every
//! collaborator around the chosen source, so the CLI and the tests get the
//! same wiring.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::config::AppConfig;
use super::error::AppError;
use crate::boot::BootRegistration;
use crate::config::GeofixConfig;
use crate::delivery::DeliveryReceiver;
use crate::geofence::GeofenceArmer;
use crate::location::{ActiveSource, LocationSource, ProviderSelector, Selection};
use crate::logging::{init_logging, LoggingGuard};
use crate::platform::{
    FusedLocationClient, GeofencingClient, SimulatedPlatform, SystemLocationManager,
};
use crate::worker::LocationWorker;

/// The platform facilities the application runs on.
#[derive(Clone)]
pub struct PlatformHandles {
    pub fused: Arc<dyn FusedLocationClient>,
    pub manager: Arc<dyn SystemLocationManager>,
    pub geofencing: Arc<dyn GeofencingClient>,
}

impl PlatformHandles {
    /// All three facilities backed by one simulated platform.
    pub fn simulated(platform: &SimulatedPlatform) -> Self {
        Self {
            fused: Arc::new(platform.clone()),
            manager: Arc::new(platform.clone()),
            geofencing: Arc::new(platform.clone()),
        }
    }
}

/// Wired application.
pub struct GeofixApp {
    config: AppConfig,
    selection: Selection,
    source: Arc<ActiveSource>,
    armer: GeofenceArmer<ActiveSource>,
    boot: BootRegistration<ActiveSource>,
    boot_receiver: Arc<DeliveryReceiver>,
}

impl GeofixApp {
    /// Load the configuration file (defaults when missing) and convert it.
    pub fn load_config(path: Option<&Path>) -> Result<AppConfig, AppError> {
        let file = match path {
            Some(path) => GeofixConfig::load_from(path)?,
            None => GeofixConfig::load()?,
        };
        Ok(AppConfig::from_config_file(&file))
    }

    /// Start file and console logging as configured.
    pub fn start_logging(config: &AppConfig) -> Result<LoggingGuard, AppError> {
        Ok(init_logging(&config.log_directory, &config.log_file)?)
    }

    /// Build the application on the given platform.
    ///
    /// The backend is selected here, once.
    pub fn new(config: AppConfig, platform: PlatformHandles) -> Self {
        let fused_available = config.fused_available && platform.fused.is_available();
        let selection = ProviderSelector::select(fused_available, config.device_class);
        let source = Arc::new(ActiveSource::from_selection(
            selection,
            platform.fused,
            platform.manager,
            config.location_timeout,
        ));

        let armer = GeofenceArmer::new(
            Arc::clone(&source),
            platform.geofencing,
            config.geofence_target.clone(),
        );
        let boot = BootRegistration::new(
            Arc::clone(&source),
            armer.clone(),
            config.boot_delivery_target.clone(),
        );
        let boot_receiver = Arc::new(DeliveryReceiver::new(config.boot_delivery_target.clone()));

        info!(
            backend = %source.kind(),
            device_class = %config.device_class,
            "geofix application ready"
        );

        Self {
            config,
            selection,
            source,
            armer,
            boot,
            boot_receiver,
        }
    }

    /// Build the application on a fresh simulated platform and attach the
    /// boot delivery receiver to it.
    pub fn simulated(config: AppConfig) -> (Self, SimulatedPlatform) {
        let platform = SimulatedPlatform::new(config.simulation.clone());
        let app = Self::new(config, PlatformHandles::simulated(&platform));
        platform.attach_receiver(
            app.config.boot_delivery_target.request_code,
            Arc::clone(&app.boot_receiver),
        );
        (app, platform)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// The selected location source.
    pub fn source(&self) -> &Arc<ActiveSource> {
        &self.source
    }

    pub fn armer(&self) -> &GeofenceArmer<ActiveSource> {
        &self.armer
    }

    pub fn boot(&self) -> &BootRegistration<ActiveSource> {
        &self.boot
    }

    /// Endpoint receiving boot-time background deliveries.
    pub fn boot_receiver(&self) -> &Arc<DeliveryReceiver> {
        &self.boot_receiver
    }

    /// A periodic worker over the selected source.
    pub fn worker(&self) -> LocationWorker<ActiveSource> {
        LocationWorker::new(
            Arc::clone(&self.source),
            self.config.worker_interval,
            self.config.worker_backoff,
        )
    }
}
