//! CLI runner for common setup and operations.
//!
//! Loads the configuration, initializes logging and wires the application on
//! the simulated platform, so command handlers only deal with their own work.

use std::path::Path;

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use geofix::app::{AppConfig, GeofixApp};
use geofix::logging::LoggingGuard;
use geofix::platform::SimulatedPlatform;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    app: GeofixApp,
    platform: SimulatedPlatform,
    json: bool,
}

impl CliRunner {
    /// Load config (defaults when the file is missing), start logging and
    /// build the application.
    pub fn new(config_path: Option<&Path>, json: bool) -> Result<Self, CliError> {
        let config: AppConfig = GeofixApp::load_config(config_path)?;
        let logging_guard = GeofixApp::start_logging(&config)?;
        let (app, platform) = GeofixApp::simulated(config);

        Ok(Self {
            logging_guard,
            app,
            platform,
            json,
        })
    }

    pub fn app(&self) -> &GeofixApp {
        &self.app
    }

    pub fn platform(&self) -> &SimulatedPlatform {
        &self.platform
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("geofix v{}", geofix::VERSION);
        info!(backend = %self.app.selection().backend, "geofix CLI: {} command", command);
    }

    /// Start producing simulated fixes until `cancel` fires.
    pub fn start_platform(&self, cancel: &CancellationToken) -> JoinHandle<()> {
        self.platform.run(cancel.clone())
    }

    /// Print a result, as JSON when `--json` was given.
    pub fn emit(&self, value: Value, text: impl FnOnce() -> String) -> Result<(), CliError> {
        if self.json {
            println!("{}", serde_json::to_string(&value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}
