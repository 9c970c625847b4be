//! Configuration file for the geofix tools.
//!
//! ```text
//! ~/.geofix/config.ini ──parser──► GeofixConfig ──► app::AppConfig
//!                      ◄─writer──
//! ```
//!
//! A missing file means defaults; an invalid value is an error naming the
//! section and key.

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    BootSettings, GeofenceSettings, GeofixConfig, LocationSettings, LoggingSettings,
    SimulationSettings, WorkerSettings,
};
