//! Configuration file handling for ~/.geofix/config.ini.
//!
//! Settings structs live in [`super::settings`], constants in
//! [`super::defaults`], parsing in [`super::parser`], and serialization in
//! [`super::writer`].

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::GeofixConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl GeofixConfig {
    /// Load configuration from the default path (~/.geofix/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }
}

/// Get the path to the config directory (~/.geofix).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".geofix")
}

/// Get the path to the config file (~/.geofix/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use crate::location::DeviceClass;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = GeofixConfig::default();

        assert_eq!(config.location.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.location.device_class, DeviceClass::Standard);
        assert!(config.location.fused_available);
        assert_eq!(config.geofence.target_request_code, 11);
        assert_eq!(config.boot.delivery_request_code, 10);
        assert!(config.logging.directory.ends_with("logs"));
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = GeofixConfig::load_from(&config_path).unwrap();
        assert_eq!(config, GeofixConfig::default());
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.ini");

        GeofixConfig::default().save_to(&config_path).unwrap();
        assert!(config_path.exists());
    }

    #[test]
    fn test_config_file_path() {
        assert!(config_file_path().ends_with(".geofix/config.ini"));
    }
}
