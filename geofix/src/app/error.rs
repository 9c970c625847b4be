//! Application error types.

use std::fmt;
use std::io;

use crate::config::ConfigFileError;

/// Errors that can occur while starting the application.
#[derive(Debug)]
pub enum AppError {
    /// Failed to load or save the configuration file.
    Config(ConfigFileError),

    /// Failed to set up logging.
    Logging(io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Logging(e) => write!(f, "Failed to initialize logging: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Logging(e) => Some(e),
        }
    }
}

impl From<ConfigFileError> for AppError {
    fn from(e: ConfigFileError) -> Self {
        AppError::Config(e)
    }
}

impl From<io::Error> for AppError {
    fn from(e: io::Error) -> Self {
        AppError::Logging(e)
    }
}
