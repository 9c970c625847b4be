//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use geofix::app::AppError;
use geofix::config::ConfigFileError;
use geofix::location::LocationError;
use geofix::platform::PlatformError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to create the Tokio runtime
    Runtime(std::io::Error),
    /// Location could not be obtained
    Location(LocationError),
    /// Location source returned nothing
    NoLocation,
    /// A background task panicked or was cancelled
    Task(String),
    /// Failed to serialize JSON output
    Output(serde_json::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Location(LocationError::NoEnabledProvider) => {
                eprintln!();
                eprintln!("Enable at least one fine-accuracy provider, e.g. in config.ini:");
                eprintln!("  [simulation]");
                eprintln!("  providers = gps,network");
            }
            CliError::Location(LocationError::PlatformCall(PlatformError::PermissionDenied)) => {
                eprintln!();
                eprintln!("Location permission has not been granted.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to create Tokio runtime: {}", e),
            CliError::Location(e) => write!(f, "Location error: {}", e),
            CliError::NoLocation => write!(f, "No location available"),
            CliError::Task(msg) => write!(f, "Background task failed: {}", msg),
            CliError::Output(e) => write!(f, "Failed to write output: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::Location(e) => Some(e),
            CliError::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::Config(e) => CliError::Config(e.to_string()),
            AppError::Logging(e) => CliError::LoggingInit(e.to_string()),
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LocationError> for CliError {
    fn from(e: LocationError) -> Self {
        CliError::Location(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}

impl From<tokio::task::JoinError> for CliError {
    fn from(e: tokio::task::JoinError) -> Self {
        CliError::Task(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(CliError::NoLocation.to_string(), "No location available");
        let err: CliError = LocationError::NoEnabledProvider.into();
        assert_eq!(
            err.to_string(),
            "Location error: No enabled location provider found"
        );
    }

    #[test]
    fn test_from_app_error() {
        let err: CliError = AppError::Config(ConfigFileError::WriteError("x".into())).into();
        assert!(matches!(err, CliError::Config(_)));
    }
}
