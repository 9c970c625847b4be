//! Location error types.

use std::time::Duration;

use thiserror::Error;

use crate::platform::PlatformError;

/// Terminal failures of a location subscription.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// No fix was produced within the wait window.
    #[error("Location not available within {timeout:?}")]
    LocationUnavailable { timeout: Duration },

    /// No enabled provider satisfies the accuracy criterion.
    #[error("No enabled location provider found")]
    NoEnabledProvider,

    /// The platform rejected a call synchronously.
    #[error("Platform call failed: {0}")]
    PlatformCall(#[from] PlatformError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_error_display() {
        let err = LocationError::LocationUnavailable {
            timeout: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "Location not available within 10s");

        assert_eq!(
            LocationError::NoEnabledProvider.to_string(),
            "No enabled location provider found"
        );
    }

    #[test]
    fn test_location_error_from_platform() {
        let err: LocationError = PlatformError::PermissionDenied.into();
        assert!(matches!(
            err,
            LocationError::PlatformCall(PlatformError::PermissionDenied)
        ));
    }
}
