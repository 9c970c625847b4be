//! Platform call errors.

use thiserror::Error;

/// Errors reported by platform location facilities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// Location permission is not (or no longer) granted.
    #[error("Location permission not granted")]
    PermissionDenied,

    /// The platform facility is not reachable.
    #[error("Location service unavailable")]
    ServiceUnavailable,

    /// The platform refused the request.
    #[error("Request rejected: {0}")]
    Rejected(String),
}
