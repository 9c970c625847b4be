//! The location capability contract.
//!
//! Consumers see one "current location" regardless of which platform backend
//! produces it. The trait is object safe so the selected backend can be held
//! as `Arc<dyn LocationSource>`.

use std::fmt;
use std::time::Duration;

use super::error::LocationError;
use super::model::Location;
use super::subscription::{LocationStream, StreamOptions};
use crate::platform::{BoxFuture, DeliveryTarget};

/// Extra time a single fetch may spend on the cached-read fallback after the
/// live window has elapsed.
pub const FALLBACK_READ_SLACK: Duration = Duration::from_secs(1);

/// Which backend implements the capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Fused location provider.
    Fused,
    /// System location manager with named providers.
    Manager,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Fused => "fused",
            BackendKind::Manager => "manager",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source of device locations.
///
/// # Streams
///
/// A stream is lazy and cancelled by dropping it. It yields fixes in the
/// order the platform delivers them, optionally preceded by the cached last
/// known value, and yields at most one `Err` after which it ends. Every
/// stream owns exactly one platform listener registration, released exactly
/// once however the stream ends.
///
/// # Single fetch
///
/// [`fetch_once`](LocationSource::fetch_once) waits at most
/// [`timeout`](LocationSource::timeout) plus [`FALLBACK_READ_SLACK`].
pub trait LocationSource: Send + Sync {
    /// Backend implementing this source.
    fn kind(&self) -> BackendKind;

    /// How long a stream waits for its first value.
    fn timeout(&self) -> Duration;

    /// Open a stream with explicit options.
    fn stream_with(&self, options: StreamOptions) -> LocationStream;

    /// Open a stream that times out when no value arrives in time.
    ///
    /// With `emit_last_known_first`, the cached last known location (if any)
    /// is the first item, and its presence alone keeps the stream from
    /// timing out.
    fn stream(&self, emit_last_known_first: bool) -> LocationStream {
        self.stream_with(StreamOptions {
            ignore_last_known: !emit_last_known_first,
            with_timeout: true,
        })
    }

    /// Acquire one location.
    ///
    /// The first live fix wins; otherwise the cached location is read.
    /// `Ok(None)` means neither produced anything.
    fn fetch_once(&self) -> BoxFuture<'_, Result<Option<Location>, LocationError>>;

    /// Register durable background delivery of continuous updates to
    /// `target`. Fire-and-forget: failures are logged.
    fn arm_background_delivery(&self, target: &DeliveryTarget);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::Fused.to_string(), "fused");
        assert_eq!(BackendKind::Manager.to_string(), "manager");
    }
}
