//! Startup choice between the two location backends.
//!
//! The choice is made once. A source never switches backend mid-session,
//! even if fused availability changes later.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::error::LocationError;
use super::fused::FusedLocationSource;
use super::manager::ManagerLocationSource;
use super::model::Location;
use super::profile::{DeviceClass, LocationRequestProfile};
use super::source::{BackendKind, LocationSource};
use super::subscription::{LocationStream, StreamOptions};
use crate::platform::{BoxFuture, DeliveryTarget, FusedLocationClient, SystemLocationManager};

/// Result of backend selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub backend: BackendKind,
    pub profile: LocationRequestProfile,
}

/// Picks the backend and request profile.
pub struct ProviderSelector;

impl ProviderSelector {
    /// Fused when available, otherwise the system manager. The profile
    /// follows the device class.
    pub fn select(fused_available: bool, device_class: DeviceClass) -> Selection {
        let backend = if fused_available {
            BackendKind::Fused
        } else {
            BackendKind::Manager
        };
        Selection {
            backend,
            profile: LocationRequestProfile::for_device(device_class),
        }
    }
}

/// The backend chosen at startup.
#[derive(Clone)]
pub enum ActiveSource {
    Fused(FusedLocationSource),
    Manager(ManagerLocationSource),
}

impl ActiveSource {
    /// Build the source for `selection`.
    pub fn from_selection(
        selection: Selection,
        fused: Arc<dyn FusedLocationClient>,
        manager: Arc<dyn SystemLocationManager>,
        timeout: Duration,
    ) -> Self {
        info!(
            backend = %selection.backend,
            priority = ?selection.profile.priority,
            timeout_ms = timeout.as_millis() as u64,
            "Location backend selected"
        );
        match selection.backend {
            BackendKind::Fused => {
                ActiveSource::Fused(FusedLocationSource::new(fused, selection.profile, timeout))
            }
            BackendKind::Manager => {
                ActiveSource::Manager(ManagerLocationSource::new(manager, timeout))
            }
        }
    }

    fn inner(&self) -> &dyn LocationSource {
        match self {
            ActiveSource::Fused(source) => source as &dyn LocationSource,
            ActiveSource::Manager(source) => source,
        }
    }
}

impl LocationSource for ActiveSource {
    fn kind(&self) -> BackendKind {
        self.inner().kind()
    }

    fn timeout(&self) -> Duration {
        self.inner().timeout()
    }

    fn stream_with(&self, options: StreamOptions) -> LocationStream {
        self.inner().stream_with(options)
    }

    fn fetch_once(&self) -> BoxFuture<'_, Result<Option<Location>, LocationError>> {
        self.inner().fetch_once()
    }

    fn arm_background_delivery(&self, target: &DeliveryTarget) {
        self.inner().arm_background_delivery(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Priority;
    use crate::platform::SimulatedPlatform;

    #[test]
    fn test_select_matrix() {
        let s = ProviderSelector::select(true, DeviceClass::Standard);
        assert_eq!(s.backend, BackendKind::Fused);
        assert_eq!(s.profile.priority, Priority::HighAccuracy);

        let s = ProviderSelector::select(true, DeviceClass::Wearable);
        assert_eq!(s.backend, BackendKind::Fused);
        assert_eq!(s.profile.priority, Priority::BalancedPowerAccuracy);

        let s = ProviderSelector::select(false, DeviceClass::Standard);
        assert_eq!(s.backend, BackendKind::Manager);
    }

    #[tokio::test]
    async fn test_active_source_delegates_kind() {
        let platform = SimulatedPlatform::with_defaults();
        let selection = ProviderSelector::select(false, DeviceClass::Standard);
        let source = ActiveSource::from_selection(
            selection,
            Arc::new(platform.clone()),
            Arc::new(platform),
            Duration::from_secs(3),
        );
        assert_eq!(source.kind(), BackendKind::Manager);
        assert_eq!(source.timeout(), Duration::from_secs(3));
        assert!(matches!(source, ActiveSource::Manager(_)));
    }
}
