//! Location source over the system location manager.
//!
//! The manager exposes named providers ("gps", "network", ...) that the user
//! can switch on and off at any time. The best enabled fine-accuracy provider
//! is resolved on every use and never cached: registration, cached reads and
//! every provider switch each ask the manager again.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, error, info, warn};

use super::error::LocationError;
use super::model::Location;
use super::profile::{MANAGER_MIN_DISTANCE_M, MANAGER_UPDATE_INTERVAL};
use super::source::{BackendKind, LocationSource};
use super::subscription::{
    subscribe, ListenerRegistration, LocationStream, StreamOptions, SubscriptionBackend,
};
use crate::platform::{
    AccuracyCriterion, BoxFuture, DeliveryTarget, ListenerEvent, ListenerId,
    SystemLocationManager,
};

/// Provider used for background delivery when none is enabled.
const FALLBACK_BACKGROUND_PROVIDER: &str = "gps";

struct ManagerBackend {
    manager: Arc<dyn SystemLocationManager>,
}

impl ManagerBackend {
    fn best_enabled_provider(&self) -> Option<String> {
        self.manager.best_provider(AccuracyCriterion::Fine, true)
    }

    fn read_last_known(&self) -> Option<Location> {
        let provider = self.best_enabled_provider()?;
        match self.manager.last_known_location(&provider) {
            Ok(location) => location,
            Err(e) => {
                error!(provider = %provider, error = %e, "Last known location read failed");
                None
            }
        }
    }
}

impl SubscriptionBackend for ManagerBackend {
    fn name(&self) -> &'static str {
        "manager"
    }

    fn last_known(&self) -> BoxFuture<'_, Option<Location>> {
        let location = self.read_last_known();
        Box::pin(async move { location })
    }

    fn register(&self, registration: &ListenerRegistration) -> Result<(), LocationError> {
        let Some(provider) = self.best_enabled_provider() else {
            warn!(listener = %registration.listener_id(), "No enabled location provider");
            return Err(LocationError::NoEnabledProvider);
        };

        debug!(listener = %registration.listener_id(), provider = %provider, "Requesting manager updates");
        registration.register(|listener| {
            self.manager.request_location_updates(
                &provider,
                MANAGER_UPDATE_INTERVAL,
                MANAGER_MIN_DISTANCE_M,
                listener,
            )
        })?;
        Ok(())
    }

    fn on_signal(
        &self,
        signal: &ListenerEvent,
        registration: &ListenerRegistration,
    ) -> Result<(), LocationError> {
        match signal {
            ListenerEvent::ProviderEnabled(name) | ListenerEvent::ProviderDisabled(name) => {
                info!(provider = %name, event = ?signal, "Provider changed, re-resolving");
                self.register(registration)
            }
            other => {
                debug!(event = ?other, "Ignoring listener event");
                Ok(())
            }
        }
    }

    fn remove(&self, listener: ListenerId) {
        self.manager.remove_updates(listener);
    }
}

/// [`LocationSource`] backed by the system location manager.
///
/// Single fetches fall back to the cached location when no fix arrives or
/// no provider is enabled; a rejected platform call is returned to the
/// caller.
#[derive(Clone)]
pub struct ManagerLocationSource {
    backend: Arc<ManagerBackend>,
    timeout: Duration,
}

impl ManagerLocationSource {
    pub fn new(manager: Arc<dyn SystemLocationManager>, timeout: Duration) -> Self {
        Self {
            backend: Arc::new(ManagerBackend { manager }),
            timeout,
        }
    }

    async fn fetch_once_inner(&self) -> Result<Option<Location>, LocationError> {
        let mut stream = self.stream_with(StreamOptions::live_only());
        let first = stream.next().await;
        drop(stream);

        match first {
            Some(Ok(location)) => return Ok(Some(location)),
            Some(Err(e @ LocationError::PlatformCall(_))) => {
                error!(error = %e, "Single location fetch failed");
                return Err(e);
            }
            Some(Err(e)) => warn!(error = %e, "No live fix, reading last known location"),
            None => {}
        }

        // The manager answers cached reads synchronously.
        Ok(self.backend.read_last_known())
    }
}

impl LocationSource for ManagerLocationSource {
    fn kind(&self) -> BackendKind {
        BackendKind::Manager
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn stream_with(&self, options: StreamOptions) -> LocationStream {
        subscribe(Arc::clone(&self.backend), options, self.timeout)
    }

    fn fetch_once(&self) -> BoxFuture<'_, Result<Option<Location>, LocationError>> {
        Box::pin(self.fetch_once_inner())
    }

    fn arm_background_delivery(&self, target: &DeliveryTarget) {
        let provider = self
            .backend
            .best_enabled_provider()
            .unwrap_or_else(|| FALLBACK_BACKGROUND_PROVIDER.to_string());
        info!(endpoint = %target, provider = %provider, "Arming manager background delivery");

        if let Err(e) = self.backend.manager.request_background_updates(
            &provider,
            MANAGER_UPDATE_INTERVAL,
            MANAGER_MIN_DISTANCE_M,
            target,
        ) {
            error!(endpoint = %target, error = %e, "Manager background delivery registration failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{PlatformError, SimulatedPlatform, SimulatedProvider, SimulationConfig};
    use tokio::time::Instant;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn platform(has_last_known: bool) -> SimulatedPlatform {
        SimulatedPlatform::new(SimulationConfig {
            start: Location::new(10.0, 20.0),
            has_last_known,
            providers: vec![
                SimulatedProvider::new("gps", AccuracyCriterion::Fine),
                SimulatedProvider::new("network", AccuracyCriterion::Fine),
            ],
            ..SimulationConfig::default()
        })
    }

    fn source(platform: &SimulatedPlatform) -> ManagerLocationSource {
        ManagerLocationSource::new(Arc::new(platform.clone()), TIMEOUT)
    }

    async fn wait_for_provider(platform: &SimulatedPlatform, provider: &str) {
        while platform.manager_listener_providers() != vec![provider.to_string()] {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_value_from_best_provider_first() {
        let platform = platform(true);
        let source = source(&platform);

        let mut stream = source.stream(true);
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.coordinates(), (10.0, 20.0));
        assert_eq!(first.provider.as_deref(), Some("gps"));

        let waited = tokio::time::timeout(Duration::from_secs(30), stream.next()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_provider_fails_immediately() {
        let platform = platform(true);
        platform.set_provider_enabled("gps", false);
        platform.set_provider_enabled("network", false);
        let source = source(&platform);
        let start = Instant::now();

        let mut stream = source.stream(true);
        assert_eq!(stream.next().await, Some(Err(LocationError::NoEnabledProvider)));
        assert!(stream.next().await.is_none());
        assert!(start.elapsed() < TIMEOUT);
        assert_eq!(platform.stats().manager_requests, 0);
        assert_eq!(platform.stats().manager_removals, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_disable_reregisters_and_stays_open() {
        let platform = platform(false);
        let source = source(&platform);

        let mut stream = source.stream(false);
        wait_for_provider(&platform, "gps").await;

        platform.set_provider_enabled("gps", false);
        wait_for_provider(&platform, "network").await;

        platform.emit_fix();
        let fix = stream.next().await.unwrap().unwrap();
        assert_eq!(fix.provider.as_deref(), Some("network"));
        assert_eq!(platform.stats().manager_requests, 2);
        assert_eq!(platform.stats().manager_removals, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_enable_moves_back_to_best() {
        let platform = platform(false);
        platform.set_provider_enabled("gps", false);
        let source = source(&platform);

        let _stream = source.stream(false);
        wait_for_provider(&platform, "network").await;

        platform.set_provider_enabled("gps", true);
        wait_for_provider(&platform, "gps").await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_providers_disabled_closes_stream() {
        let platform = platform(false);
        let source = source(&platform);

        let mut stream = source.stream(false);
        wait_for_provider(&platform, "gps").await;

        platform.set_provider_enabled("gps", false);
        platform.set_provider_enabled("network", false);

        assert_eq!(stream.next().await, Some(Err(LocationError::NoEnabledProvider)));
        assert!(stream.next().await.is_none());
        assert!(platform.manager_listener_providers().is_empty());
        assert_eq!(platform.stats().manager_removals, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_removes_listener_once() {
        let platform = platform(false);
        let source = source(&platform);

        let mut stream = source.stream(true);
        assert!(matches!(
            stream.next().await,
            Some(Err(LocationError::LocationUnavailable { .. }))
        ));
        drop(stream);
        assert_eq!(platform.stats().manager_removals, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_once_propagates_platform_errors() {
        let platform = platform(true);
        platform.set_permission_granted(false);
        let source = source(&platform);

        assert_eq!(
            source.fetch_once().await,
            Err(LocationError::PlatformCall(PlatformError::PermissionDenied))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_once_falls_back_after_timeout() {
        let platform = platform(true);
        let source = source(&platform);
        let start = Instant::now();

        let fetched = source.fetch_once().await.unwrap().unwrap();
        assert_eq!(fetched.coordinates(), (10.0, 20.0));
        // The cached read is synchronous, so nothing is added to the window.
        assert!(start.elapsed() < TIMEOUT + Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_once_resolves_cached_provider_per_read() {
        let platform = platform(true);
        let source = source(&platform);

        let first = source.fetch_once().await.unwrap().unwrap();
        assert_eq!(first.provider.as_deref(), Some("gps"));

        platform.set_provider_enabled("gps", false);
        let second = source.fetch_once().await.unwrap().unwrap();
        assert_eq!(second.provider.as_deref(), Some("network"));

        platform.set_provider_enabled("gps", true);
        let third = source.fetch_once().await.unwrap().unwrap();
        assert_eq!(third.provider.as_deref(), Some("gps"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_once_without_provider_returns_none() {
        let platform = platform(true);
        platform.set_provider_enabled("gps", false);
        platform.set_provider_enabled("network", false);
        let source = source(&platform);

        assert_eq!(source.fetch_once().await, Ok(None));
    }

    #[tokio::test]
    async fn test_background_delivery_defaults_to_gps() {
        let platform = platform(false);
        platform.set_provider_enabled("gps", false);
        platform.set_provider_enabled("network", false);
        let source = source(&platform);

        source.arm_background_delivery(&DeliveryTarget::new(10, "boot"));
        assert_eq!(platform.background_targets().len(), 1);
        assert_eq!(platform.stats().background_registrations, 1);
    }
}
