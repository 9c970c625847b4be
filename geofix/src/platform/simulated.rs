//! In-process simulated platform.
//!
//! [`SimulatedPlatform`] implements all three platform facilities over one
//! shared, deterministic world: a position that moves a fixed step along a
//! fixed bearing each time a fix is produced, a list of named providers the
//! user can enable or disable, and a geofence table.
//!
//! Fixes are produced either by calling [`SimulatedPlatform::emit_fix`]
//! directly (tests) or by the ticking task started with
//! [`SimulatedPlatform::run`] (CLI).
//!
//! Every platform call is counted in [`SimulationStats`], which is how tests
//! check that registrations are released exactly once.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::error::PlatformError;
use super::traits::{
    AccuracyCriterion, BoxFuture, DeliveryTarget, FusedLocationClient, GeofencingClient,
    ListenerEvent, ListenerId, LocationListener, SystemLocationManager,
};
use crate::delivery::{DeliveryReceiver, LocationBatch};
use crate::geofence::GeofenceRegistration;
use crate::location::{Location, LocationRequestProfile};

/// Provider name attached to fused fixes.
pub const FUSED_PROVIDER_NAME: &str = "fused";

/// Accuracy reported for simulated fixes, in meters.
const SIMULATED_ACCURACY_M: f32 = 8.0;

/// A named system provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedProvider {
    /// Provider name ("gps", "network", ...).
    pub name: String,
    /// Accuracy class of the provider.
    pub accuracy: AccuracyCriterion,
    /// Whether the user has it switched on.
    pub enabled: bool,
}

impl SimulatedProvider {
    /// An enabled provider.
    pub fn new(name: impl Into<String>, accuracy: AccuracyCriterion) -> Self {
        Self {
            name: name.into(),
            accuracy,
            enabled: true,
        }
    }

    fn satisfies(&self, criterion: AccuracyCriterion) -> bool {
        match criterion {
            AccuracyCriterion::Fine => self.accuracy == AccuracyCriterion::Fine,
            AccuracyCriterion::Coarse => true,
        }
    }
}

/// Configuration of the simulated world.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Starting position.
    pub start: Location,
    /// Distance moved between fixes, in meters.
    pub step_m: f64,
    /// Direction of travel in degrees.
    pub bearing_deg: f64,
    /// Interval of the ticking task.
    pub fix_interval: Duration,
    /// Whether a last known location exists before the first fix.
    pub has_last_known: bool,
    /// Whether the fused facility reports itself available.
    pub fused_available: bool,
    /// System providers, in preference order.
    pub providers: Vec<SimulatedProvider>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: Location::new(53.5511, 9.9937),
            step_m: 150.0,
            bearing_deg: 90.0,
            fix_interval: Duration::from_secs(1),
            has_last_known: true,
            fused_available: true,
            providers: vec![
                SimulatedProvider::new("gps", AccuracyCriterion::Fine),
                SimulatedProvider::new("network", AccuracyCriterion::Coarse),
            ],
        }
    }
}

/// Counters of platform calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub fixes: u64,
    pub fused_registrations: u64,
    pub fused_removals: u64,
    pub manager_requests: u64,
    pub manager_removals: u64,
    pub background_registrations: u64,
    pub geofence_removals: u64,
    pub geofence_additions: u64,
}

struct SimState {
    position: Location,
    last_known: Option<Location>,
    providers: Vec<SimulatedProvider>,
    fused_listeners: BTreeMap<ListenerId, LocationListener>,
    manager_listeners: BTreeMap<ListenerId, (String, LocationListener)>,
    background: BTreeMap<u32, DeliveryTarget>,
    receivers: BTreeMap<u32, Arc<DeliveryReceiver>>,
    geofences: BTreeMap<String, (u32, GeofenceRegistration)>,
    permission_granted: bool,
    fail_last_location: bool,
    fail_geofencing: bool,
    stats: SimulationStats,
}

impl SimState {
    fn check_permission(&self) -> Result<(), PlatformError> {
        if self.permission_granted {
            Ok(())
        } else {
            Err(PlatformError::PermissionDenied)
        }
    }

    fn provider(&self, name: &str) -> Result<&SimulatedProvider, PlatformError> {
        self.providers
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| PlatformError::Rejected(format!("unknown provider '{}'", name)))
    }
}

/// Simulated implementation of every platform facility.
///
/// Clones share the same world.
#[derive(Clone)]
pub struct SimulatedPlatform {
    config: Arc<SimulationConfig>,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedPlatform {
    /// Create a simulated platform.
    pub fn new(config: SimulationConfig) -> Self {
        let last_known = config.has_last_known.then(|| {
            config
                .start
                .clone()
                .with_accuracy(SIMULATED_ACCURACY_M)
                .with_timestamp(Utc::now())
        });
        let state = SimState {
            position: config.start.clone(),
            last_known,
            providers: config.providers.clone(),
            fused_listeners: BTreeMap::new(),
            manager_listeners: BTreeMap::new(),
            background: BTreeMap::new(),
            receivers: BTreeMap::new(),
            geofences: BTreeMap::new(),
            permission_granted: true,
            fail_last_location: false,
            fail_geofencing: false,
            stats: SimulationStats::default(),
        };
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Create a simulated platform with the default world.
    pub fn with_defaults() -> Self {
        Self::new(SimulationConfig::default())
    }

    /// Produce one fix at the current position, then advance.
    ///
    /// The fix goes to every fused listener, to every manager listener whose
    /// provider is enabled, and to every attached background receiver.
    pub fn emit_fix(&self) -> Location {
        let (fix, fused, managed, receivers) = {
            let mut state = self.state.lock();
            let fix = state
                .position
                .clone()
                .with_accuracy(SIMULATED_ACCURACY_M)
                .with_timestamp(Utc::now());
            state.position = state.position.offset(self.config.step_m, self.config.bearing_deg);
            state.last_known = Some(fix.clone());
            state.stats.fixes += 1;

            let fused: Vec<LocationListener> = state.fused_listeners.values().cloned().collect();
            let managed: Vec<(String, LocationListener)> = state
                .manager_listeners
                .values()
                .filter(|(provider, _)| {
                    state
                        .providers
                        .iter()
                        .any(|p| &p.name == provider && p.enabled)
                })
                .cloned()
                .collect();
            let receivers: Vec<Arc<DeliveryReceiver>> = state
                .background
                .keys()
                .filter_map(|code| state.receivers.get(code).cloned())
                .collect();
            (fix, fused, managed, receivers)
        };

        for listener in fused {
            listener.on_location(fix.clone().with_provider(FUSED_PROVIDER_NAME));
        }
        for (provider, listener) in managed {
            listener.on_location(fix.clone().with_provider(provider));
        }
        for receiver in receivers {
            receiver.on_delivery(Some(LocationBatch::single(fix.clone())));
        }

        debug!(fix = %fix, "Simulated fix emitted");
        fix
    }

    /// Broadcast a fused availability change to every fused listener.
    pub fn broadcast_availability(&self, available: bool) {
        let listeners: Vec<LocationListener> =
            self.state.lock().fused_listeners.values().cloned().collect();
        for listener in listeners {
            listener.deliver(ListenerEvent::Availability(available));
        }
    }

    /// Switch a system provider on or off and notify manager listeners.
    ///
    /// Returns false if no provider has that name.
    pub fn set_provider_enabled(&self, name: &str, enabled: bool) -> bool {
        let listeners = {
            let mut state = self.state.lock();
            let Some(provider) = state.providers.iter_mut().find(|p| p.name == name) else {
                return false;
            };
            provider.enabled = enabled;
            state
                .manager_listeners
                .values()
                .map(|(_, listener)| listener.clone())
                .collect::<Vec<_>>()
        };

        info!(provider = name, enabled, "Simulated provider toggled");
        let event = if enabled {
            ListenerEvent::ProviderEnabled(name.to_string())
        } else {
            ListenerEvent::ProviderDisabled(name.to_string())
        };
        for listener in listeners {
            listener.deliver(event.clone());
        }
        true
    }

    /// Replace the cached last known location.
    pub fn set_last_known(&self, location: Option<Location>) {
        self.state.lock().last_known = location;
    }

    /// Grant or revoke location permission.
    pub fn set_permission_granted(&self, granted: bool) {
        self.state.lock().permission_granted = granted;
    }

    /// Make cached location reads fail.
    pub fn set_fail_last_location(&self, fail: bool) {
        self.state.lock().fail_last_location = fail;
    }

    /// Make geofencing calls complete with an error.
    pub fn set_fail_geofencing(&self, fail: bool) {
        self.state.lock().fail_geofencing = fail;
    }

    /// Attach the endpoint that receives deliveries for `request_code`.
    pub fn attach_receiver(&self, request_code: u32, receiver: Arc<DeliveryReceiver>) {
        self.state.lock().receivers.insert(request_code, receiver);
    }

    /// Number of live fused listener registrations.
    pub fn fused_listener_count(&self) -> usize {
        self.state.lock().fused_listeners.len()
    }

    /// Providers of live manager listener registrations.
    pub fn manager_listener_providers(&self) -> Vec<String> {
        self.state
            .lock()
            .manager_listeners
            .values()
            .map(|(provider, _)| provider.clone())
            .collect()
    }

    /// Registered background delivery targets.
    pub fn background_targets(&self) -> Vec<DeliveryTarget> {
        self.state.lock().background.values().cloned().collect()
    }

    /// Currently registered geofences.
    pub fn geofences(&self) -> Vec<GeofenceRegistration> {
        self.state
            .lock()
            .geofences
            .values()
            .map(|(_, registration)| registration.clone())
            .collect()
    }

    /// Call counters.
    pub fn stats(&self) -> SimulationStats {
        self.state.lock().stats
    }

    /// Start producing a fix every `fix_interval` until cancelled.
    pub fn run(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let platform = self.clone();
        let period = self.config.fix_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick completes immediately; skip it so fixes start one period in.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        platform.emit_fix();
                    }
                }
            }
            debug!("Simulated platform stopped");
        })
    }
}

impl FusedLocationClient for SimulatedPlatform {
    fn is_available(&self) -> bool {
        self.config.fused_available
    }

    fn last_location(&self) -> BoxFuture<'_, Result<Option<Location>, PlatformError>> {
        let result = {
            let state = self.state.lock();
            if state.fail_last_location {
                Err(PlatformError::ServiceUnavailable)
            } else {
                state.check_permission().map(|()| {
                    state
                        .last_known
                        .clone()
                        .map(|l| l.with_provider(FUSED_PROVIDER_NAME))
                })
            }
        };
        Box::pin(async move { result })
    }

    fn request_location_updates(
        &self,
        profile: &LocationRequestProfile,
        listener: LocationListener,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.check_permission()?;
        debug!(listener = %listener.id(), priority = ?profile.priority, "Fused updates requested");
        state.fused_listeners.insert(listener.id(), listener);
        state.stats.fused_registrations += 1;
        Ok(())
    }

    fn remove_location_updates(&self, listener: ListenerId) {
        let mut state = self.state.lock();
        state.fused_listeners.remove(&listener);
        state.stats.fused_removals += 1;
    }

    fn request_background_updates(
        &self,
        profile: &LocationRequestProfile,
        target: &DeliveryTarget,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.check_permission()?;
        debug!(endpoint = %target, priority = ?profile.priority, "Fused background delivery registered");
        state.background.insert(target.request_code, target.clone());
        state.stats.background_registrations += 1;
        Ok(())
    }
}

impl SystemLocationManager for SimulatedPlatform {
    fn best_provider(&self, criterion: AccuracyCriterion, enabled_only: bool) -> Option<String> {
        let state = self.state.lock();
        let candidates: Vec<&SimulatedProvider> = state
            .providers
            .iter()
            .filter(|p| (p.enabled || !enabled_only) && p.satisfies(criterion))
            .collect();
        candidates
            .iter()
            .find(|p| p.accuracy == AccuracyCriterion::Fine)
            .or_else(|| candidates.first())
            .map(|p| p.name.clone())
    }

    fn last_known_location(&self, provider: &str) -> Result<Option<Location>, PlatformError> {
        let state = self.state.lock();
        state.check_permission()?;
        if state.fail_last_location {
            return Err(PlatformError::ServiceUnavailable);
        }
        let name = state.provider(provider)?.name.clone();
        Ok(state.last_known.clone().map(|l| l.with_provider(name)))
    }

    fn request_location_updates(
        &self,
        provider: &str,
        min_interval: Duration,
        min_distance_m: f32,
        listener: LocationListener,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.check_permission()?;
        state.provider(provider)?;
        debug!(
            listener = %listener.id(),
            provider,
            min_interval_ms = min_interval.as_millis() as u64,
            min_distance_m,
            "Manager updates requested"
        );
        state
            .manager_listeners
            .insert(listener.id(), (provider.to_string(), listener));
        state.stats.manager_requests += 1;
        Ok(())
    }

    fn remove_updates(&self, listener: ListenerId) {
        let mut state = self.state.lock();
        state.manager_listeners.remove(&listener);
        state.stats.manager_removals += 1;
    }

    fn request_background_updates(
        &self,
        provider: &str,
        min_interval: Duration,
        min_distance_m: f32,
        target: &DeliveryTarget,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.check_permission()?;
        state.provider(provider)?;
        debug!(
            endpoint = %target,
            provider,
            min_interval_ms = min_interval.as_millis() as u64,
            min_distance_m,
            "Manager background delivery registered"
        );
        state.background.insert(target.request_code, target.clone());
        state.stats.background_registrations += 1;
        Ok(())
    }
}

impl GeofencingClient for SimulatedPlatform {
    fn remove_geofences(&self, target: &DeliveryTarget) -> BoxFuture<'static, Result<(), PlatformError>> {
        let result = {
            let mut state = self.state.lock();
            state.stats.geofence_removals += 1;
            if state.fail_geofencing {
                Err(PlatformError::Rejected("geofence removal failed".to_string()))
            } else {
                let code = target.request_code;
                state.geofences.retain(|_, (owner, _)| *owner != code);
                Ok(())
            }
        };
        Box::pin(async move { result })
    }

    fn add_geofences(
        &self,
        registration: &GeofenceRegistration,
        target: &DeliveryTarget,
    ) -> BoxFuture<'static, Result<(), PlatformError>> {
        let result = {
            let mut state = self.state.lock();
            state.stats.geofence_additions += 1;
            if state.fail_geofencing {
                Err(PlatformError::Rejected("geofence addition failed".to_string()))
            } else {
                state.check_permission().map(|()| {
                    state.geofences.insert(
                        registration.request_id.clone(),
                        (target.request_code, registration.clone()),
                    );
                })
            }
        };
        Box::pin(async move { result })
    }
}
