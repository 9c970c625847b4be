//! Integration tests for the location capability.
//!
//! These tests drive both backends through the application wiring over the
//! simulated platform and verify:
//! - cached value first, then live fixes, in delivery order
//! - timeout at the configured window with exactly one deregistration
//! - bounded single fetch
//! - provider switches on the system manager backend
//!
//! Run with: `cargo test --test location_source_integration`

use std::time::Duration;

use futures::StreamExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use geofix::app::{AppConfig, GeofixApp};
use geofix::location::{BackendKind, Location, LocationError, LocationSource, FALLBACK_READ_SLACK};
use geofix::platform::{AccuracyCriterion, SimulatedPlatform, SimulatedProvider};

// ============================================================================
// Helper Functions
// ============================================================================

const TIMEOUT: Duration = Duration::from_secs(10);

/// Application on a simulated device at (10.0, 20.0).
fn simulated_app(backend: BackendKind, has_last_known: bool) -> (GeofixApp, SimulatedPlatform) {
    let mut config = AppConfig::default();
    config.location_timeout = TIMEOUT;
    config.fused_available = backend == BackendKind::Fused;
    config.simulation.start = Location::new(10.0, 20.0);
    config.simulation.has_last_known = has_last_known;
    config.simulation.providers = vec![
        SimulatedProvider::new("gps", AccuracyCriterion::Fine),
        SimulatedProvider::new("network", AccuracyCriterion::Fine),
    ];
    GeofixApp::simulated(config)
}

fn registrations(platform: &SimulatedPlatform) -> usize {
    platform.fused_listener_count() + platform.manager_listener_providers().len()
}

fn removals(platform: &SimulatedPlatform) -> u64 {
    let stats = platform.stats();
    stats.fused_removals + stats.manager_removals
}

async fn wait_for_registrations(platform: &SimulatedPlatform, count: usize) {
    while registrations(platform) != count {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

const BACKENDS: [BackendKind; 2] = [BackendKind::Fused, BackendKind::Manager];

// ============================================================================
// Integration Tests
// ============================================================================

/// Cached (10.0, 20.0) is emitted immediately and the stream never times out.
#[tokio::test(start_paused = true)]
async fn test_cached_value_first_then_live_fixes() {
    for backend in BACKENDS {
        let (app, platform) = simulated_app(backend, true);
        assert_eq!(app.source().kind(), backend);
        let start = Instant::now();

        let mut stream = app.source().stream(true);
        let cached = stream.next().await.unwrap().unwrap();
        assert_eq!(cached.coordinates(), (10.0, 20.0));
        assert!(start.elapsed() < Duration::from_millis(1));

        wait_for_registrations(&platform, 1).await;
        let first = platform.emit_fix();
        let second = platform.emit_fix();
        assert_eq!(stream.next().await.unwrap().unwrap().coordinates(), first.coordinates());
        assert_eq!(stream.next().await.unwrap().unwrap().coordinates(), second.coordinates());

        let quiet = tokio::time::timeout(TIMEOUT * 3, stream.next()).await;
        assert!(quiet.is_err(), "{} stream must stay open", backend);
    }
}

/// No cached and no live value: the stream fails at the window and the
/// listener is removed exactly once.
#[tokio::test(start_paused = true)]
async fn test_no_values_closes_at_timeout() {
    for backend in BACKENDS {
        let (app, platform) = simulated_app(backend, false);
        let start = Instant::now();

        let mut stream = app.source().stream(true);
        assert_eq!(
            stream.next().await,
            Some(Err(LocationError::LocationUnavailable { timeout: TIMEOUT }))
        );
        let elapsed = start.elapsed();
        assert!(elapsed >= TIMEOUT && elapsed < TIMEOUT + Duration::from_millis(50));
        assert!(stream.next().await.is_none());

        drop(stream);
        assert_eq!(removals(&platform), 1, "{} must deregister once", backend);
        assert_eq!(registrations(&platform), 0);
    }
}

/// Dropping a stream releases its listener at once.
#[tokio::test(start_paused = true)]
async fn test_cancellation_deregisters_once() {
    for backend in BACKENDS {
        let (app, platform) = simulated_app(backend, false);

        let streams: Vec<_> = (0..3).map(|_| app.source().stream(false)).collect();
        wait_for_registrations(&platform, 3).await;

        drop(streams);
        assert_eq!(registrations(&platform), 0);
        tokio::time::sleep(TIMEOUT * 2).await;
        assert_eq!(removals(&platform), 3);
    }
}

/// A single fetch with nothing to report returns `None` within the bound.
#[tokio::test(start_paused = true)]
async fn test_fetch_once_with_nothing_is_bounded() {
    for backend in BACKENDS {
        let (app, _platform) = simulated_app(backend, false);
        let start = Instant::now();

        assert_eq!(app.source().fetch_once().await, Ok(None));
        assert!(start.elapsed() <= TIMEOUT + FALLBACK_READ_SLACK);
    }
}

/// Fixes produced by the platform ticker reach a single fetch.
#[tokio::test(start_paused = true)]
async fn test_fetch_once_with_running_platform() {
    for backend in BACKENDS {
        let (app, platform) = simulated_app(backend, false);
        let cancel = CancellationToken::new();
        let ticker = platform.run(cancel.clone());
        let start = Instant::now();

        let fix = app.source().fetch_once().await.unwrap().unwrap();
        assert!(start.elapsed() < TIMEOUT);
        assert!(fix.provider.is_some());

        cancel.cancel();
        ticker.await.unwrap();
    }
}

/// The manager backend follows provider switches without closing the stream.
#[tokio::test(start_paused = true)]
async fn test_manager_follows_provider_switches() {
    let (app, platform) = simulated_app(BackendKind::Manager, false);

    let mut stream = app.source().stream(false);
    wait_for_registrations(&platform, 1).await;

    platform.set_provider_enabled("gps", false);
    while platform.manager_listener_providers() != vec!["network".to_string()] {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    platform.emit_fix();
    let fix = stream.next().await.unwrap().unwrap();
    assert_eq!(fix.provider.as_deref(), Some("network"));

    platform.set_provider_enabled("network", false);
    assert_eq!(stream.next().await, Some(Err(LocationError::NoEnabledProvider)));
    assert!(stream.next().await.is_none());
    assert_eq!(removals(&platform), 1);
}
