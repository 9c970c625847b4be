//! INI serialization: `GeofixConfig` → commented INI string.

use super::settings::GeofixConfig;
use crate::platform::AccuracyCriterion;

/// Convert a `GeofixConfig` to a commented INI string for saving.
pub(super) fn to_config_string(config: &GeofixConfig) -> String {
    let providers = config
        .simulation
        .providers
        .iter()
        .map(|p| {
            let accuracy = match p.accuracy {
                AccuracyCriterion::Fine => "fine",
                AccuracyCriterion::Coarse => "coarse",
            };
            format!("{}:{}", p.name, accuracy)
        })
        .collect::<Vec<_>>()
        .join(",");

    format!(
        r#"[location]
; Seconds a location stream waits for its first fix before failing
timeout_secs = {}
; Device class, selects the location request profile:
;   standard - high accuracy (1s interval, 100m displacement)
;   wearable - balanced power (5s interval, 500m displacement)
device_class = {}
; Use the fused location provider when true, the system location manager otherwise
fused_available = {}

[geofence]
; Request code of the delivery target for geofence transitions
target_request_code = {}

[boot]
; Request code of the delivery target for background updates armed at boot
delivery_request_code = {}

[worker]
; Seconds between successful worker steps
interval_secs = {}
; Retry delay policy: exponential or linear (capped at 5 hours)
backoff = {}
backoff_base_secs = {}

[simulation]
; Starting position of the simulated device
latitude = {}
longitude = {}
; Meters moved between fixes
step_m = {}
; Milliseconds between fixes
fix_interval_ms = {}
; Whether a cached location exists at startup
has_last_known = {}
; System providers in preference order: name[:fine|:coarse],...
providers = {}

[logging]
directory = {}
file = {}
"#,
        config.location.timeout_secs,
        config.location.device_class,
        config.location.fused_available,
        config.geofence.target_request_code,
        config.boot.delivery_request_code,
        config.worker.interval_secs,
        config.worker.backoff.name(),
        config.worker.backoff.base().as_secs(),
        config.simulation.latitude,
        config.simulation.longitude,
        config.simulation.step_m,
        config.simulation.fix_interval_ms,
        config.simulation.has_last_known,
        providers,
        config.logging.directory.display(),
        config.logging.file,
    )
}

#[cfg(test)]
mod tests {
    use super::super::settings::GeofixConfig;
    use crate::location::DeviceClass;
    use crate::platform::{AccuracyCriterion, SimulatedProvider};
    use crate::worker::BackoffPolicy;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        let mut config = GeofixConfig::default();
        config.location.timeout_secs = 25;
        config.location.device_class = DeviceClass::Wearable;
        config.location.fused_available = false;
        config.worker.backoff = BackoffPolicy::linear(Duration::from_secs(90));
        config.simulation.latitude = -33.8688;
        config.simulation.providers = vec![
            SimulatedProvider::new("network", AccuracyCriterion::Fine),
            SimulatedProvider::new("gps", AccuracyCriterion::Coarse),
        ];
        config.logging.directory = temp_dir.path().join("logs");

        config.save_to(&config_path).unwrap();
        let loaded = GeofixConfig::load_from(&config_path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_default_file_is_commented() {
        let content = super::to_config_string(&GeofixConfig::default());
        assert!(content.contains("[location]"));
        assert!(content.contains("; Retry delay policy"));
        assert!(content.contains("providers = gps:fine,network:coarse"));
    }
}
