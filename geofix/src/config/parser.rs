//! INI parsing: `Ini` → `GeofixConfig`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::GeofixConfig;
use crate::platform::{AccuracyCriterion, SimulatedProvider};
use crate::worker::BackoffPolicy;

/// Parse an `Ini` object into a `GeofixConfig`.
///
/// Starts from `GeofixConfig::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<GeofixConfig, ConfigFileError> {
    let mut config = GeofixConfig::default();

    // [location] section
    if let Some(section) = ini.section(Some("location")) {
        if let Some(v) = section.get("timeout_secs") {
            config.location.timeout_secs =
                parse_positive(v, "location", "timeout_secs", "must be a positive integer (seconds)")?;
        }
        if let Some(v) = section.get("device_class") {
            config.location.device_class = v.parse().map_err(|_| {
                invalid("location", "device_class", v, "must be 'standard' or 'wearable'")
            })?;
        }
        if let Some(v) = section.get("fused_available") {
            config.location.fused_available = parse_bool(v);
        }
    }

    // [geofence] section
    if let Some(section) = ini.section(Some("geofence")) {
        if let Some(v) = section.get("target_request_code") {
            config.geofence.target_request_code = parse_value(
                v,
                "geofence",
                "target_request_code",
                "must be a non-negative integer",
            )?;
        }
    }

    // [boot] section
    if let Some(section) = ini.section(Some("boot")) {
        if let Some(v) = section.get("delivery_request_code") {
            config.boot.delivery_request_code = parse_value(
                v,
                "boot",
                "delivery_request_code",
                "must be a non-negative integer",
            )?;
        }
    }

    // [worker] section
    if let Some(section) = ini.section(Some("worker")) {
        if let Some(v) = section.get("interval_secs") {
            config.worker.interval_secs =
                parse_positive(v, "worker", "interval_secs", "must be a positive integer (seconds)")?;
        }
        let mut base = config.worker.backoff.base();
        if let Some(v) = section.get("backoff_base_secs") {
            base = Duration::from_secs(parse_positive(
                v,
                "worker",
                "backoff_base_secs",
                "must be a positive integer (seconds)",
            )?);
        }
        let kind = section.get("backoff").unwrap_or(config.worker.backoff.name());
        config.worker.backoff = BackoffPolicy::from_name(kind, base)
            .ok_or_else(|| invalid("worker", "backoff", kind, "must be 'exponential' or 'linear'"))?;
    }

    // [simulation] section
    if let Some(section) = ini.section(Some("simulation")) {
        if let Some(v) = section.get("latitude") {
            let lat: f64 = parse_value(v, "simulation", "latitude", "must be a number")?;
            if !(-90.0..=90.0).contains(&lat) {
                return Err(invalid("simulation", "latitude", v, "must be between -90 and 90"));
            }
            config.simulation.latitude = lat;
        }
        if let Some(v) = section.get("longitude") {
            let lon: f64 = parse_value(v, "simulation", "longitude", "must be a number")?;
            if !(-180.0..=180.0).contains(&lon) {
                return Err(invalid("simulation", "longitude", v, "must be between -180 and 180"));
            }
            config.simulation.longitude = lon;
        }
        if let Some(v) = section.get("step_m") {
            let step: f64 = parse_value(v, "simulation", "step_m", "must be a number (meters)")?;
            if step < 0.0 {
                return Err(invalid("simulation", "step_m", v, "must not be negative"));
            }
            config.simulation.step_m = step;
        }
        if let Some(v) = section.get("fix_interval_ms") {
            config.simulation.fix_interval_ms = parse_positive(
                v,
                "simulation",
                "fix_interval_ms",
                "must be a positive integer (milliseconds)",
            )?;
        }
        if let Some(v) = section.get("has_last_known") {
            config.simulation.has_last_known = parse_bool(v);
        }
        if let Some(v) = section.get("providers") {
            config.simulation.providers = parse_providers(v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(
    value: &str,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_positive(value: &str, section: &str, key: &str, reason: &str) -> Result<u64, ConfigFileError> {
    match parse_value::<u64>(value, section, key, reason)? {
        0 => Err(invalid(section, key, value, reason)),
        n => Ok(n),
    }
}

/// Parse `name[:fine|:coarse],...`.
///
/// Without a suffix, "gps" is fine and every other provider coarse.
fn parse_providers(value: &str) -> Result<Vec<SimulatedProvider>, ConfigFileError> {
    let mut providers = Vec::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, accuracy) = match entry.split_once(':') {
            Some((name, "fine")) => (name.trim(), AccuracyCriterion::Fine),
            Some((name, "coarse")) => (name.trim(), AccuracyCriterion::Coarse),
            Some(_) => {
                return Err(invalid(
                    "simulation",
                    "providers",
                    value,
                    "accuracy suffix must be ':fine' or ':coarse'",
                ))
            }
            None if entry == "gps" => (entry, AccuracyCriterion::Fine),
            None => (entry, AccuracyCriterion::Coarse),
        };
        providers.push(SimulatedProvider::new(name, accuracy));
    }

    if providers.is_empty() {
        return Err(invalid(
            "simulation",
            "providers",
            value,
            "at least one provider is required",
        ));
    }
    Ok(providers)
}

pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::DeviceClass;

    fn parse(content: &str) -> Result<GeofixConfig, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), GeofixConfig::default());
    }

    #[test]
    fn test_location_section() {
        let config = parse(
            "[location]\ntimeout_secs = 30\ndevice_class = wearable\nfused_available = no\n",
        )
        .unwrap();
        assert_eq!(config.location.timeout_secs, 30);
        assert_eq!(config.location.device_class, DeviceClass::Wearable);
        assert!(!config.location.fused_available);
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let err = parse("[location]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref key, .. } if key == "timeout_secs"
        ));
    }

    #[test]
    fn test_invalid_device_class() {
        let err = parse("[location]\ndevice_class = toaster\n").unwrap_err();
        assert!(err.to_string().contains("location.device_class"));
    }

    #[test]
    fn test_worker_backoff() {
        let config = parse("[worker]\nbackoff = linear\nbackoff_base_secs = 30\n").unwrap();
        assert_eq!(config.worker.backoff, BackoffPolicy::linear(Duration::from_secs(30)));

        let config = parse("[worker]\nbackoff_base_secs = 5\n").unwrap();
        assert_eq!(config.worker.backoff, BackoffPolicy::exponential(Duration::from_secs(5)));

        assert!(parse("[worker]\nbackoff = random\n").is_err());
    }

    #[test]
    fn test_simulation_providers() {
        let config = parse("[simulation]\nproviders = gps, network:fine, passive\n").unwrap();
        let providers = &config.simulation.providers;
        assert_eq!(providers.len(), 3);
        assert_eq!(providers[0].accuracy, AccuracyCriterion::Fine);
        assert_eq!(providers[1].name, "network");
        assert_eq!(providers[1].accuracy, AccuracyCriterion::Fine);
        assert_eq!(providers[2].accuracy, AccuracyCriterion::Coarse);

        assert!(parse("[simulation]\nproviders = gps:ultra\n").is_err());
        assert!(parse("[simulation]\nproviders = ,\n").is_err());
    }

    #[test]
    fn test_latitude_out_of_range() {
        assert!(parse("[simulation]\nlatitude = 91\n").is_err());
        assert!(parse("[simulation]\nlongitude = abc\n").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("YES"));
        assert!(parse_bool(" 1 "));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("maybe"));
    }
}
