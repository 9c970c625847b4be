//! Location request profiles.
//!
//! Two fixed profiles exist. The high accuracy one is used on standard
//! devices, the balanced power one on wearables. The choice is made once at
//! startup by [`super::ProviderSelector`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How long a subscription waits for its first fix before giving up.
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum time between system manager updates.
pub const MANAGER_UPDATE_INTERVAL: Duration = Duration::from_secs(1);

/// Minimum displacement between system manager updates, in meters.
pub const MANAGER_MIN_DISTANCE_M: f32 = 100.0;

/// Request priority passed to the fused provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Best available accuracy (GPS).
    HighAccuracy,
    /// City-block accuracy, lower power.
    BalancedPowerAccuracy,
}

/// Device class used to pick a request profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceClass {
    /// Phone or tablet.
    #[default]
    Standard,
    /// Watch or other wearable.
    Wearable,
}

impl DeviceClass {
    /// Config file spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Standard => "standard",
            DeviceClass::Wearable => "wearable",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(DeviceClass::Standard),
            "wearable" => Ok(DeviceClass::Wearable),
            other => Err(format!("unknown device class '{}'", other)),
        }
    }
}

/// Parameters of a location update request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationRequestProfile {
    /// Accuracy/power trade-off.
    pub priority: Priority,
    /// Desired interval between updates.
    pub interval: Duration,
    /// Fastest interval the app can handle.
    pub fastest_interval: Duration,
    /// Minimum displacement between updates, in meters.
    pub min_displacement_m: f32,
}

impl LocationRequestProfile {
    /// Profile for standard devices.
    pub const HIGH_ACCURACY: Self = Self {
        priority: Priority::HighAccuracy,
        interval: Duration::from_millis(1000),
        fastest_interval: Duration::from_secs(10),
        min_displacement_m: 100.0,
    };

    /// Profile for wearables.
    pub const BALANCED_POWER: Self = Self {
        priority: Priority::BalancedPowerAccuracy,
        interval: Duration::from_secs(5),
        fastest_interval: Duration::from_secs(60),
        min_displacement_m: 500.0,
    };

    /// Profile for the given device class.
    pub fn for_device(class: DeviceClass) -> Self {
        match class {
            DeviceClass::Standard => Self::HIGH_ACCURACY,
            DeviceClass::Wearable => Self::BALANCED_POWER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_for_device() {
        assert_eq!(
            LocationRequestProfile::for_device(DeviceClass::Standard).priority,
            Priority::HighAccuracy
        );
        let wear = LocationRequestProfile::for_device(DeviceClass::Wearable);
        assert_eq!(wear.priority, Priority::BalancedPowerAccuracy);
        assert_eq!(wear.interval, Duration::from_secs(5));
        assert_eq!(wear.min_displacement_m, 500.0);
    }

    #[test]
    fn test_device_class_parse() {
        assert_eq!("Wearable".parse::<DeviceClass>(), Ok(DeviceClass::Wearable));
        assert_eq!(" standard ".parse::<DeviceClass>(), Ok(DeviceClass::Standard));
        assert!("toaster".parse::<DeviceClass>().is_err());
    }
}
