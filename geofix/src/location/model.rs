//! Location value type.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (haversine).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A single fix reported by the platform.
///
/// Produced by the platform and never mutated afterwards. Builders exist
/// only to assemble a value before it is handed out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Horizontal accuracy radius in meters, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f32>,
    /// When the fix was taken, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Name of the platform provider that produced the fix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl Location {
    /// Create a location with coordinates only.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
            timestamp: None,
            provider: None,
        }
    }

    /// Set the accuracy radius.
    pub fn with_accuracy(mut self, accuracy_m: f32) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    /// Set the fix timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the producing provider name.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Latitude/longitude pair.
    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Great-circle distance to another location in meters.
    pub fn distance_to(&self, other: &Location) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// Location reached by moving `distance_m` along `bearing_deg` from here.
    pub fn offset(&self, distance_m: f64, bearing_deg: f64) -> Location {
        let angular = distance_m / EARTH_RADIUS_M;
        let bearing = bearing_deg.to_radians();
        let lat1 = self.latitude.to_radians();
        let lon1 = self.longitude.to_radians();

        let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
        let lon2 = lon1
            + (bearing.sin() * angular.sin() * lat1.cos()).atan2(angular.cos() - lat1.sin() * lat2.sin());

        Location::new(lat2.to_degrees(), lon2.to_degrees())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)?;
        if let Some(accuracy) = self.accuracy_m {
            write!(f, " ±{:.0}m", accuracy)?;
        }
        if let Some(provider) = &self.provider {
            write!(f, " [{}]", provider)?;
        }
        Ok(())
    }
}
