//! Geofence registration value.

use std::fmt;
use std::ops::BitOr;
use std::time::Duration;

use crate::location::Location;

/// Request id shared by every geofence this system registers.
///
/// Keeping it fixed is what lets a new registration replace the old one.
pub const GEOFENCE_REQUEST_ID: &str = "1";

/// Radius of the armed geofence in meters.
pub const GEOFENCE_RADIUS_M: f32 = 1000.0;

/// Request code of the geofence transition delivery target.
pub const GEOFENCE_TARGET_REQUEST_CODE: u32 = 11;

/// Set of transitions a geofence reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionMask(u8);

impl TransitionMask {
    /// Entering the region.
    pub const ENTER: Self = Self(1);
    /// Leaving the region.
    pub const EXIT: Self = Self(1 << 1);
    /// Staying inside the region.
    pub const DWELL: Self = Self(1 << 2);

    /// Whether every transition in `other` is also in `self`.
    pub fn contains(&self, other: TransitionMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bit representation.
    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl BitOr for TransitionMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// When a geofence stops being monitored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Monitored until removed.
    Never,
    /// Dropped by the platform after the given duration.
    After(Duration),
}

/// Transition reported immediately if the device is already in place when
/// the geofence is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialTrigger {
    Enter,
    Exit,
    Dwell,
}

/// A single circular geofence.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceRegistration {
    /// Stable request id.
    pub request_id: String,
    /// Center of the region.
    pub center: Location,
    /// Radius of the region in meters.
    pub radius_m: f32,
    /// Transitions to report.
    pub transitions: TransitionMask,
    /// Lifetime of the registration.
    pub expiration: Expiration,
    /// Transition reported when added while already inside.
    pub initial_trigger: InitialTrigger,
}

impl GeofenceRegistration {
    /// The geofence this system arms: fixed id and radius, enter and exit
    /// transitions, no expiration.
    pub fn centered_on(center: &Location) -> Self {
        Self {
            request_id: GEOFENCE_REQUEST_ID.to_string(),
            center: center.clone(),
            radius_m: GEOFENCE_RADIUS_M,
            transitions: TransitionMask::ENTER | TransitionMask::EXIT,
            expiration: Expiration::Never,
            initial_trigger: InitialTrigger::Enter,
        }
    }

    /// Whether `location` lies inside the region.
    pub fn contains(&self, location: &Location) -> bool {
        self.center.distance_to(location) <= f64::from(self.radius_m)
    }
}

impl fmt::Display for GeofenceRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "geofence '{}' at ({:.6}, {:.6}) r={:.0}m",
            self.request_id, self.center.latitude, self.center.longitude, self.radius_m
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_on_uses_fixed_identity() {
        let reg = GeofenceRegistration::centered_on(&Location::new(10.0, 20.0));
        assert_eq!(reg.request_id, "1");
        assert_eq!(reg.radius_m, 1000.0);
        assert_eq!(reg.expiration, Expiration::Never);
        assert_eq!(reg.initial_trigger, InitialTrigger::Enter);
        assert!(reg.transitions.contains(TransitionMask::ENTER));
        assert!(reg.transitions.contains(TransitionMask::EXIT));
        assert!(!reg.transitions.contains(TransitionMask::DWELL));
    }

    #[test]
    fn test_contains() {
        let center = Location::new(53.5, 10.0);
        let reg = GeofenceRegistration::centered_on(&center);
        assert!(reg.contains(&center.offset(900.0, 45.0)));
        assert!(!reg.contains(&center.offset(1100.0, 45.0)));
    }
}
