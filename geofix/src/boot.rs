//! Registration work performed when the device finishes booting.
//!
//! Platform registrations do not survive a reboot. On a boot signal the
//! background delivery is registered again and the geofence is re-armed
//! once around the current position.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::geofence::{ArmOutcome, GeofenceArmer};
use crate::location::LocationSource;
use crate::platform::DeliveryTarget;

/// Request code of the boot-time background delivery target.
pub const BOOT_DELIVERY_REQUEST_CODE: u32 = 10;

/// A system broadcast received by the boot entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootAction {
    /// Boot finished and the user unlocked the device.
    BootCompleted,
    /// Boot finished, device still locked (direct boot).
    LockedBootCompleted,
    /// Anything else.
    Other(String),
}

impl BootAction {
    /// Whether this action should trigger registration.
    pub fn is_boot(&self) -> bool {
        matches!(self, BootAction::BootCompleted | BootAction::LockedBootCompleted)
    }
}

impl FromStr for BootAction {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "boot-completed" | "BOOT_COMPLETED" => BootAction::BootCompleted,
            "locked-boot-completed" | "LOCKED_BOOT_COMPLETED" => BootAction::LockedBootCompleted,
            other => BootAction::Other(other.to_string()),
        })
    }
}

impl fmt::Display for BootAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootAction::BootCompleted => f.write_str("boot-completed"),
            BootAction::LockedBootCompleted => f.write_str("locked-boot-completed"),
            BootAction::Other(action) => f.write_str(action),
        }
    }
}

/// Boot entry point.
pub struct BootRegistration<S: LocationSource + ?Sized> {
    source: Arc<S>,
    armer: GeofenceArmer<S>,
    delivery_target: DeliveryTarget,
}

impl<S: LocationSource + ?Sized + 'static> BootRegistration<S> {
    pub fn new(source: Arc<S>, armer: GeofenceArmer<S>, delivery_target: DeliveryTarget) -> Self {
        Self {
            source,
            armer,
            delivery_target,
        }
    }

    /// Handle a boot signal.
    ///
    /// Returns the spawned geofence arm task, or `None` when the action is
    /// not a boot action. Never blocks.
    pub fn on_boot(&self, action: &BootAction, handle: &Handle) -> Option<JoinHandle<ArmOutcome>> {
        if !action.is_boot() {
            debug!(%action, "Ignoring non-boot action");
            return None;
        }

        info!(%action, backend = %self.source.kind(), "Boot completed, re-registering location services");
        self.source.arm_background_delivery(&self.delivery_target);
        Some(self.armer.trigger(handle))
    }
}
