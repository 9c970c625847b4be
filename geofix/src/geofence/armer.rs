//! Re-arming the geofence around the current position.
//!
//! ```text
//!  arm() ── fetch_once ──► None / Err ──► NoFix (nothing touched)
//!                 │
//!                 └──► Some(center) ──► remove_geofences(target) ─┐ spawned,
//!                                   └─► add_geofences(fence, target) ┘ logged only
//! ```
//!
//! Remove and add are issued back to back against the same delivery target
//! and request id. Their completions are awaited on separate tasks with no
//! ordering between them; neither is retried and neither is rolled back.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::request::GeofenceRegistration;
use crate::location::{Location, LocationSource};
use crate::platform::{BoxFuture, DeliveryTarget, GeofencingClient, PlatformError};

/// What an arm attempt did.
#[derive(Debug, Clone, PartialEq)]
pub enum ArmOutcome {
    /// No location was available; no geofence call was made.
    NoFix,
    /// Remove and add were issued around `center`.
    Issued { center: Location },
}

/// Replaces the registered geofence with one around the latest location.
pub struct GeofenceArmer<S: LocationSource + ?Sized> {
    source: Arc<S>,
    client: Arc<dyn GeofencingClient>,
    target: DeliveryTarget,
}

impl<S: LocationSource + ?Sized> Clone for GeofenceArmer<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            client: Arc::clone(&self.client),
            target: self.target.clone(),
        }
    }
}

impl<S: LocationSource + ?Sized + 'static> GeofenceArmer<S> {
    pub fn new(source: Arc<S>, client: Arc<dyn GeofencingClient>, target: DeliveryTarget) -> Self {
        Self {
            source,
            client,
            target,
        }
    }

    /// Delivery target geofence transitions are sent to.
    pub fn target(&self) -> &DeliveryTarget {
        &self.target
    }

    /// Run the arm workflow once.
    ///
    /// Must be called within a Tokio runtime; completion of the platform
    /// calls is observed on spawned tasks.
    pub async fn arm(&self) -> ArmOutcome {
        let center = match self.source.fetch_once().await {
            Ok(Some(location)) => location,
            Ok(None) => {
                warn!(backend = %self.source.kind(), "No location available, geofence not armed");
                return ArmOutcome::NoFix;
            }
            Err(e) => {
                error!(backend = %self.source.kind(), error = %e, "Location fetch failed, geofence not armed");
                return ArmOutcome::NoFix;
            }
        };

        let registration = GeofenceRegistration::centered_on(&center);
        info!(endpoint = %self.target, %registration, "Re-arming geofence");

        // Both calls are issued before either completion is looked at.
        let removal = self.client.remove_geofences(&self.target);
        let addition = self.client.add_geofences(&registration, &self.target);
        tokio::spawn(log_completion("remove", removal));
        tokio::spawn(log_completion("add", addition));

        ArmOutcome::Issued { center }
    }

    /// Start the arm workflow on `handle` without waiting for it.
    pub fn trigger(&self, handle: &Handle) -> JoinHandle<ArmOutcome> {
        let armer = self.clone();
        handle.spawn(async move { armer.arm().await })
    }
}

async fn log_completion(operation: &'static str, completion: BoxFuture<'static, Result<(), PlatformError>>) {
    match completion.await {
        Ok(()) => debug!(operation, "Geofence call completed"),
        Err(e) => error!(operation, error = %e, "Geofence call failed"),
    }
}
