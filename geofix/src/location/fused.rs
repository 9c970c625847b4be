//! Location source over the fused location provider.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, error, info, warn};

use super::error::LocationError;
use super::model::Location;
use super::profile::LocationRequestProfile;
use super::source::{BackendKind, LocationSource, FALLBACK_READ_SLACK};
use super::subscription::{
    subscribe, ListenerRegistration, LocationStream, StreamOptions, SubscriptionBackend,
};
use crate::platform::{BoxFuture, DeliveryTarget, FusedLocationClient, ListenerEvent, ListenerId};

struct FusedBackend {
    client: Arc<dyn FusedLocationClient>,
    profile: LocationRequestProfile,
}

impl FusedBackend {
    async fn read_last_location(&self) -> Option<Location> {
        match self.client.last_location().await {
            Ok(location) => {
                debug!(location = ?location, "Fused last location read");
                location
            }
            Err(e) => {
                error!(error = %e, "Fused last location read failed");
                None
            }
        }
    }
}

impl SubscriptionBackend for FusedBackend {
    fn name(&self) -> &'static str {
        "fused"
    }

    fn last_known(&self) -> BoxFuture<'_, Option<Location>> {
        Box::pin(self.read_last_location())
    }

    fn register(&self, registration: &ListenerRegistration) -> Result<(), LocationError> {
        registration.register(|listener| {
            self.client
                .request_location_updates(&self.profile, listener)
        })?;
        Ok(())
    }

    fn on_signal(
        &self,
        signal: &ListenerEvent,
        _registration: &ListenerRegistration,
    ) -> Result<(), LocationError> {
        match signal {
            ListenerEvent::Availability(available) => {
                debug!(available, "Fused location availability changed");
            }
            other => debug!(event = ?other, "Ignoring listener event"),
        }
        Ok(())
    }

    fn remove(&self, listener: ListenerId) {
        self.client.remove_location_updates(listener);
    }
}

/// [`LocationSource`] backed by the fused location provider.
///
/// Live updates use the request profile chosen at startup. Single fetches
/// treat every failure as "no value" and fall back to the cached location.
#[derive(Clone)]
pub struct FusedLocationSource {
    backend: Arc<FusedBackend>,
    timeout: Duration,
}

impl FusedLocationSource {
    /// Create a fused source.
    pub fn new(
        client: Arc<dyn FusedLocationClient>,
        profile: LocationRequestProfile,
        timeout: Duration,
    ) -> Self {
        Self {
            backend: Arc::new(FusedBackend { client, profile }),
            timeout,
        }
    }

    /// Request profile used for live and background updates.
    pub fn profile(&self) -> &LocationRequestProfile {
        &self.backend.profile
    }

    async fn fetch_once_inner(&self) -> Option<Location> {
        let mut stream = self.stream_with(StreamOptions::live_only());
        let live = match stream.next().await {
            Some(Ok(location)) => Some(location),
            Some(Err(e)) => {
                error!(error = %e, "Single location fetch failed");
                None
            }
            None => None,
        };
        drop(stream);

        if live.is_some() {
            return live;
        }
        match tokio::time::timeout(FALLBACK_READ_SLACK, self.backend.read_last_location()).await {
            Ok(cached) => cached,
            Err(_) => {
                warn!("Fused last location read timed out");
                None
            }
        }
    }
}

impl LocationSource for FusedLocationSource {
    fn kind(&self) -> BackendKind {
        BackendKind::Fused
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn stream_with(&self, options: StreamOptions) -> LocationStream {
        subscribe(Arc::clone(&self.backend), options, self.timeout)
    }

    fn fetch_once(&self) -> BoxFuture<'_, Result<Option<Location>, LocationError>> {
        Box::pin(async move { Ok(self.fetch_once_inner().await) })
    }

    fn arm_background_delivery(&self, target: &DeliveryTarget) {
        info!(endpoint = %target, "Arming fused background delivery");
        if let Err(e) = self
            .backend
            .client
            .request_background_updates(&self.backend.profile, target)
        {
            error!(endpoint = %target, error = %e, "Fused background delivery registration failed");
        }
    }
}
