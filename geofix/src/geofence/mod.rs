//! Single circular geofence around the latest known position.

mod armer;
mod request;

pub use armer::{ArmOutcome, GeofenceArmer};
pub use request::{
    Expiration, GeofenceRegistration, InitialTrigger, TransitionMask, GEOFENCE_RADIUS_M,
    GEOFENCE_REQUEST_ID, GEOFENCE_TARGET_REQUEST_CODE,
};
