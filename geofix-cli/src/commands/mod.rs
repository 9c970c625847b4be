//! CLI command implementations.
//!
//! Each command is in its own module with a `run` function that takes the
//! shared runner and returns a Result.

pub mod boot;
pub mod fetch;
pub mod geofence;
pub mod init;
pub mod status;
pub mod watch;
pub mod worker;

use serde_json::{json, Value};

use geofix::location::Location;

/// JSON form of an optional location.
pub(crate) fn location_json(location: Option<&Location>) -> Value {
    match location {
        Some(location) => json!(location),
        None => Value::Null,
    }
}
