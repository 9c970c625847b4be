//! Geofence command - arm the geofence around the current location.

use serde_json::json;
use tokio_util::sync::CancellationToken;

use geofix::geofence::ArmOutcome;

use super::location_json;
use crate::error::CliError;
use crate::runner::CliRunner;

pub async fn run(runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("arm-geofence");

    let cancel = CancellationToken::new();
    let ticker = runner.start_platform(&cancel);

    let outcome = runner.app().armer().arm().await;

    cancel.cancel();
    ticker.await?;

    print_outcome(runner, &outcome)
}

/// Print an arm outcome together with the geofences now registered.
pub(crate) fn print_outcome(runner: &CliRunner, outcome: &ArmOutcome) -> Result<(), CliError> {
    let fences = runner.platform().geofences();
    let center = match outcome {
        ArmOutcome::Issued { center } => Some(center),
        ArmOutcome::NoFix => None,
    };

    let value = json!({
        "armed": center.is_some(),
        "center": location_json(center),
        "geofences": fences.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
    });

    runner.emit(value, || match center {
        Some(center) => {
            let mut out = format!("Geofence requested around {}", center);
            for fence in &fences {
                out.push_str(&format!("\n  {}", fence));
            }
            out
        }
        None => "No location available; geofence left unchanged".to_string(),
    })
}
