//! Boot command - deliver a system action to the boot path.

use std::time::Duration;

use serde_json::json;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use geofix::boot::BootAction;

use super::geofence::print_outcome;
use crate::error::CliError;
use crate::runner::CliRunner;

/// How long to keep the platform running after arming so a few background
/// deliveries reach the boot receiver.
const DELIVERY_WINDOW: Duration = Duration::from_secs(3);

pub async fn run(runner: &CliRunner, action: &str) -> Result<(), CliError> {
    runner.log_startup("boot");

    let action: BootAction = match action.parse() {
        Ok(action) => action,
        Err(never) => match never {},
    };

    let cancel = CancellationToken::new();
    let ticker = runner.start_platform(&cancel);

    let task = runner.app().boot().on_boot(&action, &Handle::current());
    let result = match task {
        Some(task) => {
            let outcome = task.await;
            if outcome.is_ok() {
                tokio::time::sleep(DELIVERY_WINDOW).await;
            }
            Some(outcome)
        }
        None => None,
    };

    cancel.cancel();
    ticker.await?;

    let Some(outcome) = result else {
        return runner.emit(json!({ "action": action.to_string(), "handled": false }), || {
            format!("Ignored action '{}'", action)
        });
    };
    let outcome = outcome?;

    let receiver = runner.app().boot_receiver();
    runner.emit(
        json!({
            "action": action.to_string(),
            "handled": true,
            "background_targets": runner
                .platform()
                .background_targets()
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>(),
            "deliveries": receiver.deliveries(),
            "latest_delivery": super::location_json(receiver.latest().as_ref()),
        }),
        || {
            format!(
                "Handled '{}': background delivery armed, {} deliveries received",
                action,
                receiver.deliveries()
            )
        },
    )?;

    print_outcome(runner, &outcome)
}
