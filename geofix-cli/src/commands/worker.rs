//! Worker command - run the periodic location worker.

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;

use geofix::worker::WorkResult;

use super::location_json;
use crate::error::CliError;
use crate::runner::CliRunner;

pub async fn run(runner: &CliRunner, steps: usize) -> Result<(), CliError> {
    runner.log_startup("worker");

    let cancel = CancellationToken::new();
    let ticker = runner.start_platform(&cancel);
    let worker = runner.app().worker();

    let mut done = 0usize;
    let mut output = Ok(());
    let stop = cancel.clone();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        _ = worker.run(cancel.child_token(), |result| {
            done += 1;
            let location = match result {
                WorkResult::Success(location) => Some(location),
                WorkResult::Retry => None,
            };
            let printed = runner.emit(
                json!({ "step": done, "success": location.is_some(), "location": location_json(location) }),
                || match location {
                    Some(location) => format!("[{}] {}", done, location),
                    None => format!("[{}] no location, retrying after backoff", done),
                },
            );
            if printed.is_err() || done >= steps {
                output = printed;
                stop.cancel();
            }
        }) => {}
    }

    cancel.cancel();
    ticker.await?;
    output
}
