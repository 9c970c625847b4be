//! Fetch command - acquire a single location.

use tokio_util::sync::CancellationToken;

use geofix::location::LocationSource;

use super::location_json;
use crate::error::CliError;
use crate::runner::CliRunner;

pub async fn run(runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("fetch");

    let cancel = CancellationToken::new();
    let ticker = runner.start_platform(&cancel);

    let result = runner.app().source().fetch_once().await;

    cancel.cancel();
    ticker.await?;

    let location = result?.ok_or(CliError::NoLocation)?;
    runner.emit(location_json(Some(&location)), || location.to_string())
}
