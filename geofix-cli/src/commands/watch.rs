//! Watch command - stream locations until done or interrupted.

use futures::StreamExt;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;

use geofix::location::{LocationSource, StreamOptions};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Options for the watch command.
pub struct WatchArgs {
    pub count: Option<usize>,
    pub no_cached: bool,
    pub no_timeout: bool,
}

impl WatchArgs {
    fn stream_options(&self) -> StreamOptions {
        StreamOptions {
            ignore_last_known: self.no_cached,
            with_timeout: !self.no_timeout,
        }
    }
}

pub async fn run(runner: &CliRunner, args: WatchArgs) -> Result<(), CliError> {
    runner.log_startup("watch");

    let cancel = CancellationToken::new();
    let ticker = runner.start_platform(&cancel);

    let mut stream = runner.app().source().stream_with(args.stream_options());
    let mut received = 0usize;
    let mut failure = None;

    loop {
        if args.count.is_some_and(|count| received >= count) {
            break;
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            item = stream.next() => match item {
                Some(Ok(location)) => {
                    received += 1;
                    runner.emit(json!({ "index": received, "location": location }), || {
                        format!("[{}] {}", received, location)
                    })?;
                }
                Some(Err(e)) => {
                    failure = Some(e);
                    break;
                }
                None => break,
            }
        }
    }

    // Dropping the stream releases its platform listener.
    drop(stream);
    cancel.cancel();
    ticker.await?;

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
