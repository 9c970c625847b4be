//! geofix CLI - Command-line interface
//!
//! Drives the geofix library on the simulated platform: single fetches,
//! location streams, geofence arming, the boot path and the periodic worker.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use error::CliError;

#[derive(Parser)]
#[command(name = "geofix")]
#[command(version = geofix::VERSION)]
#[command(about = "One current location over two location backends, with geofence re-arming", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.geofix/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the selected backend and effective settings
    Status,

    /// Acquire a single location
    Fetch,

    /// Stream locations until the count is reached or Ctrl+C
    Watch {
        /// Stop after this many locations
        #[arg(long, short = 'n')]
        count: Option<usize>,

        /// Skip the cached last known location
        #[arg(long)]
        no_cached: bool,

        /// Never close the stream for lack of a first value
        #[arg(long)]
        no_timeout: bool,
    },

    /// Arm the geofence around the current location
    ArmGeofence,

    /// Deliver a system action to the boot path
    Boot {
        /// Action name, e.g. boot-completed or locked-boot-completed
        #[arg(default_value = "boot-completed")]
        action: String,
    },

    /// Run the periodic location worker
    Worker {
        /// Stop after this many steps
        #[arg(long, default_value = "1")]
        steps: usize,
    },

    /// Write a configuration file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    // Writing the config file needs neither logging nor a runtime.
    if let Commands::InitConfig { force } = cli.command {
        return commands::init::run(cli.config.as_deref(), force, cli.json);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let runner = runner::CliRunner::new(cli.config.as_deref(), cli.json)?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Status => commands::status::run(&runner),
            Commands::Fetch => commands::fetch::run(&runner).await,
            Commands::Watch {
                count,
                no_cached,
                no_timeout,
            } => {
                let args = commands::watch::WatchArgs {
                    count,
                    no_cached,
                    no_timeout,
                };
                commands::watch::run(&runner, args).await
            }
            Commands::ArmGeofence => commands::geofence::run(&runner).await,
            Commands::Boot { action } => commands::boot::run(&runner, &action).await,
            Commands::Worker { steps } => commands::worker::run(&runner, steps).await,
            Commands::InitConfig { .. } => Ok(()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_watch() {
        let cli = Cli::try_parse_from(["geofix", "--json", "watch", "-n", "3", "--no-cached"])
            .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Watch {
                count,
                no_cached,
                no_timeout,
            } => {
                assert_eq!(count, Some(3));
                assert!(no_cached);
                assert!(!no_timeout);
            }
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn test_boot_default_action() {
        let cli = Cli::try_parse_from(["geofix", "boot"]).unwrap();
        match cli.command {
            Commands::Boot { action } => assert_eq!(action, "boot-completed"),
            _ => panic!("expected boot"),
        }
    }
}
