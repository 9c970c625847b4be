//! Status command - show the selected backend and effective settings.

use serde_json::json;

use geofix::location::LocationSource;

use crate::error::CliError;
use crate::runner::CliRunner;

pub fn run(runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("status");

    let app = runner.app();
    let config = app.config();
    let selection = app.selection();
    let profile = selection.profile;
    let providers: Vec<&str> = config
        .simulation
        .providers
        .iter()
        .map(|p| p.name.as_str())
        .collect();

    let value = json!({
        "version": geofix::VERSION,
        "backend": selection.backend.as_str(),
        "device_class": config.device_class.as_str(),
        "timeout_secs": app.source().timeout().as_secs(),
        "profile": {
            "priority": format!("{:?}", profile.priority),
            "interval_ms": profile.interval.as_millis() as u64,
            "fastest_interval_ms": profile.fastest_interval.as_millis() as u64,
            "min_displacement_m": profile.min_displacement_m,
        },
        "boot_delivery": config.boot_delivery_target.to_string(),
        "geofence_delivery": config.geofence_target.to_string(),
        "worker": {
            "interval_secs": config.worker_interval.as_secs(),
            "backoff": config.worker_backoff.to_string(),
        },
        "providers": providers,
        "log_file": config.log_directory.join(&config.log_file),
    });

    runner.emit(value, || {
        let mut out = String::new();
        out.push_str(&format!("geofix v{}\n\n", geofix::VERSION));
        out.push_str(&format!("Backend:          {}\n", selection.backend));
        out.push_str(&format!("Device class:     {}\n", config.device_class));
        out.push_str(&format!(
            "Timeout:          {}s\n",
            app.source().timeout().as_secs()
        ));
        out.push_str(&format!(
            "Request profile:  {:?}, every {}ms (fastest {}ms), {}m\n",
            profile.priority,
            profile.interval.as_millis(),
            profile.fastest_interval.as_millis(),
            profile.min_displacement_m
        ));
        out.push_str(&format!("Boot delivery:    {}\n", config.boot_delivery_target));
        out.push_str(&format!("Geofence events:  {}\n", config.geofence_target));
        out.push_str(&format!(
            "Worker:           every {}s, {} backoff\n",
            config.worker_interval.as_secs(),
            config.worker_backoff
        ));
        out.push_str(&format!("Providers:        {}\n", providers.join(", ")));
        out.push_str(&format!(
            "Log file:         {}",
            config.log_directory.join(&config.log_file).display()
        ));
        out
    })
}
