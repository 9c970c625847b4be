//! Init-config command - write a configuration file with default values.

use std::path::Path;

use serde_json::json;

use geofix::config::{config_file_path, GeofixConfig};

use crate::error::CliError;

pub fn run(path: Option<&Path>, force: bool, json: bool) -> Result<(), CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);

    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    GeofixConfig::default().save_to(&path)?;

    if json {
        println!("{}", serde_json::to_string(&json!({ "written": path }))?);
    } else {
        println!("Wrote default configuration to {}", path.display());
    }
    Ok(())
}
