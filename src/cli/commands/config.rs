//! Config Command
//!
//! Inspect the merged configuration and its source paths.

use std::path::PathBuf;

use crate::cli::util::{load_config, print_json};
use crate::config::ConfigLoader;
use crate::types::{GateError, Result};

pub fn show(json: bool, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;

    if json {
        return print_json(&config);
    }

    println!(
        "{}",
        toml::to_string_pretty(&config).map_err(|e| GateError::Config(e.to_string()))?
    );
    Ok(())
}

pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}
