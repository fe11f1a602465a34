//! CLI Common Utilities
//!
//! Shared config/dispatcher loading and output helpers for command handlers.

use std::path::Path;

use serde::Serialize;

use crate::config::{Config, ConfigLoader};
use crate::dispatch::Dispatcher;
use crate::types::Result;

/// Load configuration, from an explicit file when given, otherwise through
/// the full resolution chain (defaults, global, project, env).
pub fn load_config(file: Option<&Path>) -> Result<Config> {
    match file {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Build a dispatcher from the resolved configuration
pub fn load_dispatcher(file: Option<&Path>) -> Result<Dispatcher> {
    let config = load_config(file)?;
    Dispatcher::from_config(&config)
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
