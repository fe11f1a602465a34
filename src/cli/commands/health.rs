//! Health Command
//!
//! Probe every configured provider and report liveness.

use std::path::PathBuf;

use console::style;

use crate::cli::util::{load_dispatcher, print_json};
use crate::types::Result;

pub async fn run(json: bool, config: Option<PathBuf>) -> Result<()> {
    let dispatcher = load_dispatcher(config.as_deref())?;
    let report = dispatcher.health().await;

    if json {
        return print_json(&report);
    }

    println!("Provider Health");
    println!("══════════════════════════════════════");

    for (name, alive) in &report.providers {
        let marker = if *alive {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("{} {}", marker, name);
    }

    println!();
    println!(
        "Overall: {}  Primary: {}",
        if report.healthy {
            style("healthy").green().to_string()
        } else {
            style("degraded (local only)").yellow().to_string()
        },
        style(&report.primary_provider).bold()
    );

    Ok(())
}
