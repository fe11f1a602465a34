//! Status Command
//!
//! Display per-provider runtime counters and aggregate availability.
//! Counters live in the dispatcher instance, so a CLI invocation reports
//! its own process only; nothing is persisted between runs.

use std::path::PathBuf;

use console::style;

use crate::cli::util::{load_dispatcher, print_json};
use crate::types::Result;

pub fn run(json: bool, config: Option<PathBuf>) -> Result<()> {
    let dispatcher = load_dispatcher(config.as_deref())?;
    let report = dispatcher.status();

    if json {
        return print_json(&report);
    }

    println!("Provider Status");
    println!("══════════════════════════════════════");

    if report.providers.is_empty() {
        println!("No providers configured.");
    }

    for provider in &report.providers {
        let marker = if provider.available {
            style("●").green()
        } else {
            style("●").red()
        };
        println!(
            "{} {} (priority {}) requests: {} rate: {}",
            marker,
            style(&provider.name).bold(),
            provider.priority,
            provider.request_count,
            provider.rate_limit_status
        );
    }

    println!();
    println!(
        "Active: {}/{}  Emergency fallback: {}",
        report.active_providers,
        report.total_providers,
        if report.emergency_fallback {
            "armed"
        } else {
            "off"
        }
    );

    Ok(())
}
