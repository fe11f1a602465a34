//! Providers Command
//!
//! List configured providers in priority order.

use std::path::PathBuf;

use console::style;

use crate::cli::util::{load_config, print_json};
use crate::registry::ProviderRegistry;
use crate::types::Result;

pub fn run(json: bool, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let registry = ProviderRegistry::from_config(&config)?;

    if json {
        let entries: Vec<serde_json::Value> = registry
            .list()
            .iter()
            .map(|d| {
                serde_json::json!({
                    "name": d.name,
                    "priority": d.priority,
                    "endpoint": d.endpoint,
                    "model": d.model,
                    "capabilities": capabilities_label(d),
                    "credentialsPresent": d.credentials_present,
                    "rateLimit": {
                        "maxRequests": d.rate_limit.max_requests,
                        "windowSecs": d.rate_limit.window.as_secs(),
                    },
                })
            })
            .collect();
        return print_json(&entries);
    }

    println!("Configured Providers");
    println!("══════════════════════════════════════");

    if registry.is_empty() {
        println!("None. All requests will be answered locally.");
        return Ok(());
    }

    for d in registry.list() {
        let creds = if d.credentials_present {
            style("✓ credentials").green()
        } else {
            style("✗ no credentials").red()
        };
        println!(
            "{} (priority {}) {}",
            style(&d.name).bold(),
            d.priority,
            creds
        );
        println!("    model:        {}", d.model);
        println!("    endpoint:     {}", d.endpoint);
        println!("    capabilities: {}", capabilities_label(d));
        println!(
            "    rate limit:   {} requests / {}s",
            d.rate_limit.max_requests,
            d.rate_limit.window.as_secs()
        );
    }

    Ok(())
}

fn capabilities_label(d: &crate::registry::ProviderDescriptor) -> String {
    if d.capabilities.is_empty() {
        "all".to_string()
    } else {
        d.capabilities
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
