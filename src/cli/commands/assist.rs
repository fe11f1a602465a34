//! Assist Command
//!
//! Route a single request through the provider chain and print the answer.

use std::path::PathBuf;

use console::style;

use crate::cli::util::{load_dispatcher, print_json};
use crate::types::{AssistResponse, RequestType, Result, RoutingRequest};

pub struct AssistOptions {
    pub prompt: String,
    pub request_type: RequestType,
    pub context: Option<String>,
    pub language: Option<String>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub local: bool,
    pub json: bool,
    pub config: Option<PathBuf>,
}

pub async fn run(opts: AssistOptions) -> Result<()> {
    let dispatcher = load_dispatcher(opts.config.as_deref())?;

    let mut request = RoutingRequest::new(opts.request_type, opts.prompt);
    if let Some(context) = opts.context {
        request = request.with_context(context);
    }
    if let Some(language) = opts.language {
        request = request.with_language(language);
    }
    if let Some(model) = opts.model {
        request = request.with_model(model);
    }
    if let Some(provider) = opts.provider {
        request = request.with_force_provider(provider);
    }
    if opts.local {
        request = request.with_force_local();
    }

    let response = dispatcher.route(&request).await?;

    if opts.json {
        return print_json(&AssistResponse::from(&response));
    }

    println!(
        "{} {} ({}){}",
        style("Answered by").dim(),
        style(&response.provider_used).cyan().bold(),
        response.model_used,
        if response.fallback_used {
            format!(" {}", style("[fallback]").yellow())
        } else {
            String::new()
        }
    );

    for attempt in &response.attempted_providers {
        println!(
            "  {} {} {}",
            style("skipped").dim(),
            attempt.provider,
            style(attempt.error.label()).dim()
        );
    }

    println!();
    println!("{}", response.text);
    println!();
    println!(
        "{}",
        style(format!(
            "~{} tokens, confidence {:.2}",
            response.token_estimate, response.confidence
        ))
        .dim()
    );

    Ok(())
}
