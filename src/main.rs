use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promptgate::types::RequestType;

/// Parse request type from string
fn parse_request_type(s: &str) -> Result<RequestType, String> {
    s.parse::<RequestType>().map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "promptgate")]
#[command(
    version,
    about = "Multi-provider AI request dispatcher with guaranteed local fallback"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, help = "Explicit config file (skips the resolution chain)")]
    config: Option<PathBuf>,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Route a request through the provider chain
    Assist {
        #[arg(help = "Prompt or source code to operate on")]
        prompt: String,
        #[arg(
            short = 't',
            long = "type",
            default_value = "chat",
            value_parser = parse_request_type,
            help = "Request type: chat, analyze, generate, debug, explain, optimize, document"
        )]
        request_type: RequestType,
        #[arg(long, help = "Extra context passed to the provider")]
        context: Option<String>,
        #[arg(long, short = 'l', help = "Programming language hint")]
        language: Option<String>,
        #[arg(long, short = 'm', help = "Preferred model override")]
        model: Option<String>,
        #[arg(long, short = 'p', help = "Force a specific provider")]
        provider: Option<String>,
        #[arg(long, help = "Skip remote providers, answer locally")]
        local: bool,
        #[arg(long, help = "Emit the boundary JSON body instead of text")]
        json: bool,
    },

    /// Show per-provider runtime counters (per-process; a fresh invocation
    /// starts every counter at zero)
    Status {
        #[arg(long, help = "Emit JSON")]
        json: bool,
    },

    /// Probe provider liveness
    Health {
        #[arg(long, help = "Emit JSON")]
        json: bool,
    },

    /// List configured providers
    Providers {
        #[arg(long, help = "Emit JSON")]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(long, help = "Emit JSON instead of TOML")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mpromptgate encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Default hook prints the backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> promptgate::types::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Assist {
            prompt,
            request_type,
            context,
            language,
            model,
            provider,
            local,
            json,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(promptgate::cli::commands::assist::run(
                promptgate::cli::commands::assist::AssistOptions {
                    prompt,
                    request_type,
                    context,
                    language,
                    model,
                    provider,
                    local,
                    json,
                    config: cli.config,
                },
            ))?;
        }
        Commands::Status { json } => {
            promptgate::cli::commands::status::run(json, cli.config)?;
        }
        Commands::Health { json } => {
            let rt = Runtime::new()?;
            rt.block_on(promptgate::cli::commands::health::run(json, cli.config))?;
        }
        Commands::Providers { json } => {
            promptgate::cli::commands::providers::run(json, cli.config)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                promptgate::cli::commands::config::show(json, cli.config)?;
            }
            ConfigAction::Path => {
                promptgate::cli::commands::config::path()?;
            }
        },
    }

    Ok(())
}
