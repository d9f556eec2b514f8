//! lmstart CLI
//!
//! Starts the LM Studio local API server by clicking through the app's GUI,
//! then confirms the server answers.
//!
//! Usage:
//!   lmstart            # Start the server (does nothing if it already answers)
//!   lmstart status     # Only check whether the API server answers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use lmstart::health::DEFAULT_API_URL;
use lmstart::sequence::DEFAULT_APP_NAME;
use lmstart::{ApiProbe, Desktop, Reporter, ServerHealthCheck, ServerStarter};
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lmstart", version)]
#[command(about = "🚀 Start the LM Studio local API server")]
#[command(
    long_about = "Activates LM Studio, opens its \"Local Server\" tab, clicks \"Start Server\" and checks that the server is running. Needs the Accessibility permission for the terminal running it."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Application to drive
    #[arg(long, global = true, env = "LMSTART_APP", default_value = DEFAULT_APP_NAME)]
    app: String,

    /// Base URL of the local API server
    #[arg(long, global = true, env = "LMSTART_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Start the server through the GUI (default)
    Start,
    /// Check whether the API server answers, without touching the GUI
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before parsing so its values act as env fallbacks
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {e:#}", "❌ Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_filter = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Returns whether the server is running at the end.
async fn run(cli: Cli) -> Result<bool> {
    let probe = ApiProbe::new(&cli.api_url)
        .with_context(|| format!("Invalid API URL '{}'", cli.api_url))?;
    let color = !cli.no_color && std::io::stdout().is_terminal();
    let mut reporter = Reporter::new(std::io::stdout(), &cli.app).with_color(color);

    match cli.command.unwrap_or(Commands::Start) {
        Commands::Status => {
            info!("🔍 Checking {}", probe.models_url());
            let result = probe.check_health().await;
            reporter.health(&result);
            Ok(result.is_healthy())
        }
        Commands::Start => {
            let desktop = Desktop::new().context("GUI automation is not available")?;
            let starter = ServerStarter::new(desktop, Arc::new(probe), cli.app.clone());
            info!(api_url = %cli.api_url, "Starting the local server of {}", starter.app_name());
            let outcome = starter.run(&mut reporter).await;
            Ok(outcome.is_running())
        }
    }
}
