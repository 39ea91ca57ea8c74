use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use areweup::HealthCheckDispatcher;
use clap::Parser;
use tracing::{info, warn};

mod config;
mod error;

use config::Settings;
use error::AgentError;

#[derive(Parser)]
#[command(name = "areweup-agent")]
#[command(about = "Probe every endpoint in a health check document and report the results")]
#[command(version)]
struct Cli {
    /// Agent settings file, defaults to $XDG_CONFIG_HOME/areweup/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Health check document, overrides source.checks_path
    #[arg(long)]
    checks: Option<PathBuf>,

    /// Print the effective settings and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    logger::init_tracing();

    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("Ignoring unreadable .env file: {e}");
        }
    }

    let cli = Cli::parse();

    let mut settings = Settings::from_config(cli.config.as_deref())?;
    settings.apply_env(|key| std::env::var(key).ok());
    if let Some(checks) = cli.checks {
        settings.source.checks_path = checks;
    }

    if cli.print_config {
        println!("{settings}");
        return Ok(());
    }

    settings.validate()?;

    let checks_path = &settings.source.checks_path;
    let raw = fs::read(checks_path)
        .map_err(|source| AgentError::ReadFailed { path: checks_path.clone(), source })?;
    let configuration = areweup::resolve(&raw, &settings.defaults)
        .with_context(|| format!("Invalid health check document {}", checks_path.display()))?;

    let summary = HealthCheckDispatcher::logging().execute(&configuration).await;
    info!("Finished {} checks: {} up, {} down", summary.total, summary.up, summary.down);

    Ok(())
}
