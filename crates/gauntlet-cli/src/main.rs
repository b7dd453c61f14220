//! Gauntlet CLI
//!
//! Runs the date-format demo case through the functional, performance and
//! thread-safety phases and prints the report.

use anyhow::{bail, Context};
use clap::Parser;
use gauntlet_harness::PhaseOrchestrator;
use gauntlet_probe::AssertionProbe;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod date_case;

use config::AppConfig;
use date_case::DateFormatCase;

/// Gauntlet CLI
#[derive(Parser)]
#[command(name = "gauntlet")]
#[command(about = "Gauntlet - three-phase component test harness", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "GAUNTLET_CONFIG")]
    config: Option<String>,

    /// Log level
    #[arg(long, env = "GAUNTLET_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "GAUNTLET_LOG_JSON")]
    json: bool,

    /// Seed for user and iteration counts
    #[arg(long, env = "GAUNTLET_SEED")]
    seed: Option<u64>,

    /// Run exactly `number.items` verification calls per performance run
    #[arg(long)]
    fixed_iterations: bool,

    /// Simulate exactly this many users
    #[arg(short, long)]
    users: Option<u64>,

    /// Give up on a simulated user after this many milliseconds
    #[arg(long)]
    user_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config =
        AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    // Override with CLI args
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;
    if cli.seed.is_some() {
        config.harness.seed = cli.seed;
    }
    config.harness.fixed_iterations |= cli.fixed_iterations;
    if let Some(users) = cli.users {
        config.harness.min_users = users;
        config.harness.max_users = users;
    }
    if cli.user_timeout_ms.is_some() {
        config.harness.user_timeout_ms = cli.user_timeout_ms;
    }

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::debug!(?config, "configuration loaded");

    let probe = AssertionProbe::new(config.probe.clone())
        .context("failed to start the probe dispatcher")?;
    let case = DateFormatCase::new(probe.clone());
    let orchestrator = PhaseOrchestrator::new(case, probe, config.harness)?;

    let report = orchestrator.run().await;

    print!("{}", report.to_text());

    if !report.is_success() {
        bail!("{} of {} phases failed", report.failed_count(), report.phases.len());
    }

    Ok(())
}
