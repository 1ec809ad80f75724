//! lease-ddns - Dynamic DNS updater driven by address lifetimes.

use clap::Parser;
use lease_ddns::config::Config;
use lease_ddns::job::RunMode;
use lease_ddns::scheduler::Scheduler;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lease-ddns")]
#[command(about = "Dynamic DNS updater driven by interface address lifetimes")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run as daemon (loop forever)
    #[arg(short, long)]
    daemon: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = Config::resolve_path(cli.config);
    let config = Config::load_from(&config_path)?;
    config.validate()?;

    if cli.check {
        println!(
            "{}: {} job(s) configured, configuration OK",
            config_path.display(),
            config.jobs.len()
        );
        return Ok(());
    }

    let mode = if cli.daemon {
        RunMode::Daemon
    } else {
        RunMode::Once
    };

    tracing::info!(
        "Loaded {} job(s) from {} ({:?} mode)",
        config.jobs.len(),
        config_path.display(),
        mode
    );

    Scheduler::from_config(&config).run(mode).await?;
    Ok(())
}
