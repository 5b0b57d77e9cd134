use anyhow::Result;
use clap::Parser;
use credit_api::{start_server, AppState};
use credit_metrics::{MetricsService, TracingService};
use credit_models::Config;
use credit_pipeline::RiskEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "credit-risk-server")]
#[command(about = "Serve credit risk predictions over HTTP")]
struct Args {
    /// TOML config file; missing files fall back to defaults
    #[arg(long, default_value = "config/config.toml")]
    config: PathBuf,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.config)?;

    if args.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    TracingService::init(config.logging.format)?;
    info!(config = %args.config.display(), "Starting credit risk server");

    let metrics = Arc::new(MetricsService::new()?);
    let engine = Arc::new(RiskEngine::load_or_empty(&config.model.path, config.scoring));

    let state = AppState::new(config, engine, metrics);
    start_server(state).await
}
