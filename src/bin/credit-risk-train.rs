use anyhow::Result;
use clap::Parser;
use credit_metrics::TracingService;
use credit_models::Config;
use credit_pipeline::{run, DatasetSource, TrainingOptions};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "credit-risk-train")]
#[command(about = "Train the credit risk model on the German Credit dataset")]
struct Args {
    #[arg(long, default_value = "config/config.toml")]
    config: PathBuf,

    /// Local ARFF file to train on
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Download the dataset, caching it at the dataset path
    #[arg(long)]
    fetch: bool,

    /// Where to write the model artifact
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    trees: Option<usize>,

    /// 0 grows trees until leaves are pure
    #[arg(long)]
    max_depth: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    /// Command line flags take precedence over the config file.
    fn apply(&self, config: &mut Config) {
        if let Some(dataset) = &self.dataset {
            config.training.dataset_path = dataset.display().to_string();
        }
        if let Some(output) = &self.output {
            config.model.path = output.display().to_string();
        }
        if let Some(trees) = self.trees {
            config.training.n_estimators = trees;
        }
        if let Some(depth) = self.max_depth {
            config.training.max_depth = depth;
        }
        if let Some(seed) = self.seed {
            config.training.seed = seed;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load(&args.config)?;
    args.apply(&mut config);
    config.validate()?;

    TracingService::init(config.logging.format)?;

    let mut options = TrainingOptions::from_config(&config);
    if args.fetch {
        options.source = DatasetSource::Remote {
            url: config.training.dataset_url.clone(),
            cache: Some(PathBuf::from(&config.training.dataset_path)),
        };
    }
    info!(source = ?options.source, output = %options.output.display(), "Starting training");

    let artifact = run(options).await?;
    println!(
        "Model trained: accuracy {:.2} on {} held-out rows",
        artifact.report.accuracy, artifact.report.test_rows
    );
    Ok(())
}
