use anyhow::Result;
use clap::Parser;
use moviemash_engine::services::training::PipelineOutcome;
use moviemash_engine::{init_tracing, AppState, Config};
use tracing::{info, warn};

/// Trains the model once from the current vote window, stores fresh
/// recommendations and exits.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Overrides `training.epochs`.
    #[arg(short, long)]
    epochs: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    info!("Starting MovieMash one-shot training");

    let config = Config::from_file(&args.config)?;
    let epochs = args.epochs.unwrap_or(config.training.epochs);
    info!("Training configuration loaded: {:?}", config.training);

    let state = AppState::new(config).await?;

    match state.training_service.run_pipeline(epochs).await? {
        PipelineOutcome::Trained(report) => info!("Training finished: {:?}", report),
        PipelineOutcome::Skipped => warn!("Nothing to train on; no model produced"),
    }

    Ok(())
}
