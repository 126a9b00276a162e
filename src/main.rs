use anyhow::Result;
use clap::Parser;
use moviemash_engine::services::scheduler::{RetrainScheduler, ScheduledRetrain};
use moviemash_engine::services::storage::PgVoteStore;
use moviemash_engine::{init_tracing, AppState, Config};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

/// Watches the votes table and retrains the model once enough new votes
/// have accumulated.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = Config::from_file(&args.config)?;
    info!("Scheduler configuration loaded: {:?}", config.scheduler);

    // Lazy pool: the database may come up after this process does
    let store = Arc::new(PgVoteStore::connect_lazy(&config.database)?);
    let state = AppState::with_store(config, store);

    let retrainer = Arc::new(ScheduledRetrain::new(
        state.training_service.clone(),
        state.config.training.retrain_epochs,
    ));
    let mut scheduler = RetrainScheduler::new(
        state.store.clone(),
        retrainer,
        state.config.scheduler.clone(),
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
        let _ = stop_tx.send(true);
    });

    info!("ML service started, polling database for votes...");
    scheduler.run(stop_rx).await;

    Ok(())
}
