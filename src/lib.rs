pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod algorithms;
pub mod utils;

pub use config::Config;
pub use error::{EngineError, EngineResult};
pub use models::*;

use anyhow::Result;
use std::sync::Arc;

use services::recommendation::Recommender;
use services::storage::{PgVoteStore, VoteStore};
use services::training::TrainingService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn VoteStore>,
    pub recommender: Arc<Recommender>,
    pub training_service: Arc<TrainingService>,
}

impl AppState {
    /// Connects to PostgreSQL and wires the engine services on top of it.
    pub async fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn VoteStore> = Arc::new(PgVoteStore::connect(&config.database).await?);
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn VoteStore>) -> Self {
        let config = Arc::new(config);
        let recommender = Arc::new(Recommender::new());

        let training_service = Arc::new(TrainingService::new(
            store.clone(),
            recommender.clone(),
            config.clone(),
        ));

        Self {
            config,
            store,
            recommender,
            training_service,
        }
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
