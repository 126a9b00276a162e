use crate::algorithms::trainer::TrainingParams;
use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::models::*;
use anyhow::{anyhow, Result};

/// A vote can only contribute if its winner set has the shape of a top-4
/// set. Nulls inside the set are fine and are skipped by the extractor.
pub fn validate_vote(vote: &Vote) -> Result<()> {
    if vote.winner_movie_ids.len() > TOP4_SET_SIZE {
        return Err(anyhow!(
            "Vote {} has {} winner movies (max {})",
            vote.id,
            vote.winner_movie_ids.len(),
            TOP4_SET_SIZE
        ));
    }

    Ok(())
}

pub fn validate_training_params(params: &TrainingParams) -> EngineResult<()> {
    if params.embedding_dim == 0 {
        return Err(EngineError::InvalidParameters("embedding dimension cannot be zero".into()));
    }

    if params.epochs == 0 {
        return Err(EngineError::InvalidParameters("epochs cannot be zero".into()));
    }

    if params.batch_size == 0 {
        return Err(EngineError::InvalidParameters("batch size cannot be zero".into()));
    }

    if !params.learning_rate.is_finite() || params.learning_rate <= 0.0 {
        return Err(EngineError::InvalidParameters(format!(
            "learning rate must be positive, got {}",
            params.learning_rate
        )));
    }

    Ok(())
}

pub fn validate_config(config: &Config) -> Result<()> {
    if config.database.url.is_empty() {
        return Err(anyhow!("Database URL cannot be empty"));
    }

    if config.database.max_connections == 0 {
        return Err(anyhow!("Database pool needs at least one connection"));
    }

    for epochs in [config.training.epochs, config.training.retrain_epochs] {
        validate_training_params(&TrainingParams::from_config(&config.training, epochs))?;
    }

    if config.training.window_days <= 0 {
        return Err(anyhow!("Training window must be at least one day"));
    }

    if config.recommendation.top_k == 0 {
        return Err(anyhow!("top_k must be greater than 0"));
    }

    if config.scheduler.retrain_threshold <= 0 {
        return Err(anyhow!("Retrain threshold must be greater than 0"));
    }

    if config.scheduler.initial_watermark < 0 {
        return Err(anyhow!("Initial watermark cannot be negative"));
    }

    Ok(())
}
