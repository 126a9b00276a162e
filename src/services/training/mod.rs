use crate::algorithms::{Trainer, TrainingParams};
use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::models::*;
use crate::services::extraction::build_training_set;
use crate::services::recommendation::Recommender;
use crate::services::storage::VoteStore;
use crate::utils::window_start;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub generation: u64,
    pub num_votes: usize,
    pub num_users: usize,
    pub num_movies: usize,
    pub num_interactions: usize,
    pub final_loss: Option<f64>,
    pub users_persisted: usize,
    pub persist_failures: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Trained(PipelineReport),
    /// The window held no usable interactions; the previous model stays.
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub users_persisted: usize,
    pub failures: usize,
}

/// Runs the load → extract → map → train → install → persist pipeline.
pub struct TrainingService {
    store: Arc<dyn VoteStore>,
    recommender: Arc<Recommender>,
    config: Arc<Config>,
}

impl TrainingService {
    pub fn new(store: Arc<dyn VoteStore>, recommender: Arc<Recommender>, config: Arc<Config>) -> Self {
        Self {
            store,
            recommender,
            config,
        }
    }

    pub fn recommender(&self) -> &Arc<Recommender> {
        &self.recommender
    }

    /// One-shot training with the configured epoch count.
    pub async fn train_now(&self) -> EngineResult<PipelineOutcome> {
        self.run_pipeline(self.config.training.epochs).await
    }

    pub async fn run_pipeline(&self, epochs: usize) -> EngineResult<PipelineOutcome> {
        self.run_pipeline_at(epochs, Utc::now()).await
    }

    /// Runs the pipeline over the window that ends at `now`. `now` also
    /// stamps the persisted recommendations.
    pub async fn run_pipeline_at(&self, epochs: usize, now: DateTime<Utc>) -> EngineResult<PipelineOutcome> {
        let started = Instant::now();
        let cutoff = window_start(now, self.config.training.window_days);

        let votes = self.store.votes_since(cutoff).await?;

        let training_set = match build_training_set(&votes) {
            Ok(set) => set,
            Err(EngineError::EmptyTrainingSet) => {
                warn!("No votes found, skipping training");
                return Ok(PipelineOutcome::Skipped);
            }
            Err(e) => return Err(e),
        };

        let num_users = training_set.num_users();
        let num_movies = training_set.num_movies();
        let num_interactions = training_set.len();
        info!(
            "Loaded {} interactions from {} votes, {} users, {} movies",
            num_interactions,
            votes.len(),
            num_users,
            num_movies
        );

        let trainer = Trainer::new(TrainingParams::from_config(&self.config.training, epochs));
        let interactions = training_set.interactions;
        let trained = tokio::task::spawn_blocking(move || {
            trainer.fit(&interactions, num_users, num_movies)
        })
        .await??;

        let final_loss = trained.final_loss();
        let generation = self.recommender.install(trained.model, training_set.mapper)?;
        let summary = self.persist_recommendations(now).await?;

        info!(
            "Model generation {} ready in {:?}; recommendations saved for {} users",
            generation,
            started.elapsed(),
            summary.users_persisted
        );

        Ok(PipelineOutcome::Trained(PipelineReport {
            generation,
            num_votes: votes.len(),
            num_users,
            num_movies,
            num_interactions,
            final_loss,
            users_persisted: summary.users_persisted,
            persist_failures: summary.failures,
        }))
    }

    /// Regenerates top-k recommendations for every user of the current model
    /// and replaces each user's stored batch. A user whose write fails is
    /// logged and skipped.
    pub async fn persist_recommendations(&self, updated_at: DateTime<Utc>) -> EngineResult<PersistSummary> {
        let top_k = self.config.recommendation.top_k;
        let recommender = self.recommender.clone();
        let (snapshot, batches) =
            tokio::task::spawn_blocking(move || recommender.recommend_all(top_k)).await??;

        let mut summary = PersistSummary::default();

        for (user_id, recommendations) in batches {
            let rows: Vec<Recommendation> = recommendations
                .into_iter()
                .map(|(movie_id, score)| Recommendation {
                    user_id,
                    movie_id,
                    score,
                    updated_at,
                })
                .collect();

            match self.store.replace_recommendations(user_id, &rows).await {
                Ok(()) => summary.users_persisted += 1,
                Err(e) => {
                    warn!("Failed to save recommendations for user {}: {}", user_id, e);
                    summary.failures += 1;
                }
            }
        }

        info!(
            "Saved recommendations for {} users from generation {} ({} failed)",
            summary.users_persisted, snapshot.generation, summary.failures
        );
        Ok(summary)
    }
}
