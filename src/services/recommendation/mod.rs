use crate::algorithms::retriever::top_k;
use crate::algorithms::{FactorizationModel, IdMapper};
use crate::error::{EngineError, EngineResult};
use crate::models::*;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// A trained model together with the mapper its rows were indexed by.
/// Always handed out as a whole so the two never come from different runs.
#[derive(Debug)]
pub struct Snapshot {
    pub generation: u64,
    pub model: FactorizationModel,
    pub mapper: IdMapper,
    pub trained_at: DateTime<Utc>,
}

impl Snapshot {
    /// Dense sweep over every known movie followed by a partial top-k.
    /// Equal scores are ordered by ascending movie id.
    pub fn recommend(&self, user_id: UserId, k: usize) -> EngineResult<Vec<(MovieId, f32)>> {
        let user_index = self
            .mapper
            .user_index(user_id)
            .map_err(|_| EngineError::UnknownUser(user_id))?;

        let scores = self.model.score_all(user_index);

        top_k(&scores, k)
            .into_iter()
            .map(|(movie_index, score)| -> EngineResult<(MovieId, f32)> {
                Ok((self.mapper.movie_id(movie_index)?, score))
            })
            .collect()
    }
}

/// Serves recommendations from the most recently installed snapshot.
#[derive(Debug, Default)]
pub struct Recommender {
    current: RwLock<Option<Arc<Snapshot>>>,
    generations: AtomicU64,
}

impl Recommender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current model and mapper in one step and returns the new
    /// generation number.
    pub fn install(&self, model: FactorizationModel, mapper: IdMapper) -> EngineResult<u64> {
        if model.num_users() != mapper.num_users() || model.num_movies() != mapper.num_movies() {
            return Err(EngineError::InvalidParameters(format!(
                "model shape {}x{} does not match mapper {}x{}",
                model.num_users(),
                model.num_movies(),
                mapper.num_users(),
                mapper.num_movies()
            )));
        }

        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(Snapshot {
            generation,
            model,
            mapper,
            trained_at: Utc::now(),
        });

        *self.current.write() = Some(snapshot);
        info!("Installed model generation {}", generation);
        Ok(generation)
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.current.read().clone()
    }

    pub fn generation(&self) -> Option<u64> {
        self.current.read().as_ref().map(|s| s.generation)
    }

    pub fn try_recommend(&self, user_id: UserId, k: usize) -> EngineResult<Vec<(MovieId, f32)>> {
        let snapshot = self.snapshot().ok_or(EngineError::ModelUnavailable)?;
        snapshot.recommend(user_id, k)
    }

    /// Like `try_recommend`, but a missing model or unknown user only
    /// produces a diagnostic and an empty list.
    pub fn recommend(&self, user_id: UserId, k: usize) -> Vec<(MovieId, f32)> {
        match self.try_recommend(user_id, k) {
            Ok(recommendations) => recommendations,
            Err(EngineError::ModelUnavailable) => {
                error!("Model not trained yet");
                Vec::new()
            }
            Err(EngineError::UnknownUser(user_id)) => {
                warn!("User {} not in training data", user_id);
                Vec::new()
            }
            Err(e) => {
                error!("Failed to generate recommendations for user {}: {}", user_id, e);
                Vec::new()
            }
        }
    }

    /// Recommendations for every user of the current snapshot, all computed
    /// against that same snapshot.
    pub fn recommend_all(&self, k: usize) -> EngineResult<(Arc<Snapshot>, Vec<(UserId, Vec<(MovieId, f32)>)>)> {
        let snapshot = self.snapshot().ok_or(EngineError::ModelUnavailable)?;

        let results = snapshot
            .mapper
            .user_ids()
            .par_iter()
            .map(|&user_id| snapshot.recommend(user_id, k).map(|recs| (user_id, recs)))
            .collect::<EngineResult<Vec<_>>>()?;

        Ok((snapshot, results))
    }
}
