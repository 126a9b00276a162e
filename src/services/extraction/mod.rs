use crate::algorithms::IdMapper;
use crate::error::{EngineError, EngineResult};
use crate::models::*;
use crate::utils::validation::validate_vote;
use tracing::{debug, warn};

/// Label given to every movie of a winning set.
pub const POSITIVE_SCORE: f32 = 1.0;

/// Expands each vote into one positive interaction per non-null movie of
/// its winning set. Malformed votes are skipped.
pub fn extract(votes: &[Vote]) -> Vec<RawInteraction> {
    let mut interactions = Vec::with_capacity(votes.len() * TOP4_SET_SIZE);

    for vote in votes {
        if let Err(e) = validate_vote(vote) {
            warn!("Skipping vote: {}", e);
            continue;
        }

        interactions.extend(vote.movies().map(|movie_id| RawInteraction {
            user_id: vote.user_id,
            movie_id,
            score: POSITIVE_SCORE,
        }));
    }

    debug!("Extracted {} interactions from {} votes", interactions.len(), votes.len());
    interactions
}

/// Interactions of one training run together with the mapper they were
/// indexed against.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub mapper: IdMapper,
    pub interactions: Vec<Interaction>,
}

impl TrainingSet {
    pub fn num_users(&self) -> usize {
        self.mapper.num_users()
    }

    pub fn num_movies(&self) -> usize {
        self.mapper.num_movies()
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }
}

/// Builds the training set for one window of votes.
///
/// Every voter of a well-formed vote gets a user index, even when all of
/// their winning movies are null. Movies only enter the mapper through an
/// interaction. A window without a single interaction is an
/// `EmptyTrainingSet`.
pub fn build_training_set(votes: &[Vote]) -> EngineResult<TrainingSet> {
    let raw = extract(votes);
    if raw.is_empty() {
        return Err(EngineError::EmptyTrainingSet);
    }

    let mapper = IdMapper::build(
        votes
            .iter()
            .filter(|v| validate_vote(v).is_ok())
            .map(|v| v.user_id),
        raw.iter().map(|i| i.movie_id),
    );

    let interactions = raw
        .iter()
        .map(|i| -> EngineResult<Interaction> {
            Ok(Interaction {
                user_index: mapper.user_index(i.user_id)?,
                movie_index: mapper.movie_index(i.movie_id)?,
                score: i.score,
            })
        })
        .collect::<EngineResult<Vec<_>>>()?;

    Ok(TrainingSet {
        mapper,
        interactions,
    })
}
