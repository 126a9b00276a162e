mod memory;
mod postgres;

pub use memory::MemoryVoteStore;
pub use postgres::PgVoteStore;

use crate::error::EngineResult;
use crate::models::*;
use chrono::{DateTime, Utc};

/// Everything the engine reads from and writes to the relational store.
#[async_trait::async_trait]
pub trait VoteStore: Send + Sync {
    /// Votes with `timestamp > cutoff`, each joined with the movie ids of
    /// its winning set.
    async fn votes_since(&self, cutoff: DateTime<Utc>) -> EngineResult<Vec<Vote>>;

    async fn count_votes_after(&self, vote_id: i64) -> EngineResult<i64>;

    async fn max_vote_id(&self) -> EngineResult<Option<i64>>;

    /// Deletes every stored recommendation of `user_id` and writes
    /// `recommendations` in their place as one unit.
    async fn replace_recommendations(
        &self,
        user_id: UserId,
        recommendations: &[Recommendation],
    ) -> EngineResult<()>;

    /// Stored recommendations for a user, best first.
    async fn recommendations_for(&self, user_id: UserId) -> EngineResult<Vec<Recommendation>>;
}
