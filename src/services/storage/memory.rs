use super::VoteStore;
use crate::error::{EngineError, EngineResult};
use crate::models::*;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-process `VoteStore` used by tests, benches and local experiments.
///
/// `fail_next` makes the next N calls return a storage error, which is how
/// scheduler tests simulate an unreachable database.
#[derive(Default)]
pub struct MemoryVoteStore {
    votes: RwLock<Vec<Vote>>,
    recommendations: RwLock<HashMap<UserId, Vec<Recommendation>>>,
    pending_failures: AtomicUsize,
}

impl MemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_votes(votes: Vec<Vote>) -> Self {
        let store = Self::new();
        store.extend_votes(votes);
        store
    }

    pub fn extend_votes(&self, votes: impl IntoIterator<Item = Vote>) {
        self.votes.write().extend(votes);
    }

    pub fn vote_count(&self) -> usize {
        self.votes.read().len()
    }

    pub fn fail_next(&self, calls: usize) {
        self.pending_failures.store(calls, Ordering::SeqCst);
    }

    fn check_available(&self) -> EngineResult<()> {
        let injected = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if injected {
            Err(EngineError::Storage("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl VoteStore for MemoryVoteStore {
    async fn votes_since(&self, cutoff: DateTime<Utc>) -> EngineResult<Vec<Vote>> {
        self.check_available()?;
        Ok(self
            .votes
            .read()
            .iter()
            .filter(|v| v.timestamp > cutoff)
            .cloned()
            .collect())
    }

    async fn count_votes_after(&self, vote_id: i64) -> EngineResult<i64> {
        self.check_available()?;
        Ok(self.votes.read().iter().filter(|v| v.id > vote_id).count() as i64)
    }

    async fn max_vote_id(&self) -> EngineResult<Option<i64>> {
        self.check_available()?;
        Ok(self.votes.read().iter().map(|v| v.id).max())
    }

    async fn replace_recommendations(
        &self,
        user_id: UserId,
        recommendations: &[Recommendation],
    ) -> EngineResult<()> {
        self.check_available()?;

        // Later rows for the same movie overwrite earlier ones, like the upsert.
        let mut rows: Vec<Recommendation> = Vec::with_capacity(recommendations.len());
        for rec in recommendations {
            let rec = Recommendation {
                user_id,
                ..rec.clone()
            };
            match rows.iter_mut().find(|r| r.movie_id == rec.movie_id) {
                Some(existing) => *existing = rec,
                None => rows.push(rec),
            }
        }

        self.recommendations.write().insert(user_id, rows);
        Ok(())
    }

    async fn recommendations_for(&self, user_id: UserId) -> EngineResult<Vec<Recommendation>> {
        self.check_available()?;

        let mut rows = self
            .recommendations
            .read()
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        rows.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.movie_id.cmp(&b.movie_id))
        });
        Ok(rows)
    }
}
