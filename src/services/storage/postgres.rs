use super::VoteStore;
use crate::config::DatabaseConfig;
use crate::error::EngineResult;
use crate::models::*;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info};

const VOTES_SINCE: &str = r#"
    SELECT v.id::BIGINT,
           v.user_id::BIGINT,
           COALESCE(t.movie_ids, '{}')::BIGINT[],
           v.timestamp::TIMESTAMPTZ
    FROM votes v
    JOIN top4_sets t ON t.id = v.winner_set_id
    WHERE v.timestamp > $1
"#;

const UPSERT_RECOMMENDATION: &str = r#"
    INSERT INTO recommendations (user_id, movie_id, score, updated_at)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (user_id, movie_id)
    DO UPDATE SET score = EXCLUDED.score, updated_at = EXCLUDED.updated_at
"#;

type VoteRow = (i64, i64, Vec<Option<i64>>, DateTime<Utc>);
type RecommendationRow = (i64, i64, f64, DateTime<Utc>);

/// `VoteStore` backed by the MovieMash PostgreSQL schema.
#[derive(Clone)]
pub struct PgVoteStore {
    pool: PgPool,
}

impl PgVoteStore {
    pub async fn connect(config: &DatabaseConfig) -> EngineResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        info!("Connected to PostgreSQL (pool size {})", config.max_connections);
        Ok(Self { pool })
    }

    /// Builds the pool without opening a connection, so an unreachable
    /// database surfaces as a per-query error instead of a startup failure.
    pub fn connect_lazy(config: &DatabaseConfig) -> EngineResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy(&config.url)?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl VoteStore for PgVoteStore {
    async fn votes_since(&self, cutoff: DateTime<Utc>) -> EngineResult<Vec<Vote>> {
        let rows: Vec<VoteRow> = sqlx::query_as(VOTES_SINCE)
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;

        debug!("Fetched {} votes since {}", rows.len(), cutoff);

        Ok(rows
            .into_iter()
            .map(|(id, user_id, winner_movie_ids, timestamp)| Vote {
                id,
                user_id,
                winner_movie_ids,
                timestamp,
            })
            .collect())
    }

    async fn count_votes_after(&self, vote_id: i64) -> EngineResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes WHERE id > $1")
            .bind(vote_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn max_vote_id(&self) -> EngineResult<Option<i64>> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(id)::BIGINT FROM votes")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }

    async fn replace_recommendations(
        &self,
        user_id: UserId,
        recommendations: &[Recommendation],
    ) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM recommendations WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for rec in recommendations {
            sqlx::query(UPSERT_RECOMMENDATION)
                .bind(user_id)
                .bind(rec.movie_id)
                .bind(rec.score as f64)
                .bind(rec.updated_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn recommendations_for(&self, user_id: UserId) -> EngineResult<Vec<Recommendation>> {
        let rows: Vec<RecommendationRow> = sqlx::query_as(
            "SELECT user_id::BIGINT, movie_id::BIGINT, score::FLOAT8, updated_at::TIMESTAMPTZ \
             FROM recommendations WHERE user_id = $1 ORDER BY score DESC, movie_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, movie_id, score, updated_at)| Recommendation {
                user_id,
                movie_id,
                score: score as f32,
                updated_at,
            })
            .collect())
    }
}
