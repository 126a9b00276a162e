use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = i64;
pub type MovieId = i64;

/// Number of movies in a scraped favourites set.
pub const TOP4_SET_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdKind {
    User,
    Movie,
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdKind::User => write!(f, "user"),
            IdKind::Movie => write!(f, "movie"),
        }
    }
}

/// A vote row joined with the movie ids of the winning top-4 set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: i64,
    pub user_id: UserId,
    pub winner_movie_ids: Vec<Option<MovieId>>,
    pub timestamp: DateTime<Utc>,
}

/// An interaction still expressed in database identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawInteraction {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub score: f32,
}

/// An interaction translated into embedding-table indices.
///
/// Only produced by `services::extraction::build_training_set`, so the
/// indices always belong to the mapper built alongside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub user_index: usize,
    pub movie_index: usize,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub score: f32,
    pub updated_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(id: i64, user_id: UserId, winner_movie_ids: Vec<Option<MovieId>>) -> Self {
        Self {
            id,
            user_id,
            winner_movie_ids,
            timestamp: Utc::now(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn movies(&self) -> impl Iterator<Item = MovieId> + '_ {
        self.winner_movie_ids.iter().flatten().copied()
    }
}

impl Recommendation {
    pub fn new(user_id: UserId, movie_id: MovieId, score: f32) -> Self {
        Self {
            user_id,
            movie_id,
            score,
            updated_at: Utc::now(),
        }
    }
}
