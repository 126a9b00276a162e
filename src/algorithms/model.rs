use crate::algorithms::initializer::embedding_matrix;
use crate::models::Interaction;
use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;

/// Latent-factor model: one embedding row per user and per movie, scored by
/// dot product. Scores are unbounded; 1.0 is the training label for a
/// positive interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorizationModel {
    pub user_factors: Array2<f32>,
    pub movie_factors: Array2<f32>,
}

impl FactorizationModel {
    pub fn init<R: Rng + ?Sized>(num_users: usize, num_movies: usize, dim: usize, rng: &mut R) -> Self {
        Self {
            user_factors: embedding_matrix(rng, num_users, dim),
            movie_factors: embedding_matrix(rng, num_movies, dim),
        }
    }

    pub fn from_factors(user_factors: Array2<f32>, movie_factors: Array2<f32>) -> Self {
        debug_assert_eq!(user_factors.ncols(), movie_factors.ncols());
        Self {
            user_factors,
            movie_factors,
        }
    }

    pub fn num_users(&self) -> usize {
        self.user_factors.nrows()
    }

    pub fn num_movies(&self) -> usize {
        self.movie_factors.nrows()
    }

    pub fn dim(&self) -> usize {
        self.user_factors.ncols()
    }

    pub fn user_vector(&self, user_index: usize) -> ArrayView1<'_, f32> {
        self.user_factors.row(user_index)
    }

    pub fn movie_vector(&self, movie_index: usize) -> ArrayView1<'_, f32> {
        self.movie_factors.row(movie_index)
    }

    pub fn score(&self, user_index: usize, movie_index: usize) -> f32 {
        self.user_vector(user_index).dot(&self.movie_vector(movie_index))
    }

    /// Scores one user against every movie in a single matrix-vector product.
    pub fn score_all(&self, user_index: usize) -> Array1<f32> {
        self.movie_factors.dot(&self.user_vector(user_index))
    }

    pub fn predict_batch(&self, batch: &[Interaction]) -> Vec<f32> {
        batch
            .iter()
            .map(|i| self.score(i.user_index, i.movie_index))
            .collect()
    }
}
