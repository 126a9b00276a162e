use crate::algorithms::model::FactorizationModel;
use crate::algorithms::optimizer::OptimizerKind;
use crate::config::TrainingConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{IdKind, Interaction};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingParams {
    pub embedding_dim: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub optimizer: OptimizerKind,
    pub seed: Option<u64>,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            embedding_dim: 50,
            epochs: 10,
            batch_size: 64,
            learning_rate: 0.01,
            optimizer: OptimizerKind::Adam,
            seed: None,
        }
    }
}

impl TrainingParams {
    pub fn from_config(config: &TrainingConfig, epochs: usize) -> Self {
        Self {
            embedding_dim: config.embedding_dim,
            epochs,
            batch_size: config.batch_size,
            learning_rate: config.learning_rate,
            optimizer: config.optimizer,
            seed: config.seed,
        }
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub model: FactorizationModel,
    /// Average of the per-batch mean losses, one entry per epoch.
    pub epoch_losses: Vec<f64>,
}

impl TrainedModel {
    pub fn final_loss(&self) -> Option<f64> {
        self.epoch_losses.last().copied()
    }
}

/// Mini-batch trainer minimising the squared error between the dot-product
/// score and each interaction's label.
#[derive(Debug, Clone)]
pub struct Trainer {
    params: TrainingParams,
}

impl Trainer {
    pub fn new(params: TrainingParams) -> Self {
        Self { params }
    }

    /// Fits a fresh model. Runs every configured epoch; the loss is only
    /// reported, never used to stop early.
    pub fn fit(
        &self,
        interactions: &[Interaction],
        num_users: usize,
        num_movies: usize,
    ) -> EngineResult<TrainedModel> {
        crate::utils::validation::validate_training_params(&self.params)?;

        if interactions.is_empty() {
            return Err(EngineError::EmptyTrainingSet);
        }

        for interaction in interactions {
            if interaction.user_index >= num_users {
                return Err(EngineError::IndexOutOfRange {
                    kind: IdKind::User,
                    index: interaction.user_index,
                    len: num_users,
                });
            }
            if interaction.movie_index >= num_movies {
                return Err(EngineError::IndexOutOfRange {
                    kind: IdKind::Movie,
                    index: interaction.movie_index,
                    len: num_movies,
                });
            }
        }

        let mut rng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let dim = self.params.embedding_dim;
        let mut model = FactorizationModel::init(num_users, num_movies, dim, &mut rng);
        let mut user_optimizer = self.params.optimizer.build(self.params.learning_rate);
        let mut movie_optimizer = self.params.optimizer.build(self.params.learning_rate);

        let mut user_grads = Array2::<f32>::zeros((num_users, dim));
        let mut movie_grads = Array2::<f32>::zeros((num_movies, dim));

        let mut order: Vec<usize> = (0..interactions.len()).collect();
        let mut epoch_losses = Vec::with_capacity(self.params.epochs);
        let started = Instant::now();

        for epoch in 0..self.params.epochs {
            order.shuffle(&mut rng);

            let mut total_loss = 0.0f64;
            let mut batches = 0usize;

            for chunk in order.chunks(self.params.batch_size) {
                user_grads.fill(0.0);
                movie_grads.fill(0.0);

                let scale = 2.0 / chunk.len() as f32;
                let mut batch_loss = 0.0f64;

                for &i in chunk {
                    let interaction = &interactions[i];
                    let user = model.user_factors.row(interaction.user_index);
                    let movie = model.movie_factors.row(interaction.movie_index);

                    let error = user.dot(&movie) - interaction.score;
                    batch_loss += (error * error) as f64;

                    // d(mean sq err)/d(prediction) = 2 * error / batch
                    let coeff = scale * error;
                    user_grads
                        .row_mut(interaction.user_index)
                        .scaled_add(coeff, &movie);
                    movie_grads
                        .row_mut(interaction.movie_index)
                        .scaled_add(coeff, &user);
                }

                user_optimizer.step(&mut model.user_factors, &user_grads);
                movie_optimizer.step(&mut model.movie_factors, &movie_grads);

                total_loss += batch_loss / chunk.len() as f64;
                batches += 1;
            }

            let epoch_loss = total_loss / batches as f64;
            info!("Epoch {}/{}, Loss: {:.4}", epoch + 1, self.params.epochs, epoch_loss);
            epoch_losses.push(epoch_loss);
        }

        debug!(
            "Trained {}x{} model on {} interactions in {:?}",
            num_users,
            num_movies,
            interactions.len(),
            started.elapsed()
        );

        Ok(TrainedModel { model, epoch_losses })
    }
}
