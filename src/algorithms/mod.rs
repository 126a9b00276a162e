pub mod initializer;
pub mod mapper;
pub mod model;
pub mod optimizer;
pub mod retriever;
pub mod trainer;

pub use mapper::IdMapper;
pub use model::FactorizationModel;
pub use optimizer::{Optimizer, OptimizerKind};
pub use trainer::{TrainedModel, Trainer, TrainingParams};
