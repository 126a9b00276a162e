use crate::models::IdKind;

/// Engine-level errors.
///
/// Mapper misuse (`UnknownIdentifier`, `IndexOutOfRange`) indicates a bug in
/// the caller. `ModelUnavailable` and `UnknownUser` are expected while serving
/// and are turned into empty results by the recommender. `EmptyTrainingSet`
/// skips a training run without touching the current model.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("Unknown {kind} identifier: {id}")]
    UnknownIdentifier { kind: IdKind, id: i64 },

    #[error("{kind} index {index} out of range (count {len})")]
    IndexOutOfRange { kind: IdKind, index: usize, len: usize },

    #[error("No model has been trained yet")]
    ModelUnavailable,

    #[error("User {0} is not part of the current model")]
    UnknownUser(i64),

    #[error("No interactions available for training")]
    EmptyTrainingSet,

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Storage error: {0}")]
    TransientStorage(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Training task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl EngineError {
    /// Errors that are part of normal operation and only warrant a diagnostic.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::ModelUnavailable
                | EngineError::UnknownUser(_)
                | EngineError::EmptyTrainingSet
                | EngineError::TransientStorage(_)
                | EngineError::Storage(_)
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
