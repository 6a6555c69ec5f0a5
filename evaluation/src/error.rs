use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("k must be at least 1, got {0}")]
    InvalidK(usize),

    #[error("Ground truth set is empty")]
    EmptyGroundTruth,

    #[error("Invalid answer: {0}")]
    InvalidAnswer(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Invalid parameter grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid evaluation configuration: {0}")]
    InvalidConfig(String),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] codesearch_retrieval::RetrievalError),

    #[error("Retrieval callback failed: {0}")]
    Callback(String),

    #[error("Retrieval call timed out after {0}ms")]
    Timeout(u64),

    #[error("Task join error: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, EvaluationError>;
