use thiserror::Error;

#[derive(Error, Debug)]
pub enum LexicalError {
    #[error("Collection has not been fitted")]
    NotFitted,

    #[error("Unknown document index {index} (collection has {len} documents)")]
    UnknownDocument { index: usize, len: usize },

    #[error("Duplicate document id: {0}")]
    DuplicateDocument(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Invalid BM25 parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid normalization strategy: {0}")]
    InvalidStrategy(String),
}

pub type Result<T> = std::result::Result<T, LexicalError>;
