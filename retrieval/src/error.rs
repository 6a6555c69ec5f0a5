use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Lexical index error: {0}")]
    Lexical(#[from] codesearch_lexical_index::LexicalError),

    #[error("Query too short: minimum {min} characters, got {actual}")]
    QueryTooShort { min: usize, actual: usize },

    #[error("Invalid retrieval configuration: {0}")]
    InvalidConfig(String),

    #[error("Semantic search error: {0}")]
    Semantic(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
