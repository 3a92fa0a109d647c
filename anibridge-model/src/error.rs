use thiserror::Error;

/// Errors produced by model parsing and validation routines.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
