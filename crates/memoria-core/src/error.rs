//! Error types for memoria

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoriaError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid note name: {0}")]
    InvalidNote(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MemoriaError>;
