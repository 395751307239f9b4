//! Application error types for the document lifecycle.
use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Empty document")]
    EmptyDocument,

    #[error("Document capacity exceeded")]
    CapacityExceeded,

    #[error("Document name space exhausted")]
    NameSpaceExhausted,

    #[error("Not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}
