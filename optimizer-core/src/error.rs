//! Error types
//!
//! Optimization *outcomes* (infeasible, no measures, ...) are not errors and
//! live in `optimizer::types`. These enums cover the failures that abort a
//! call or that a backend reports while solving.

use thiserror::Error;
use uuid::Uuid;

/// Persistence boundary failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Solver backend failures
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("no optimization backend is available")]
    Unavailable,

    #[error("malformed model: {0}")]
    MalformedModel(String),

    #[error("solver I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend {backend} failed: {message}")]
    Backend { backend: String, message: String },

    #[error("could not parse {backend} output: {message}")]
    Parse { backend: String, message: String },
}

/// Failures that abort a whole optimizer call
#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("no optimization backend is available")]
    SolverUnavailable,

    #[error("architecture {0} not found")]
    ArchitectureNotFound(Uuid),

    #[error("security attribute {0} not found")]
    AttributeNotFound(Uuid),

    #[error("invalid budget {0}: must be a finite, non-negative amount")]
    InvalidBudget(f64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type OptimizerResult<T> = Result<T, OptimizerError>;
