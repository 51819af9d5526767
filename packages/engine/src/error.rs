//! Errors returned by the queue facade.

use actors::PoolError;
use db::DbError;
use queue_core::SubmissionError;
use thiserror::Error;

/// Queue errors.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Invalid submission: {0}")]
    InvalidSubmission(#[from] SubmissionError),

    #[error("Store error: {0}")]
    Store(DbError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<DbError> for QueueError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(message) => QueueError::NotFound(message),
            other => QueueError::Store(other),
        }
    }
}

impl From<PoolError> for QueueError {
    fn from(err: PoolError) -> Self {
        QueueError::Worker(err.to_string())
    }
}
