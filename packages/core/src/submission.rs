//! Submission payloads accepted by the engine.

use serde::Deserialize;
use thiserror::Error;

use crate::JobId;

/// Errors for payloads that never make it into the store.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("invalid submission payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("submission field `{0}` must not be empty")]
    Empty(&'static str),
}

/// A job submission.
///
/// `id` and `command` are required, `max_retries` falls back to the
/// configured default. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Submission {
    pub id: JobId,
    pub command: String,
    #[serde(default)]
    pub max_retries: Option<u32>,
}

impl Submission {
    pub fn new(id: impl Into<JobId>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command: command.into(),
            max_retries: None,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Parse and validate a JSON payload.
    pub fn parse(payload: &str) -> Result<Self, SubmissionError> {
        let submission: Submission = serde_json::from_str(payload)?;
        submission.validate()?;
        Ok(submission)
    }

    pub fn validate(&self) -> Result<(), SubmissionError> {
        if self.id.as_str().trim().is_empty() {
            return Err(SubmissionError::Empty("id"));
        }
        Ok(())
    }
}
