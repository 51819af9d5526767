//! Job domain types for work items in the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller-supplied identifier for a job.
///
/// Unlike generated ids, the same id may be submitted many times; a later
/// submission replaces the earlier record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// State of a job while it is in the active table.
///
/// Terminal outcomes are not states: a completed job is deleted and an
/// exhausted one lives in the dead-letter table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Waiting for `next_run` to pass and a worker to claim it.
    #[default]
    Pending,
    /// Claimed by a worker, execution in flight.
    Processing,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Processing => "processing",
        }
    }

    /// Parse a stored state string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobState::Pending),
            "processing" => Some(JobState::Processing),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job record in the active queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Opaque command line handed to the executor.
    pub command: String,
    /// Number of failed executions tolerated before dead-lettering.
    pub max_retries: u32,
    /// Failed executions so far.
    #[serde(default)]
    pub attempts: u32,
    pub state: JobState,
    /// Submission order key, microseconds since the epoch.
    pub enqueued_at: i64,
    /// Earliest unix second the job may be claimed; 0 means now.
    #[serde(default)]
    pub next_run: i64,
}

impl Job {
    /// Create a fresh pending job, immediately eligible.
    pub fn new(id: impl Into<JobId>, command: impl Into<String>, max_retries: u32) -> Self {
        Self {
            id: id.into(),
            command: command.into(),
            max_retries,
            attempts: 0,
            state: JobState::Pending,
            enqueued_at: 0,
            next_run: 0,
        }
    }

    /// Whether a claim at `now` may pick this job.
    pub fn is_eligible(&self, now: i64) -> bool {
        self.state == JobState::Pending && self.next_run <= now
    }

    /// Whether the job is pending but scheduled for later.
    pub fn is_delayed(&self, now: i64) -> bool {
        self.state == JobState::Pending && self.next_run > now
    }
}

/// The part of a job a worker owns after a successful claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedJob {
    pub id: JobId,
    pub command: String,
    pub max_retries: u32,
    pub attempts: u32,
}

impl From<Job> for ClaimedJob {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            command: job.command,
            max_retries: job.max_retries,
            attempts: job.attempts,
        }
    }
}

/// A job that exhausted its retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadJob {
    pub id: JobId,
    pub command: String,
    pub max_retries: u32,
    /// Final count of failed executions.
    pub attempts: u32,
    /// Unix seconds when the job was dead-lettered.
    pub failed_at: i64,
}

impl DeadJob {
    pub fn failed_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.failed_at, 0)
    }

    /// The job this record turns back into when an operator retries it.
    pub fn revive(&self) -> Job {
        Job::new(self.id.clone(), self.command.clone(), self.max_retries)
    }
}
