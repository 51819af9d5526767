//! Core domain types for the job queue system.
//!
//! This crate contains shared types used across all packages:
//! - Job, JobState and DeadJob for work items
//! - Submission for incoming payloads
//! - Retry/backoff decisions
//! - Events for real-time updates

mod config;
mod events;
mod job;
pub mod retry;
mod status;
mod submission;

pub use config::ConfigKey;
pub use events::JobEvent;
pub use job::{ClaimedJob, DeadJob, Job, JobId, JobState};
pub use retry::{ExecOutcome, Transition, backoff_delay, next_transition};
pub use status::QueueStatus;
pub use submission::{Submission, SubmissionError};
