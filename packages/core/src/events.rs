//! Event types for real-time updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::JobId;

/// Events emitted by the job queue system for real-time updates.
///
/// Events are notifications only; the store remains the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEvent {
    // Job events
    /// A job was submitted (or resubmitted).
    JobEnqueued {
        job_id: JobId,
        timestamp: DateTime<Utc>,
    },
    /// A worker claimed a job.
    JobClaimed {
        job_id: JobId,
        worker_id: String,
        timestamp: DateTime<Utc>,
    },
    /// A job's command exited with status 0 and the job was removed.
    JobCompleted {
        job_id: JobId,
        worker_id: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    /// A job failed and was rescheduled.
    JobRetryScheduled {
        job_id: JobId,
        attempts: u32,
        exit_code: Option<i32>,
        next_run: i64,
        timestamp: DateTime<Utc>,
    },
    /// A job failed with no budget left and moved to the dead-letter table.
    JobDeadLettered {
        job_id: JobId,
        attempts: u32,
        exit_code: Option<i32>,
        timestamp: DateTime<Utc>,
    },
    /// A dead-lettered job was re-admitted by an operator.
    JobRevived {
        job_id: JobId,
        timestamp: DateTime<Utc>,
    },
    /// A dead-lettered job was discarded by an operator.
    DeadJobDeleted {
        job_id: JobId,
        timestamp: DateTime<Utc>,
    },
    /// An operator forced a job back to pending with a new command.
    JobReset {
        job_id: JobId,
        timestamp: DateTime<Utc>,
    },

    // Worker events
    /// A worker loop started.
    WorkerStarted {
        worker_id: String,
        timestamp: DateTime<Utc>,
    },
    /// A worker loop observed the stop signal and exited.
    WorkerStopped {
        worker_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl JobEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            JobEvent::JobEnqueued { timestamp, .. } => *timestamp,
            JobEvent::JobClaimed { timestamp, .. } => *timestamp,
            JobEvent::JobCompleted { timestamp, .. } => *timestamp,
            JobEvent::JobRetryScheduled { timestamp, .. } => *timestamp,
            JobEvent::JobDeadLettered { timestamp, .. } => *timestamp,
            JobEvent::JobRevived { timestamp, .. } => *timestamp,
            JobEvent::DeadJobDeleted { timestamp, .. } => *timestamp,
            JobEvent::JobReset { timestamp, .. } => *timestamp,
            JobEvent::WorkerStarted { timestamp, .. } => *timestamp,
            JobEvent::WorkerStopped { timestamp, .. } => *timestamp,
        }
    }

    /// Get the job ID associated with this event, if any.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            JobEvent::JobEnqueued { job_id, .. }
            | JobEvent::JobClaimed { job_id, .. }
            | JobEvent::JobCompleted { job_id, .. }
            | JobEvent::JobRetryScheduled { job_id, .. }
            | JobEvent::JobDeadLettered { job_id, .. }
            | JobEvent::JobRevived { job_id, .. }
            | JobEvent::DeadJobDeleted { job_id, .. }
            | JobEvent::JobReset { job_id, .. } => Some(job_id),
            JobEvent::WorkerStarted { .. } | JobEvent::WorkerStopped { .. } => None,
        }
    }

    /// Whether the job reached a terminal outcome (done or dead).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobEvent::JobCompleted { .. } | JobEvent::JobDeadLettered { .. }
        )
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            JobEvent::JobEnqueued { job_id, .. } => format!("Job {} enqueued", job_id),
            JobEvent::JobClaimed {
                job_id, worker_id, ..
            } => format!("Job {} claimed by {}", job_id, worker_id),
            JobEvent::JobCompleted {
                job_id,
                duration_ms,
                ..
            } => format!("Job {} completed in {}ms", job_id, duration_ms),
            JobEvent::JobRetryScheduled {
                job_id,
                attempts,
                next_run,
                ..
            } => format!(
                "Job {} failed (attempts={}), retry at {}",
                job_id, attempts, next_run
            ),
            JobEvent::JobDeadLettered {
                job_id, attempts, ..
            } => format!("Job {} moved to DLQ after {} attempts", job_id, attempts),
            JobEvent::JobRevived { job_id, .. } => format!("Job {} revived from DLQ", job_id),
            JobEvent::DeadJobDeleted { job_id, .. } => format!("Job {} deleted from DLQ", job_id),
            JobEvent::JobReset { job_id, .. } => format!("Job {} reset by operator", job_id),
            JobEvent::WorkerStarted { worker_id, .. } => format!("Worker {} ready", worker_id),
            JobEvent::WorkerStopped { worker_id, .. } => format!("Worker {} exiting", worker_id),
        }
    }
}
