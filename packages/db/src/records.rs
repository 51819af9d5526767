//! Row types exchanged with SurrealDB.
//!
//! Record ids carry the caller's job id, so content structs never include
//! an `id` field.

use queue_core::{ClaimedJob, DeadJob, Job, JobId, JobState};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

fn job_id_of(thing: &Thing) -> JobId {
    JobId(thing.id.to_raw())
}

/// A row read from the `job` table.
#[derive(Debug, Deserialize)]
pub(crate) struct JobRecord {
    id: Thing,
    command: String,
    max_retries: u32,
    attempts: u32,
    state: JobState,
    enqueued_at: i64,
    next_run: i64,
}

impl JobRecord {
    pub(crate) fn into_job(self) -> Job {
        Job {
            id: job_id_of(&self.id),
            command: self.command,
            max_retries: self.max_retries,
            attempts: self.attempts,
            state: self.state,
            enqueued_at: self.enqueued_at,
            next_run: self.next_run,
        }
    }
}

/// Content written to the `job` table.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct JobContent {
    command: String,
    max_retries: u32,
    attempts: u32,
    state: JobState,
    enqueued_at: i64,
    next_run: i64,
}

impl From<&Job> for JobContent {
    fn from(job: &Job) -> Self {
        Self {
            command: job.command.clone(),
            max_retries: job.max_retries,
            attempts: job.attempts,
            state: job.state,
            enqueued_at: job.enqueued_at,
            next_run: job.next_run,
        }
    }
}

/// A row read from the `dlq` table.
#[derive(Debug, Deserialize)]
pub(crate) struct DeadRecord {
    id: Thing,
    command: String,
    max_retries: u32,
    attempts: u32,
    failed_at: i64,
}

impl DeadRecord {
    pub(crate) fn into_dead_job(self) -> DeadJob {
        DeadJob {
            id: job_id_of(&self.id),
            command: self.command,
            max_retries: self.max_retries,
            attempts: self.attempts,
            failed_at: self.failed_at,
        }
    }
}

/// Content written to the `dlq` table.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DeadContent {
    command: String,
    max_retries: u32,
    attempts: u32,
    failed_at: i64,
    dead_seq: i64,
}

impl DeadContent {
    pub(crate) fn new(job: &ClaimedJob, attempts: u32, failed_at: i64, dead_seq: i64) -> Self {
        Self {
            command: job.command.clone(),
            max_retries: job.max_retries,
            attempts,
            failed_at,
            dead_seq,
        }
    }
}

/// Result row of a `count()` aggregate.
#[derive(Debug, Deserialize)]
pub(crate) struct CountRecord {
    pub(crate) count: i64,
}

pub(crate) fn first_count(rows: Vec<CountRecord>) -> u64 {
    rows.first()
        .map(|r| u64::try_from(r.count).unwrap_or(0))
        .unwrap_or(0)
}
