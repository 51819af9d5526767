//! Job repository for the active queue table.

use std::collections::HashMap;

use queue_core::{Job, JobId, JobState};
use serde::Deserialize;

use crate::records::{JobContent, JobRecord};
use crate::{DbError, Store};

/// Repository for active job persistence operations.
pub struct JobRepository<'a> {
    store: &'a Store,
}

impl<'a> JobRepository<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Insert or overwrite a job as a fresh pending record.
    ///
    /// Attempts and `next_run` are reset and the job takes a new place at
    /// the back of the FIFO. A dead-letter record with the same id is
    /// dropped in the same transaction so an id never lives in both tables.
    pub async fn upsert(&self, id: &JobId, command: &str, max_retries: u32) -> Result<Job, DbError> {
        let db = self.store.database();
        let mut job = Job::new(id.clone(), command, max_retries);
        job.enqueued_at = self.store.next_sequence();

        db.query(
            r#"
            BEGIN TRANSACTION;
            DELETE type::thing("dlq", $id);
            UPSERT type::thing("job", $id) CONTENT $content RETURN NONE;
            COMMIT TRANSACTION;
            "#,
        )
        .bind(("id", id.to_string()))
        .bind(("content", JobContent::from(&job)))
        .await?
        .check()?;

        tracing::debug!("Upserted job {} (enqueued_at={})", job.id, job.enqueued_at);
        Ok(job)
    }

    /// Get a job by ID.
    pub async fn get(&self, id: &JobId) -> Result<Job, DbError> {
        self.find(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Job not found: {}", id)))
    }

    /// Get a job by ID, if present.
    pub async fn find(&self, id: &JobId) -> Result<Option<Job>, DbError> {
        let db = self.store.database();

        let record: Option<JobRecord> = db.select(("job", id.to_string())).await?;

        Ok(record.map(JobRecord::into_job))
    }

    /// List all active jobs, oldest submission first.
    pub async fn list(&self) -> Result<Vec<Job>, DbError> {
        let db = self.store.database();

        let mut result = db
            .query("SELECT * FROM job ORDER BY enqueued_at ASC")
            .await?;

        let records: Vec<JobRecord> = result.take(0)?;

        Ok(records.into_iter().map(JobRecord::into_job).collect())
    }

    /// List active jobs in one state, oldest submission first.
    pub async fn list_by_state(&self, state: JobState) -> Result<Vec<Job>, DbError> {
        let db = self.store.database();

        let mut result = db
            .query("SELECT * FROM job WHERE state = $state ORDER BY enqueued_at ASC")
            .bind(("state", state.as_str()))
            .await?;

        let records: Vec<JobRecord> = result.take(0)?;

        Ok(records.into_iter().map(JobRecord::into_job).collect())
    }

    /// Delete a job. Deleting a missing job is not an error.
    pub async fn delete(&self, id: &JobId) -> Result<(), DbError> {
        let db = self.store.database();

        let _: Option<JobRecord> = db.delete(("job", id.to_string())).await?;

        Ok(())
    }

    /// Record a failed attempt and put the job back to pending until `next_run`.
    pub async fn reschedule(&self, id: &JobId, attempts: u32, next_run: i64) -> Result<(), DbError> {
        let db = self.store.database();

        db.query(
            r#"
            UPDATE type::thing("job", $id)
            SET attempts = $attempts, state = "pending", next_run = $next_run
            RETURN NONE
            "#,
        )
        .bind(("id", id.to_string()))
        .bind(("attempts", attempts))
        .bind(("next_run", next_run))
        .await?
        .check()?;

        Ok(())
    }

    /// Operator-only: overwrite the command and make the job immediately
    /// runnable with a full budget, whatever state it was in.
    pub async fn force_reset(&self, id: &JobId, command: &str) -> Result<Job, DbError> {
        let db = self.store.database();

        let mut result = db
            .query(
                r#"
                UPDATE type::thing("job", $id)
                SET command = $command, attempts = 0, state = "pending", next_run = 0
                RETURN AFTER
                "#,
            )
            .bind(("id", id.to_string()))
            .bind(("command", command.to_string()))
            .await?;

        let records: Vec<JobRecord> = result.take(0)?;

        records
            .into_iter()
            .next()
            .map(JobRecord::into_job)
            .ok_or_else(|| DbError::NotFound(format!("Job not found: {}", id)))
    }

    /// Count active jobs by state.
    pub async fn count_by_state(&self) -> Result<HashMap<JobState, u64>, DbError> {
        let db = self.store.database();

        let mut result = db
            .query("SELECT state, count() AS count FROM job GROUP BY state")
            .await?;

        #[derive(Deserialize)]
        struct StateCount {
            state: Option<String>,
            count: i64,
        }

        let counts: Vec<StateCount> = result.take(0)?;

        let mut map = HashMap::new();
        for count in counts {
            if let Some(state) = count.state.as_deref().and_then(JobState::parse) {
                map.insert(state, u64::try_from(count.count).unwrap_or(0));
            }
        }

        Ok(map)
    }
}
