//! Dead-letter repository.
//!
//! Moves between `job` and `dlq` run as one transaction so an id is never
//! lost or present in both tables once the move commits.

use queue_core::{ClaimedJob, DeadJob, Job, JobId};

use crate::records::{CountRecord, DeadContent, DeadRecord, first_count};
use crate::{DbError, Store};

/// Repository for dead-lettered jobs.
pub struct DlqRepository<'a> {
    store: &'a Store,
}

impl<'a> DlqRepository<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Remove a job from the active table and record it as dead.
    pub async fn admit(&self, job: &ClaimedJob, attempts: u32, failed_at: i64) -> Result<(), DbError> {
        let db = self.store.database();
        let content = DeadContent::new(job, attempts, failed_at, self.store.next_sequence());

        db.query(
            r#"
            BEGIN TRANSACTION;
            DELETE type::thing("job", $id);
            UPSERT type::thing("dlq", $id) CONTENT $content RETURN NONE;
            COMMIT TRANSACTION;
            "#,
        )
        .bind(("id", job.id.to_string()))
        .bind(("content", content))
        .await?
        .check()?;

        Ok(())
    }

    /// Get a dead job by ID, if present.
    pub async fn find(&self, id: &JobId) -> Result<Option<DeadJob>, DbError> {
        let db = self.store.database();

        let record: Option<DeadRecord> = db.select(("dlq", id.to_string())).await?;

        Ok(record.map(DeadRecord::into_dead_job))
    }

    /// List dead jobs, oldest failure first.
    pub async fn list(&self) -> Result<Vec<DeadJob>, DbError> {
        let db = self.store.database();

        let mut result = db
            .query("SELECT * FROM dlq ORDER BY dead_seq ASC")
            .await?;

        let records: Vec<DeadRecord> = result.take(0)?;

        Ok(records.into_iter().map(DeadRecord::into_dead_job).collect())
    }

    /// Re-admit a dead job as a fresh pending job with its full budget.
    ///
    /// The DLQ record is read by the same transaction that deletes it, so a
    /// concurrent delete or revive of the same id cannot both succeed.
    pub async fn revive(&self, id: &JobId) -> Result<Job, DbError> {
        let db = self.store.database();
        let seq = self.store.next_sequence();

        let mut result = db
            .query(
                r#"
                BEGIN TRANSACTION;
                LET $dead = (DELETE type::thing("dlq", $id) RETURN BEFORE);
                IF array::len($dead) > 0 {
                    UPSERT type::thing("job", $id) CONTENT {
                        command: $dead[0].command,
                        max_retries: $dead[0].max_retries,
                        attempts: 0,
                        state: "pending",
                        enqueued_at: $seq,
                        next_run: 0
                    } RETURN NONE;
                };
                RETURN $dead;
                COMMIT TRANSACTION;
                "#,
            )
            .bind(("id", id.to_string()))
            .bind(("seq", seq))
            .await?
            .check()?;

        let last = result.num_statements().saturating_sub(1);
        let records: Vec<DeadRecord> = result.take(last)?;
        let dead = records
            .into_iter()
            .next()
            .map(DeadRecord::into_dead_job)
            .ok_or_else(|| DbError::NotFound(format!("No DLQ job with id {}", id)))?;

        let mut job = dead.revive();
        job.enqueued_at = seq;
        Ok(job)
    }

    /// Permanently discard a dead job.
    pub async fn delete(&self, id: &JobId) -> Result<DeadJob, DbError> {
        let db = self.store.database();

        let mut result = db
            .query(r#"DELETE type::thing("dlq", $id) RETURN BEFORE"#)
            .bind(("id", id.to_string()))
            .await?;

        let records: Vec<DeadRecord> = result.take(0)?;

        records
            .into_iter()
            .next()
            .map(DeadRecord::into_dead_job)
            .ok_or_else(|| DbError::NotFound(format!("No DLQ job with id {}", id)))
    }

    /// Number of dead jobs.
    pub async fn count(&self) -> Result<u64, DbError> {
        let db = self.store.database();

        let mut result = db.query("SELECT count() AS count FROM dlq GROUP ALL").await?;
        let rows: Vec<CountRecord> = result.take(0)?;

        Ok(first_count(rows))
    }
}
