//! The durable store handle: claim protocol and outcome settlement.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;
use queue_core::{ClaimedJob, ExecOutcome, QueueStatus, Transition, next_transition};
use tokio::sync::Mutex;

use crate::records::{CountRecord, JobRecord, first_count};
use crate::repositories::{ConfigRepository, DlqRepository, JobRepository};
use crate::{Database, DbConfig, DbError, connect, init_schema};

/// Tries for a settle write before a contended transaction is reported.
const SETTLE_ATTEMPTS: u32 = 3;
const SETTLE_BACKOFF: Duration = Duration::from_millis(25);

/// Handle to the job store.
///
/// Cloning is cheap and every clone shares the same connection, claim
/// lock and enqueue sequence, so all workers in a process should use
/// clones of one handle.
#[derive(Clone)]
pub struct Store {
    db: Database,
    /// Serializes claims between workers of this process.
    claim_lock: Arc<Mutex<()>>,
    /// Last `enqueued_at` handed out, microseconds since the epoch.
    sequence: Arc<AtomicI64>,
}

impl Store {
    /// Connect, initialize the schema and seed config defaults.
    pub async fn open(config: &DbConfig) -> Result<Self, DbError> {
        let db = connect(config).await?;
        Self::from_database(db).await
    }

    /// Wrap an existing connection, initializing the schema on it.
    pub async fn from_database(db: Database) -> Result<Self, DbError> {
        init_schema(&db).await?;
        Ok(Self {
            db,
            claim_lock: Arc::new(Mutex::new(())),
            sequence: Arc::new(AtomicI64::new(0)),
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn jobs(&self) -> JobRepository<'_> {
        JobRepository::new(self)
    }

    pub fn dlq(&self) -> DlqRepository<'_> {
        DlqRepository::new(self)
    }

    pub fn config(&self) -> ConfigRepository<'_> {
        ConfigRepository::new(self)
    }

    /// Next ordering key: wall-clock microseconds, strictly increasing
    /// for this handle even when the clock stalls or steps back.
    pub(crate) fn next_sequence(&self) -> i64 {
        let now = Utc::now().timestamp_micros();
        let previous = self
            .sequence
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now.max(previous.saturating_add(1))
    }

    /// Claim the oldest eligible pending job and mark it `processing`.
    ///
    /// Returns `Ok(None)` when nothing is eligible or when the claim lost a
    /// race against a concurrent transaction; callers poll again later.
    pub async fn claim(&self, now: i64) -> Result<Option<ClaimedJob>, DbError> {
        let _guard = self.claim_lock.lock().await;

        match self.try_claim(now).await {
            Ok(claimed) => Ok(claimed),
            Err(e) if e.is_contention() => {
                tracing::debug!("Claim contended, will retry on next poll: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn try_claim(&self, now: i64) -> Result<Option<ClaimedJob>, DbError> {
        let mut result = self
            .db
            .query(
                r#"
                SELECT * FROM job
                WHERE state = "pending" AND next_run <= $now
                ORDER BY enqueued_at ASC
                LIMIT 1
                "#,
            )
            .bind(("now", now))
            .await?;

        let candidates: Vec<JobRecord> = result.take(0)?;
        let Some(candidate) = candidates.into_iter().next() else {
            return Ok(None);
        };
        let job_id = candidate.into_job().id;

        // Compare-and-set: only one claimer can flip pending -> processing,
        // even across processes sharing the store.
        let mut result = self
            .db
            .query(
                r#"
                UPDATE type::thing("job", $id)
                SET state = "processing"
                WHERE state = "pending"
                RETURN AFTER
                "#,
            )
            .bind(("id", job_id.to_string()))
            .await?;

        let claimed: Vec<JobRecord> = result.take(0)?;
        match claimed.into_iter().next() {
            Some(record) => {
                let job = ClaimedJob::from(record.into_job());
                tracing::debug!("Claimed job {} (attempts={})", job.id, job.attempts);
                Ok(Some(job))
            }
            None => {
                tracing::debug!("Job {} was claimed elsewhere first", job_id);
                Ok(None)
            }
        }
    }

    /// Apply the retry/backoff state machine to a finished execution.
    ///
    /// `backoff_base` is read from config at decision time, so live tuning
    /// affects the very next failure. A write that hits a conflicting
    /// transaction is retried a few times; otherwise the job would be left
    /// `processing` until an operator unsticks it.
    pub async fn settle(
        &self,
        job: &ClaimedJob,
        outcome: ExecOutcome,
        now: i64,
    ) -> Result<Transition, DbError> {
        let backoff_base = if outcome.is_success() {
            0
        } else {
            self.config().backoff_base().await?
        };

        let transition = next_transition(job.attempts, job.max_retries, outcome, backoff_base, now);
        retry_contended("settle", || self.apply(job, transition, now)).await?;

        Ok(transition)
    }

    async fn apply(
        &self,
        job: &ClaimedJob,
        transition: Transition,
        now: i64,
    ) -> Result<(), DbError> {
        match transition {
            Transition::Complete => {
                self.jobs().delete(&job.id).await?;
                tracing::info!("Job {} completed successfully", job.id);
            }
            Transition::Retry {
                attempts,
                delay_secs,
                next_run,
            } => {
                self.jobs().reschedule(&job.id, attempts, next_run).await?;
                tracing::warn!(
                    "Job {} scheduled to retry in {}s (attempts={})",
                    job.id,
                    delay_secs,
                    attempts
                );
            }
            Transition::DeadLetter { attempts } => {
                self.dlq().admit(job, attempts, now).await?;
                tracing::warn!("Job {} moved to DLQ (attempts={})", job.id, attempts);
            }
        }

        Ok(())
    }

    /// Counts of ready, delayed, processing and dead jobs at `now`.
    pub async fn status(&self, now: i64) -> Result<QueueStatus, DbError> {
        let mut result = self
            .db
            .query(
                r#"
                SELECT count() AS count FROM job WHERE state = "pending" AND next_run <= $now GROUP ALL;
                SELECT count() AS count FROM job WHERE state = "pending" AND next_run > $now GROUP ALL;
                SELECT count() AS count FROM job WHERE state = "processing" GROUP ALL;
                SELECT count() AS count FROM dlq GROUP ALL;
                "#,
            )
            .bind(("now", now))
            .await?;

        let ready: Vec<CountRecord> = result.take(0)?;
        let delayed: Vec<CountRecord> = result.take(1)?;
        let processing: Vec<CountRecord> = result.take(2)?;
        let dead: Vec<CountRecord> = result.take(3)?;

        Ok(QueueStatus {
            ready: first_count(ready),
            delayed: first_count(delayed),
            processing: first_count(processing),
            dead: first_count(dead),
        })
    }
}

/// Run `op`, retrying with a short linear backoff while it fails on
/// transaction contention.
async fn retry_contended<T, F, Fut>(what: &str, mut op: F) -> Result<T, DbError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_contention() && attempt < SETTLE_ATTEMPTS => {
                tracing::debug!("{} contended (attempt {}), retrying: {}", what, attempt, e);
                tokio::time::sleep(SETTLE_BACKOFF * attempt).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
