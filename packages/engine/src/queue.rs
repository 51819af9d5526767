//! The `JobQueue` facade: submission, inspection, DLQ handling and workers.

use std::collections::HashMap;
use std::sync::Arc;

use actors::{Executor, ShellExecutor, WorkerPool};
use chrono::Utc;
use db::Store;
use queue_core::{ConfigKey, DeadJob, Job, JobEvent, JobId, JobState, QueueStatus, Submission};
use tokio::sync::broadcast;

use crate::{EngineConfig, QueueError};

const EVENT_CAPACITY: usize = 1024;

/// Handle to a persistent job queue.
///
/// Cloning is cheap; clones share the store handle (and its claim lock)
/// and the event channel.
#[derive(Clone)]
pub struct JobQueue {
    store: Store,
    config: EngineConfig,
    events: broadcast::Sender<JobEvent>,
}

impl JobQueue {
    /// Connect to the store, initialize the schema and seed config defaults.
    pub async fn open(config: EngineConfig) -> Result<Self, QueueError> {
        tracing::info!("Opening job queue at {}", config.db.endpoint);
        let store = Store::open(&config.db).await?;
        Ok(Self::with_store(store, config))
    }

    /// Wrap an already opened store.
    pub fn with_store(store: Store, config: EngineConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            config,
            events,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Subscribe to job and worker events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: JobEvent) {
        let _ = self.events.send(event);
    }

    /// Submit a JSON payload: `{"id": ..., "command": ..., "max_retries"?: ...}`.
    pub async fn submit(&self, payload: &str) -> Result<Job, QueueError> {
        let submission = Submission::parse(payload)?;
        self.submit_job(submission).await
    }

    /// Submit a job, overwriting any job with the same id.
    pub async fn submit_job(&self, submission: Submission) -> Result<Job, QueueError> {
        submission.validate()?;

        let max_retries = match submission.max_retries {
            Some(max_retries) => max_retries,
            None => self.store.config().default_max_retries().await?,
        };

        let job = self
            .store
            .jobs()
            .upsert(&submission.id, &submission.command, max_retries)
            .await?;

        tracing::info!(
            "Enqueued job {}: {} (max_retries={})",
            job.id,
            job.command,
            job.max_retries
        );
        self.emit(JobEvent::JobEnqueued {
            job_id: job.id.clone(),
            timestamp: Utc::now(),
        });

        Ok(job)
    }

    /// Point-in-time counts of ready, delayed, processing and dead jobs.
    pub async fn status(&self, now: i64) -> Result<QueueStatus, QueueError> {
        Ok(self.store.status(now).await?)
    }

    pub async fn count_by_state(&self) -> Result<HashMap<JobState, u64>, QueueError> {
        Ok(self.store.jobs().count_by_state().await?)
    }

    /// Active jobs, oldest submission first.
    pub async fn list_jobs(&self) -> Result<Vec<Job>, QueueError> {
        Ok(self.store.jobs().list().await?)
    }

    pub async fn list_jobs_in_state(&self, state: JobState) -> Result<Vec<Job>, QueueError> {
        Ok(self.store.jobs().list_by_state(state).await?)
    }

    /// Dead-lettered jobs, oldest failure first.
    pub async fn list_dead(&self) -> Result<Vec<DeadJob>, QueueError> {
        Ok(self.store.dlq().list().await?)
    }

    /// Re-admit a dead job as pending with a full budget.
    pub async fn retry_dead(&self, id: &JobId) -> Result<Job, QueueError> {
        let job = self.store.dlq().revive(id).await?;

        tracing::info!("Job {} revived from DLQ", id);
        self.emit(JobEvent::JobRevived {
            job_id: id.clone(),
            timestamp: Utc::now(),
        });

        Ok(job)
    }

    /// Permanently discard a dead job.
    pub async fn delete_dead(&self, id: &JobId) -> Result<DeadJob, QueueError> {
        let dead = self.store.dlq().delete(id).await?;

        tracing::info!("Job {} deleted from DLQ", id);
        self.emit(JobEvent::DeadJobDeleted {
            job_id: id.clone(),
            timestamp: Utc::now(),
        });

        Ok(dead)
    }

    pub async fn get_config(&self, key: &str) -> Result<Option<String>, QueueError> {
        Ok(self.store.config().get(key).await?)
    }

    /// Set a config value. Takes effect on the next submission or failure.
    ///
    /// Known keys must hold non-negative integers; other keys are stored as is.
    pub async fn set_config(&self, key: &str, value: &str) -> Result<(), QueueError> {
        if key.trim().is_empty() {
            return Err(QueueError::InvalidConfig(
                "config key must not be empty".to_string(),
            ));
        }
        if let Some(known) = ConfigKey::parse(key) {
            if value.trim().parse::<u64>().is_err() {
                return Err(QueueError::InvalidConfig(format!(
                    "{} must be a non-negative integer, got {:?}",
                    known, value
                )));
            }
        }
        Ok(self.store.config().set(key, value.trim()).await?)
    }

    /// Start `count` workers that run commands through the platform shell.
    pub async fn start_workers(&self, count: usize) -> Result<WorkerPool, QueueError> {
        self.start_workers_with(count, Arc::new(ShellExecutor::default()))
            .await
    }

    /// Start `count` workers with a custom executor.
    pub async fn start_workers_with(
        &self,
        count: usize,
        executor: Arc<dyn Executor>,
    ) -> Result<WorkerPool, QueueError> {
        let pool = WorkerPool::start(
            self.config.pool(count),
            self.store.clone(),
            executor,
            self.events.clone(),
        )
        .await?;
        Ok(pool)
    }

    /// Start the configured number of shell workers.
    pub async fn start_default_workers(&self) -> Result<WorkerPool, QueueError> {
        self.start_workers(self.config.workers).await
    }
}
