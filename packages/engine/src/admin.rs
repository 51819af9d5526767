//! Operator-only repair operations.
//!
//! These edit persisted state directly and bypass submission validation.
//! They are privileged: expose them only to operators, never to job
//! submitters.

use chrono::Utc;
use queue_core::{DeadJob, Job, JobEvent, JobId};

use crate::{JobQueue, QueueError};

impl JobQueue {
    /// Force an active job back to pending with a new command, zero
    /// attempts and no delay, whatever state it is in.
    ///
    /// Meant for jobs left `processing` after a worker crashed. Running
    /// this on a job that is really in flight lets it be claimed twice.
    pub async fn unstick(&self, id: &JobId, command: &str) -> Result<Job, QueueError> {
        let job = self.store().jobs().force_reset(id, command).await?;

        tracing::warn!("Operator reset job {} to pending: {}", id, command);
        self.emit(JobEvent::JobReset {
            job_id: id.clone(),
            timestamp: Utc::now(),
        });

        Ok(job)
    }

    /// Remove a dead-lettered job.
    pub async fn purge_dead(&self, id: &JobId) -> Result<DeadJob, QueueError> {
        self.delete_dead(id).await
    }
}
