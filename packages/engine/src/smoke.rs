//! Built-in end-to-end scenario for checking a deployment.

use std::time::Duration;

use queue_core::{DeadJob, JobId, Submission};

use crate::{JobQueue, QueueError};

pub const SMOKE_OK_ID: &str = "job1";
pub const SMOKE_FAIL_ID: &str = "job2";

impl JobQueue {
    /// Submit one succeeding and one always-failing job, run two workers
    /// until both are terminal, and return the dead-letter listing.
    ///
    /// With the default config the failing job needs about six seconds of
    /// backoff before it is dead-lettered. Gives up after `timeout`.
    pub async fn smoke_test(&self, timeout: Duration) -> Result<Vec<DeadJob>, QueueError> {
        let ok_id = JobId::from(SMOKE_OK_ID);
        let fail_id = JobId::from(SMOKE_FAIL_ID);

        self.submit_job(Submission::new(ok_id.clone(), "echo smoke-ok").with_max_retries(3))
            .await?;
        self.submit_job(Submission::new(fail_id.clone(), "exit 1").with_max_retries(2))
            .await?;

        let pool = self.start_workers(2).await?;
        let poll_interval = self.config().poll_interval;

        let waited = tokio::time::timeout(timeout, async {
            loop {
                let ok_active = self.store().jobs().find(&ok_id).await?.is_some();
                let fail_active = self.store().jobs().find(&fail_id).await?.is_some();
                if !ok_active && !fail_active {
                    return Ok::<(), QueueError>(());
                }
                tokio::time::sleep(poll_interval).await;
            }
        })
        .await;

        pool.shutdown().await?;

        match waited {
            Ok(result) => result?,
            Err(_) => {
                return Err(QueueError::Worker(format!(
                    "smoke test did not finish within {:?}",
                    timeout
                )));
            }
        }

        let dead = self.list_dead().await?;
        tracing::info!("Smoke test finished with {} job(s) in DLQ", dead.len());
        Ok(dead)
    }
}
