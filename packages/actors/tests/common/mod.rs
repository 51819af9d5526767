use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use actors::{ExecFuture, FnExecutor};
use db::{DbConfig, DbError, Store};
use queue_core::{ClaimedJob, ExecOutcome};

static NEXT_DB: AtomicUsize = AtomicUsize::new(0);

/// Open an isolated in-memory store for one test.
pub async fn open_store() -> Result<Store, DbError> {
    let n = NEXT_DB.fetch_add(1, Ordering::SeqCst);
    let config = DbConfig::memory().with_database(format!("pool_{}_{}", std::process::id(), n));
    Store::open(&config).await
}

/// Executor that succeeds for the command "ok" and fails with code 1 otherwise.
pub fn scripted() -> Arc<FnExecutor<impl Fn(&ClaimedJob) -> ExecFuture + Send + Sync + 'static>> {
    Arc::new(FnExecutor::new(|job: &ClaimedJob| -> ExecFuture {
        let ok = job.command == "ok";
        Box::pin(async move {
            if ok {
                ExecOutcome::success()
            } else {
                ExecOutcome::failure(Some(1))
            }
        })
    }))
}

/// Executor that takes `delay` to succeed.
pub fn slow(delay: Duration) -> Arc<FnExecutor<impl Fn(&ClaimedJob) -> ExecFuture + Send + Sync + 'static>> {
    Arc::new(FnExecutor::new(move |_job: &ClaimedJob| -> ExecFuture {
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            ExecOutcome::success()
        })
    }))
}

/// Poll the store until no job is ready, delayed or processing.
pub async fn wait_until_drained(store: &Store, limit: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        let status = store
            .status(chrono::Utc::now().timestamp())
            .await
            .expect("status");
        if status.is_drained() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}
