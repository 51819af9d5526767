use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use engine::{DbConfig, EngineConfig, JobQueue, QueueError};

static NEXT_DB: AtomicUsize = AtomicUsize::new(0);

/// Open an isolated in-memory queue with a short poll interval.
pub async fn open_queue() -> Result<JobQueue, QueueError> {
    let n = NEXT_DB.fetch_add(1, Ordering::SeqCst);
    let db = DbConfig::memory().with_database(format!("engine_{}_{}", std::process::id(), n));
    let config = EngineConfig::memory()
        .with_db(db)
        .with_poll_interval(Duration::from_millis(25));
    JobQueue::open(config).await
}
