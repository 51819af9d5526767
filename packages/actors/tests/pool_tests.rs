//! Worker pool tests against an in-memory store.

mod common;

use std::error::Error;
use std::time::Duration;

use actors::{PoolConfig, PoolError, WorkerPool};
use queue_core::{JobEvent, JobId, JobState};
use tokio::sync::broadcast;

fn fast(workers: usize) -> PoolConfig {
    PoolConfig::new(workers).with_poll_interval(Duration::from_millis(20))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pool_drains_all_jobs() -> Result<(), Box<dyn Error>> {
    let store = common::open_store().await?;
    for n in 0..6 {
        store
            .jobs()
            .upsert(&JobId::new(format!("job-{}", n)), "ok", 3)
            .await?;
    }

    let (events, mut rx) = broadcast::channel(256);
    let pool = WorkerPool::start(fast(2), store.clone(), common::scripted(), events).await?;

    assert!(common::wait_until_drained(&store, Duration::from_secs(10)).await);
    pool.shutdown().await?;

    let mut completed = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, JobEvent::JobCompleted { .. }) {
            completed += 1;
        }
    }
    assert_eq!(completed, 6);
    assert!(store.jobs().list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn zero_workers_is_rejected() -> Result<(), Box<dyn Error>> {
    let store = common::open_store().await?;
    let (events, _rx) = broadcast::channel(16);

    let result = WorkerPool::start(fast(0), store, common::scripted(), events).await;

    assert!(matches!(result, Err(PoolError::NoWorkers)));
    Ok(())
}

#[tokio::test]
async fn cancelling_the_stop_token_wakes_idle_workers() -> Result<(), Box<dyn Error>> {
    let store = common::open_store().await?;
    let (events, _rx) = broadcast::channel(16);
    let config = PoolConfig::new(3).with_poll_interval(Duration::from_secs(60));

    let pool = WorkerPool::start(config, store, common::scripted(), events).await?;
    // Let every worker find the queue empty and start its long idle wait.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let token = pool.stop_token();
    token.cancel();

    tokio::time::timeout(Duration::from_secs(5), pool.join()).await??;
    assert!(token.is_cancelled());
    Ok(())
}

#[tokio::test]
async fn reports_live_workers() -> Result<(), Box<dyn Error>> {
    let store = common::open_store().await?;
    let (events, _rx) = broadcast::channel(16);

    let pool = WorkerPool::start(fast(3), store, common::scripted(), events).await?;

    assert_eq!(pool.live_workers().await?, 3);
    pool.shutdown().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_lets_the_current_job_finish() -> Result<(), Box<dyn Error>> {
    let store = common::open_store().await?;
    store.jobs().upsert(&"first".into(), "slow", 0).await?;
    store.jobs().upsert(&"second".into(), "slow", 0).await?;

    let (events, mut rx) = broadcast::channel(64);
    let pool = WorkerPool::start(
        fast(1),
        store.clone(),
        common::slow(Duration::from_millis(300)),
        events,
    )
    .await?;

    // Wait until the first job is in flight, then ask the pool to stop
    let claimed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(JobEvent::JobClaimed { job_id, .. }) = rx.recv().await {
                return job_id;
            }
        }
    })
    .await?;
    assert_eq!(claimed.as_str(), "first");

    pool.stop();
    pool.join().await?;

    assert!(store.jobs().find(&"first".into()).await?.is_none());
    let second = store.jobs().get(&"second".into()).await?;
    assert_eq!(second.state, JobState::Pending);
    assert_eq!(second.attempts, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_job_without_budget_is_dead_lettered() -> Result<(), Box<dyn Error>> {
    let store = common::open_store().await?;
    store.jobs().upsert(&"doomed".into(), "fail", 0).await?;

    let (events, mut rx) = broadcast::channel(64);
    let pool = WorkerPool::start(fast(1), store.clone(), common::scripted(), events).await?;

    assert!(common::wait_until_drained(&store, Duration::from_secs(5)).await);
    pool.shutdown().await?;

    let dead = store.dlq().list().await?;
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].attempts, 1);

    let mut saw_dead_letter = false;
    let mut saw_stopped = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            JobEvent::JobDeadLettered { exit_code, .. } => {
                assert_eq!(exit_code, Some(1));
                saw_dead_letter = true;
            }
            JobEvent::WorkerStopped { .. } => saw_stopped = true,
            _ => {}
        }
    }
    assert!(saw_dead_letter);
    assert!(saw_stopped);
    Ok(())
}
