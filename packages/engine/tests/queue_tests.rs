#![allow(clippy::disallowed_methods)]

mod common;

use std::error::Error;

use engine::{JobEvent, JobId, JobState, QueueError, Submission};

const NOW: i64 = 1_700_000_000;

#[tokio::test]
async fn submit_uses_payload_or_configured_budget() -> Result<(), Box<dyn Error>> {
    let queue = common::open_queue().await?;

    let explicit = queue
        .submit(r#"{"id":"a","command":"echo a","max_retries":7}"#)
        .await?;
    assert_eq!(explicit.max_retries, 7);

    let defaulted = queue.submit(r#"{"id":"b","command":"echo b"}"#).await?;
    assert_eq!(defaulted.max_retries, 3);

    queue.set_config("max_retries", "5").await?;
    let tuned = queue.submit(r#"{"id":"c","command":"echo c"}"#).await?;
    assert_eq!(tuned.max_retries, 5);

    let jobs = queue.list_jobs().await?;
    let ids: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    Ok(())
}

#[tokio::test]
async fn invalid_payloads_never_reach_the_store() -> Result<(), Box<dyn Error>> {
    let queue = common::open_queue().await?;

    for payload in [
        "not json",
        r#"{"command":"true"}"#,
        r#"{"id":"x"}"#,
        r#"{"id":"","command":"true"}"#,
        r#"{"id":"x","command":"true","max_retries":-1}"#,
    ] {
        let result = queue.submit(payload).await;
        assert!(
            matches!(result, Err(QueueError::InvalidSubmission(_))),
            "{payload} should be rejected"
        );
    }

    assert!(queue.list_jobs().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn resubmission_is_an_upsert() -> Result<(), Box<dyn Error>> {
    let queue = common::open_queue().await?;

    queue.submit_job(Submission::new("x", "echo one")).await?;
    queue.submit_job(Submission::new("x", "echo two")).await?;

    let jobs = queue.list_jobs().await?;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].command, "echo two");
    Ok(())
}

#[tokio::test]
async fn status_and_state_listings() -> Result<(), Box<dyn Error>> {
    let queue = common::open_queue().await?;
    queue.set_config("backoff_base", "10").await?;

    queue.submit_job(Submission::new("ready", "true")).await?;
    queue.submit_job(Submission::new("busy", "true")).await?;
    queue.submit_job(Submission::new("later", "false").with_max_retries(1)).await?;
    queue.submit_job(Submission::new("dead", "false").with_max_retries(0)).await?;

    let store = queue.store();
    // Claims go oldest first: "ready" is left pending, the others are claimed
    let mut claimed = Vec::new();
    for _ in 0..4 {
        claimed.push(store.claim(NOW).await?.ok_or("expected a job")?);
    }
    let ready = claimed.remove(0);
    store.jobs().force_reset(&ready.id, &ready.command).await?;
    for job in &claimed {
        match job.id.as_str() {
            "later" | "dead" => {
                store
                    .settle(job, engine::ExecOutcome::failure(Some(1)), NOW)
                    .await?;
            }
            _ => {}
        }
    }

    let status = queue.status(NOW).await?;
    assert_eq!(status.ready, 1);
    assert_eq!(status.delayed, 1);
    assert_eq!(status.processing, 1);
    assert_eq!(status.dead, 1);
    assert_eq!(
        status.to_string(),
        "pending_ready=1 delayed=1 processing=1 | DLQ=1"
    );

    let counts = queue.count_by_state().await?;
    assert_eq!(counts.get(&JobState::Pending), Some(&2));
    assert_eq!(counts.get(&JobState::Processing), Some(&1));

    let processing = queue.list_jobs_in_state(JobState::Processing).await?;
    assert_eq!(processing.len(), 1);
    assert_eq!(processing[0].id.as_str(), "busy");
    Ok(())
}

#[tokio::test]
async fn dead_jobs_can_be_retried_or_deleted() -> Result<(), Box<dyn Error>> {
    let queue = common::open_queue().await?;
    let store = queue.store();

    for id in ["y", "z"] {
        queue
            .submit_job(Submission::new(id, "false").with_max_retries(0))
            .await?;
        let job = store.claim(NOW).await?.ok_or("expected a job")?;
        store
            .settle(&job, engine::ExecOutcome::failure(Some(1)), NOW)
            .await?;
    }
    assert_eq!(queue.list_dead().await?.len(), 2);

    let mut events = queue.subscribe();

    let revived = queue.retry_dead(&JobId::from("y")).await?;
    assert_eq!(revived.state, JobState::Pending);
    assert_eq!(revived.attempts, 0);
    assert_eq!(revived.next_run, 0);

    let deleted = queue.delete_dead(&JobId::from("z")).await?;
    assert_eq!(deleted.attempts, 1);

    assert!(queue.list_dead().await?.is_empty());
    assert_eq!(queue.list_jobs().await?.len(), 1);

    assert!(matches!(events.try_recv()?, JobEvent::JobRevived { .. }));
    assert!(matches!(events.try_recv()?, JobEvent::DeadJobDeleted { .. }));

    let missing = queue.retry_dead(&JobId::from("nope")).await;
    assert!(matches!(missing, Err(QueueError::NotFound(_))));
    let missing = queue.delete_dead(&JobId::from("nope")).await;
    assert!(matches!(missing, Err(QueueError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn unstick_resets_a_stuck_job() -> Result<(), Box<dyn Error>> {
    let queue = common::open_queue().await?;
    queue
        .submit_job(Submission::new("stuck", "sleep 1000").with_max_retries(4))
        .await?;
    queue.store().claim(NOW).await?.ok_or("expected a job")?;

    let job = queue.unstick(&JobId::from("stuck"), "echo fixed").await?;
    assert_eq!(job.command, "echo fixed");
    assert_eq!(job.state, JobState::Pending);
    assert_eq!(job.attempts, 0);
    assert_eq!(job.next_run, 0);
    assert_eq!(job.max_retries, 4);

    let missing = queue.unstick(&JobId::from("nope"), "true").await;
    assert!(matches!(missing, Err(QueueError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn config_round_trip() -> Result<(), Box<dyn Error>> {
    let queue = common::open_queue().await?;

    assert_eq!(queue.get_config("backoff_base").await?.as_deref(), Some("2"));
    queue.set_config("backoff_base", "3").await?;
    assert_eq!(queue.get_config("backoff_base").await?.as_deref(), Some("3"));
    assert_eq!(queue.get_config("unknown").await?, None);

    let empty = queue.set_config(" ", "1").await;
    assert!(matches!(empty, Err(QueueError::InvalidConfig(_))));
    let bad = queue.set_config("backoff_base", "fast").await;
    assert!(matches!(bad, Err(QueueError::InvalidConfig(_))));
    assert_eq!(queue.get_config("backoff_base").await?.as_deref(), Some("3"));

    queue.set_config("owner", "ops team").await?;
    assert_eq!(queue.get_config("owner").await?.as_deref(), Some("ops team"));
    Ok(())
}

#[tokio::test]
async fn zero_workers_is_a_worker_error() -> Result<(), Box<dyn Error>> {
    let queue = common::open_queue().await?;
    let result = queue.start_workers(0).await;
    assert!(matches!(result, Err(QueueError::Worker(_))));
    Ok(())
}
