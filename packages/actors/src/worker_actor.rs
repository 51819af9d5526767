//! Worker actor for executing jobs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use db::{DbError, Store};
use queue_core::{ClaimedJob, ExecOutcome, JobEvent, Transition};
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::executor::Executor;
use crate::messages::WorkerMessage;

/// State for the worker actor.
pub struct WorkerActorState {
    /// Unique worker ID.
    pub worker_id: String,
    /// Shared store handle.
    store: Store,
    /// Runs claimed commands.
    executor: Arc<dyn Executor>,
    /// Pool-wide stop request.
    stop: CancellationToken,
    /// Idle wait between empty polls.
    poll_interval: Duration,
    /// Event broadcaster.
    event_tx: Option<broadcast::Sender<JobEvent>>,
    /// Jobs finished by this worker.
    processed: u64,
}

impl WorkerActorState {
    /// Broadcast an event.
    fn broadcast(&self, event: JobEvent) {
        tracing::trace!("{}", event.description());
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// Claim and run at most one job. Returns whether a job was processed.
    async fn poll_once(&mut self) -> Result<bool, DbError> {
        let Some(job) = self.store.claim(Utc::now().timestamp()).await? else {
            return Ok(false);
        };

        tracing::info!(
            "Worker {} running job {}: {}",
            self.worker_id,
            job.id,
            job.command
        );
        self.broadcast(JobEvent::JobClaimed {
            job_id: job.id.clone(),
            worker_id: self.worker_id.clone(),
            timestamp: Utc::now(),
        });

        let started = Instant::now();
        let outcome = self.executor.execute(&job).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if !outcome.is_success() {
            tracing::warn!("Job {} failed - exit code {:?}", job.id, outcome.exit_code);
        }

        let transition = self
            .store
            .settle(&job, outcome, Utc::now().timestamp())
            .await?;
        self.processed += 1;
        tracing::debug!("Job {} settled: {}", job.id, transition.as_str());
        self.report(&job, outcome, transition, duration_ms);

        Ok(true)
    }

    fn report(
        &self,
        job: &ClaimedJob,
        outcome: ExecOutcome,
        transition: Transition,
        duration_ms: u64,
    ) {
        let timestamp = Utc::now();
        let event = match transition {
            Transition::Complete => JobEvent::JobCompleted {
                job_id: job.id.clone(),
                worker_id: self.worker_id.clone(),
                duration_ms,
                timestamp,
            },
            Transition::Retry {
                attempts, next_run, ..
            } => JobEvent::JobRetryScheduled {
                job_id: job.id.clone(),
                attempts,
                exit_code: outcome.exit_code,
                next_run,
                timestamp,
            },
            Transition::DeadLetter { attempts } => JobEvent::JobDeadLettered {
                job_id: job.id.clone(),
                attempts,
                exit_code: outcome.exit_code,
                timestamp,
            },
        };
        self.broadcast(event);
    }

    /// Sleep for the poll interval, waking early if a stop is requested.
    async fn idle(&self) {
        tokio::select! {
            _ = tokio::time::sleep(self.poll_interval) => {}
            _ = self.stop.cancelled() => {}
        }
    }
}

/// Worker actor arguments.
pub struct WorkerArgs {
    pub worker_id: String,
    pub store: Store,
    pub executor: Arc<dyn Executor>,
    pub stop: CancellationToken,
    pub poll_interval: Duration,
    pub event_tx: Option<broadcast::Sender<JobEvent>>,
}

/// Worker actor that repeatedly claims, executes and settles jobs.
///
/// The loop is driven by `Poll` messages the worker sends to itself, so a
/// job in flight always finishes before the stop signal is looked at.
pub struct WorkerActor;

impl Actor for WorkerActor {
    type Msg = WorkerMessage;
    type State = WorkerActorState;
    type Arguments = WorkerArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Worker {} ready", args.worker_id);

        let state = WorkerActorState {
            worker_id: args.worker_id,
            store: args.store,
            executor: args.executor,
            stop: args.stop,
            poll_interval: args.poll_interval,
            event_tx: args.event_tx,
            processed: 0,
        };

        state.broadcast(JobEvent::WorkerStarted {
            worker_id: state.worker_id.clone(),
            timestamp: Utc::now(),
        });

        // Start the work loop
        myself.send_message(WorkerMessage::Poll)?;

        Ok(state)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WorkerMessage::Poll => {
                if state.stop.is_cancelled() {
                    tracing::info!(
                        "Worker {} stop requested; exiting after current job",
                        state.worker_id
                    );
                    myself.stop(None);
                    return Ok(());
                }

                match state.poll_once().await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::trace!("Worker {} found no eligible job", state.worker_id);
                        state.idle().await;
                    }
                    Err(e) => {
                        tracing::error!("Worker {} store error: {}", state.worker_id, e);
                        state.idle().await;
                    }
                }

                myself.send_message(WorkerMessage::Poll)?;
            }
        }

        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        tracing::info!(
            "Worker {} exiting ({} jobs processed)",
            state.worker_id,
            state.processed
        );
        state.broadcast(JobEvent::WorkerStopped {
            worker_id: state.worker_id.clone(),
            timestamp: Utc::now(),
        });
        Ok(())
    }
}
