//! Pool supervisor and the `WorkerPool` handle used to run workers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use db::Store;
use queue_core::JobEvent;
use ractor::{Actor, ActorCell, ActorId, ActorProcessingErr, ActorRef, SupervisionEvent};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::executor::Executor;
use crate::messages::{PoolMessage, WorkerMessage};
use crate::worker_actor::{WorkerActor, WorkerArgs};

/// Worker pool errors.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Worker count must be at least 1")]
    NoWorkers,

    #[error("Failed to spawn worker pool: {0}")]
    Spawn(#[from] ractor::SpawnErr),

    #[error("Worker pool task failed: {0}")]
    Join(String),

    #[error("Worker pool is not running")]
    Unavailable,
}

/// How many workers to run and how long idle workers wait between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub workers: usize,
    pub poll_interval: Duration,
}

impl PoolConfig {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Arguments for the pool supervisor.
pub struct PoolArgs {
    pub config: PoolConfig,
    pub store: Store,
    pub executor: Arc<dyn Executor>,
    pub stop: CancellationToken,
    pub event_tx: broadcast::Sender<JobEvent>,
}

/// State for the pool supervisor.
pub struct PoolState {
    args: PoolArgs,
    /// Live workers by actor ID.
    workers: HashMap<ActorId, String>,
}

impl PoolState {
    fn worker_args(&self, worker_id: String) -> WorkerArgs {
        WorkerArgs {
            worker_id,
            store: self.args.store.clone(),
            executor: self.args.executor.clone(),
            stop: self.args.stop.child_token(),
            poll_interval: self.args.config.poll_interval,
            event_tx: Some(self.args.event_tx.clone()),
        }
    }

    async fn spawn_worker(
        &mut self,
        supervisor: ActorCell,
        worker_id: String,
    ) -> Result<ActorRef<WorkerMessage>, ActorProcessingErr> {
        let args = self.worker_args(worker_id.clone());
        let (worker, _handle) = Actor::spawn_linked(None, WorkerActor, args, supervisor)
            .await
            .map_err(|e| {
                ActorProcessingErr::from(format!("Failed to spawn {}: {}", worker_id, e))
            })?;

        self.workers.insert(worker.get_id(), worker_id);
        Ok(worker)
    }
}

/// Supervisor that owns the workers of one pool.
///
/// It stops itself once its last worker has exited, so awaiting its join
/// handle waits for the whole pool. A worker that fails is replaced unless
/// a stop has been requested.
pub struct PoolSupervisor;

impl Actor for PoolSupervisor {
    type Msg = PoolMessage;
    type State = PoolState;
    type Arguments = PoolArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting {} worker(s)", args.config.workers);

        let workers = args.config.workers;
        let mut state = PoolState {
            args,
            workers: HashMap::new(),
        };

        for n in 1..=workers {
            state
                .spawn_worker(myself.get_cell(), format!("worker-{}", n))
                .await?;
        }

        Ok(state)
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            PoolMessage::LiveWorkers { reply } => {
                let _ = reply.send(state.workers.len());
            }
        }
        Ok(())
    }

    async fn handle_supervisor_evt(
        &self,
        myself: ActorRef<Self::Msg>,
        message: SupervisionEvent,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SupervisionEvent::ActorTerminated(cell, _, reason) => {
                if let Some(worker_id) = state.workers.remove(&cell.get_id()) {
                    tracing::debug!("Worker {} terminated: {:?}", worker_id, reason);
                }
            }
            SupervisionEvent::ActorFailed(cell, err) => {
                if let Some(worker_id) = state.workers.remove(&cell.get_id()) {
                    tracing::error!("Worker {} failed: {}", worker_id, err);
                    if !state.args.stop.is_cancelled() {
                        tracing::info!("Restarting worker {}", worker_id);
                        state.spawn_worker(myself.get_cell(), worker_id).await?;
                    }
                }
            }
            _ => {}
        }

        if state.workers.is_empty() {
            tracing::info!("All workers exited");
            myself.stop(None);
        }

        Ok(())
    }
}

/// Handle to a running pool of workers.
pub struct WorkerPool {
    supervisor: ActorRef<PoolMessage>,
    handle: JoinHandle<()>,
    stop: CancellationToken,
    events: broadcast::Sender<JobEvent>,
}

impl WorkerPool {
    /// Spawn `config.workers` workers sharing one store handle.
    pub async fn start(
        config: PoolConfig,
        store: Store,
        executor: Arc<dyn Executor>,
        events: broadcast::Sender<JobEvent>,
    ) -> Result<Self, PoolError> {
        if config.workers == 0 {
            return Err(PoolError::NoWorkers);
        }

        let stop = CancellationToken::new();
        let args = PoolArgs {
            config,
            store,
            executor,
            stop: stop.clone(),
            event_tx: events.clone(),
        };

        let (supervisor, handle) = Actor::spawn(None, PoolSupervisor, args).await?;

        Ok(Self {
            supervisor,
            handle,
            stop,
            events,
        })
    }

    /// Ask every worker to exit after its current job. Returns immediately.
    pub fn stop(&self) {
        tracing::info!("Stop requested for worker pool");
        self.stop.cancel();
    }

    /// Token that stops the pool when cancelled, e.g. from a signal handler.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Subscribe to job and worker events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Number of workers still running.
    pub async fn live_workers(&self) -> Result<usize, PoolError> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.supervisor
            .send_message(PoolMessage::LiveWorkers { reply: tx.into() })
            .map_err(|_| PoolError::Unavailable)?;
        rx.await.map_err(|_| PoolError::Unavailable)
    }

    /// Wait until every worker has exited.
    pub async fn join(self) -> Result<(), PoolError> {
        self.handle
            .await
            .map_err(|e| PoolError::Join(e.to_string()))
    }

    /// Request a stop and wait for in-flight jobs to finish.
    pub async fn shutdown(self) -> Result<(), PoolError> {
        self.stop();
        self.join().await
    }
}
