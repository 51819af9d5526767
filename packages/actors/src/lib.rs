//! Actor system for the job queue workers.
//!
//! This crate provides the Ractor-based worker pool that drains the
//! durable store.
//!
//! # Architecture
//!
//! - `PoolSupervisor` - Owns the workers and stops once they have all exited
//! - `WorkerActor` - Claims, executes and settles one job at a time
//! - `WorkerPool` - Handle for starting, stopping and joining a pool
//!
//! Workers never talk to each other; the store's claim protocol is the
//! only coordination between them.
//!
//! # Usage
//!
//! ```ignore
//! use actors::{PoolConfig, ShellExecutor, WorkerPool};
//!
//! let (events, _) = tokio::sync::broadcast::channel(1024);
//! let pool = WorkerPool::start(
//!     PoolConfig::new(2),
//!     store,
//!     Arc::new(ShellExecutor::default()),
//!     events,
//! )
//! .await?;
//!
//! pool.shutdown().await?;
//! ```

mod executor;
mod messages;
mod supervisor;
mod worker_actor;

pub use executor::{ExecFuture, Executor, FnExecutor, ShellExecutor};
pub use messages::{PoolMessage, WorkerMessage};
pub use supervisor::{PoolConfig, PoolError, PoolSupervisor, WorkerPool};
pub use worker_actor::WorkerActor;

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, concurrency};
pub use tokio_util::sync::CancellationToken;
