//! Persistent, at-least-once job queue engine.
//!
//! `JobQueue` ties the pieces together: submissions go to the SurrealDB
//! store, a pool of Ractor workers claims and runs them, and failures are
//! retried with exponential backoff until they land in the dead-letter
//! table.
//!
//! ```ignore
//! use engine::{EngineConfig, JobQueue};
//!
//! let queue = JobQueue::open(EngineConfig::from_env()?).await?;
//! queue.submit(r#"{"id":"job1","command":"echo hi"}"#).await?;
//!
//! let pool = queue.start_workers(2).await?;
//! // ...
//! pool.shutdown().await?;
//! ```

mod admin;
mod error;
mod queue;
mod settings;
pub mod smoke;

pub use error::QueueError;
pub use queue::JobQueue;
pub use settings::EngineConfig;

pub use actors::{ExecFuture, Executor, FnExecutor, ShellExecutor, WorkerPool};
pub use actors::CancellationToken;
pub use db::DbConfig;
pub use queue_core::{
    ClaimedJob, ConfigKey, DeadJob, ExecOutcome, Job, JobEvent, JobId, JobState, QueueStatus, Submission,
};
