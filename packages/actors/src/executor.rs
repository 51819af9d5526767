//! Executor trait and implementations.
//!
//! The engine treats execution as a black box: it only needs an exit
//! status back. No timeout is applied here.

use futures_util::future::BoxFuture;
use queue_core::{ClaimedJob, ExecOutcome};

/// Future type for executions.
pub type ExecFuture = BoxFuture<'static, ExecOutcome>;

/// Trait for running a claimed job's command.
///
/// Implementations must report failures through [`ExecOutcome`] rather
/// than panicking; an execution failure is an expected path.
pub trait Executor: Send + Sync + 'static {
    fn execute(&self, job: &ClaimedJob) -> ExecFuture;
}

/// Runs each command through the platform shell as a subprocess.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    program: String,
    flag: String,
}

impl ShellExecutor {
    /// Use a specific shell and the flag that makes it read a command string.
    pub fn with_shell(program: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
        }
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        if cfg!(windows) {
            Self::with_shell("cmd", "/C")
        } else {
            Self::with_shell("sh", "-c")
        }
    }
}

impl Executor for ShellExecutor {
    fn execute(&self, job: &ClaimedJob) -> ExecFuture {
        let mut command = tokio::process::Command::new(&self.program);
        command.arg(&self.flag).arg(&job.command);
        let job_id = job.id.clone();

        Box::pin(async move {
            match command.status().await {
                Ok(status) => ExecOutcome {
                    exit_code: status.code(),
                },
                Err(e) => {
                    tracing::warn!("Failed to start job {}: {}", job_id, e);
                    ExecOutcome::failure(None)
                }
            }
        })
    }
}

/// A simple function-based executor.
pub struct FnExecutor<F>
where
    F: Fn(&ClaimedJob) -> ExecFuture + Send + Sync + 'static,
{
    executor: F,
}

impl<F> FnExecutor<F>
where
    F: Fn(&ClaimedJob) -> ExecFuture + Send + Sync + 'static,
{
    /// Create a new function-based executor.
    pub fn new(executor: F) -> Self {
        Self { executor }
    }
}

impl<F> Executor for FnExecutor<F>
where
    F: Fn(&ClaimedJob) -> ExecFuture + Send + Sync + 'static,
{
    fn execute(&self, job: &ClaimedJob) -> ExecFuture {
        (self.executor)(job)
    }
}
