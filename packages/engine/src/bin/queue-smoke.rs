//! Runs the built-in smoke scenario against the configured store.
//!
//! Uses the `QUEUE_*` environment variables; log level via `RUST_LOG`.

use std::time::Duration;

use engine::{EngineConfig, JobQueue};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EngineConfig::from_env()?;
    let queue = JobQueue::open(config).await?;

    let dead = queue.smoke_test(Duration::from_secs(60)).await?;

    let status = queue.status(chrono::Utc::now().timestamp()).await?;
    println!("{}", status);
    for job in &dead {
        println!("{}", serde_json::to_string(job)?);
    }

    Ok(())
}
