//! Engine configuration, read from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `QUEUE_DB_ENDPOINT` | `mem://` |
//! | `QUEUE_DB_NAMESPACE` | `jobqueue` |
//! | `QUEUE_DB_DATABASE` | `main` |
//! | `QUEUE_DB_USER` / `QUEUE_DB_PASS` | none (both or neither) |
//! | `QUEUE_WORKERS` | `1` |
//! | `QUEUE_POLL_INTERVAL_MS` | `1000` |

use std::time::Duration;

use actors::PoolConfig;
use db::DbConfig;

use crate::QueueError;

/// Settings for opening a [`JobQueue`](crate::JobQueue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub db: DbConfig,
    /// Workers started by `start_workers` when no count is given.
    pub workers: usize,
    /// Idle wait between empty polls.
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db: DbConfig::default(),
            workers: 1,
            poll_interval: Duration::from_millis(1000),
        }
    }
}

impl EngineConfig {
    /// In-memory store with default settings.
    pub fn memory() -> Self {
        Self::default()
    }

    pub fn with_db(mut self, db: DbConfig) -> Self {
        self.db = db;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Pool settings for `workers` workers.
    pub fn pool(&self, workers: usize) -> PoolConfig {
        PoolConfig::new(workers).with_poll_interval(self.poll_interval)
    }

    /// Build from `QUEUE_*` environment variables.
    pub fn from_env() -> Result<Self, QueueError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, QueueError> {
        let var = |name: &str| lookup(name).and_then(non_empty);
        let defaults = Self::default();

        let mut db = DbConfig::default();
        if let Some(endpoint) = var("QUEUE_DB_ENDPOINT") {
            db = db.with_endpoint(endpoint);
        }
        if let Some(namespace) = var("QUEUE_DB_NAMESPACE") {
            db = db.with_namespace(namespace);
        }
        if let Some(database) = var("QUEUE_DB_DATABASE") {
            db = db.with_database(database);
        }
        match (var("QUEUE_DB_USER"), var("QUEUE_DB_PASS")) {
            (Some(user), Some(pass)) => db = db.with_credentials(user, pass),
            (None, None) => {}
            _ => {
                return Err(QueueError::InvalidConfig(
                    "QUEUE_DB_USER and QUEUE_DB_PASS must be set together".to_string(),
                ));
            }
        }

        let workers = match var("QUEUE_WORKERS") {
            Some(raw) => parse_number("QUEUE_WORKERS", &raw)?,
            None => defaults.workers as u64,
        };
        if workers == 0 {
            return Err(QueueError::InvalidConfig(
                "QUEUE_WORKERS must be at least 1".to_string(),
            ));
        }
        let workers = usize::try_from(workers).map_err(|_| {
            QueueError::InvalidConfig(format!("QUEUE_WORKERS is too large: {}", workers))
        })?;

        let poll_interval = match var("QUEUE_POLL_INTERVAL_MS") {
            Some(raw) => Duration::from_millis(parse_number("QUEUE_POLL_INTERVAL_MS", &raw)?),
            None => defaults.poll_interval,
        };

        Ok(Self {
            db,
            workers,
            poll_interval,
        })
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_number(var_name: &str, raw: &str) -> Result<u64, QueueError> {
    raw.parse::<u64>().map_err(|_| {
        QueueError::InvalidConfig(format!(
            "invalid number for {var_name}={raw} (expected a non-negative integer)"
        ))
    })
}
