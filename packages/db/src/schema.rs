//! Database schema definitions using SurrealQL.

use queue_core::ConfigKey;

use crate::{Database, DbError};

/// Initialize the database schema.
///
/// This creates all necessary tables, fields, and indexes, then seeds the
/// configuration defaults that are not already present.
pub async fn init_schema(db: &Database) -> Result<(), DbError> {
    tracing::info!("Initializing database schema...");

    // Active job table
    db.query(JOB_SCHEMA).await?.check()?;

    // Dead-letter table
    db.query(DLQ_SCHEMA).await?.check()?;

    // Key/value settings
    db.query(CONFIG_SCHEMA).await?.check()?;

    for key in ConfigKey::ALL {
        db.query("INSERT IGNORE INTO config { id: $key, value: $value }")
            .bind(("key", key.as_str()))
            .bind(("value", key.default_value().to_string()))
            .await?
            .check()?;
    }

    tracing::info!("Database schema initialized");

    Ok(())
}

/// Job table schema.
const JOB_SCHEMA: &str = r#"
-- Jobs that still have retry budget; the record id is the caller's job id
DEFINE TABLE IF NOT EXISTS job SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS command ON job TYPE string;
DEFINE FIELD IF NOT EXISTS max_retries ON job TYPE int;
DEFINE FIELD IF NOT EXISTS attempts ON job TYPE int DEFAULT 0;
DEFINE FIELD IF NOT EXISTS state ON job TYPE string DEFAULT "pending"
    ASSERT $value IN ["pending", "processing"];
DEFINE FIELD IF NOT EXISTS enqueued_at ON job TYPE int;
DEFINE FIELD IF NOT EXISTS next_run ON job TYPE int DEFAULT 0;

-- Claim polling: eligible pending jobs, oldest first
DEFINE INDEX IF NOT EXISTS job_state_next_run ON job FIELDS state, next_run;
DEFINE INDEX IF NOT EXISTS job_enqueued ON job FIELDS enqueued_at;
"#;

/// Dead-letter table schema.
const DLQ_SCHEMA: &str = r#"
-- Jobs that exhausted their retry budget
DEFINE TABLE IF NOT EXISTS dlq SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS command ON dlq TYPE string;
DEFINE FIELD IF NOT EXISTS max_retries ON dlq TYPE int;
DEFINE FIELD IF NOT EXISTS attempts ON dlq TYPE int;
DEFINE FIELD IF NOT EXISTS failed_at ON dlq TYPE int;
DEFINE FIELD IF NOT EXISTS dead_seq ON dlq TYPE int;

DEFINE INDEX IF NOT EXISTS dlq_dead_seq ON dlq FIELDS dead_seq;
"#;

/// Config table schema.
const CONFIG_SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS config SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS value ON config TYPE string;
"#;
