//! Key/value configuration persisted in the store.
//!
//! Values are read on every use so an operator can tune a running queue.

use queue_core::ConfigKey;
use serde::Deserialize;
use surrealdb::sql::Thing;

use crate::{DbError, Store};

#[derive(Debug, Deserialize)]
struct ConfigRecord {
    id: Thing,
    value: String,
}

/// Repository for configuration values.
pub struct ConfigRepository<'a> {
    store: &'a Store,
}

impl<'a> ConfigRepository<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Raw value of a key, if set.
    pub async fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        let db = self.store.database();

        let record: Option<ConfigRecord> = db.select(("config", key.to_string())).await?;

        Ok(record.map(|r| r.value))
    }

    /// Set a key, creating it if needed.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), DbError> {
        let db = self.store.database();

        db.query(r#"UPSERT type::thing("config", $key) SET value = $value RETURN NONE"#)
            .bind(("key", key.to_string()))
            .bind(("value", value.to_string()))
            .await?
            .check()?;

        tracing::info!("Config set: {} = {}", key, value);
        Ok(())
    }

    /// All keys and values, sorted by key.
    pub async fn all(&self) -> Result<Vec<(String, String)>, DbError> {
        let db = self.store.database();

        let records: Vec<ConfigRecord> = db.select("config").await?;

        let mut entries: Vec<(String, String)> = records
            .into_iter()
            .map(|r| (r.id.id.to_raw(), r.value))
            .collect();
        entries.sort();
        Ok(entries)
    }

    /// Current backoff base in seconds.
    pub async fn backoff_base(&self) -> Result<u64, DbError> {
        self.read_number(ConfigKey::BackoffBase).await
    }

    /// Retry budget for submissions that do not specify one.
    pub async fn default_max_retries(&self) -> Result<u32, DbError> {
        let value = self.read_number(ConfigKey::MaxRetries).await?;
        Ok(u32::try_from(value).unwrap_or(u32::MAX))
    }

    /// Parse a numeric key, falling back to its default when missing or invalid.
    async fn read_number(&self, key: ConfigKey) -> Result<u64, DbError> {
        let Some(raw) = self.get(key.as_str()).await? else {
            return Ok(key.default_value());
        };

        match raw.trim().parse::<u64>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(
                    "Invalid config value {} = {:?}, using default {}",
                    key,
                    raw,
                    key.default_value()
                );
                Ok(key.default_value())
            }
        }
    }
}
