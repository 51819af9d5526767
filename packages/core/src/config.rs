//! Process-wide settings persisted alongside the jobs.

use serde::{Deserialize, Serialize};

/// Known configuration keys with their seeded defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKey {
    /// Base of the exponential retry delay, in seconds.
    BackoffBase,
    /// Retry budget for submissions that do not carry one.
    MaxRetries,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 2] = [ConfigKey::BackoffBase, ConfigKey::MaxRetries];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::BackoffBase => "backoff_base",
            ConfigKey::MaxRetries => "max_retries",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    pub fn default_value(&self) -> u64 {
        match self {
            ConfigKey::BackoffBase => 2,
            ConfigKey::MaxRetries => 3,
        }
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
