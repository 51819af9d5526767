//! Point-in-time queue statistics.

use serde::{Deserialize, Serialize};

/// Snapshot of the queue at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueStatus {
    /// Pending jobs eligible to be claimed now.
    pub ready: u64,
    /// Pending jobs waiting for their retry delay.
    pub delayed: u64,
    /// Jobs claimed by a worker.
    pub processing: u64,
    /// Records in the dead-letter table.
    pub dead: u64,
}

impl QueueStatus {
    /// Jobs still in the active table.
    pub fn active(&self) -> u64 {
        self.ready + self.delayed + self.processing
    }

    /// Whether nothing is left to run or running.
    pub fn is_drained(&self) -> bool {
        self.active() == 0
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pending_ready={} delayed={} processing={} | DLQ={}",
            self.ready, self.delayed, self.processing, self.dead
        )
    }
}
