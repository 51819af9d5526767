//! Retry and backoff decisions after an execution finishes.
//!
//! Delays grow as `backoff_base ^ attempts`, where `attempts` already
//! includes the failure being handled. A job is dead-lettered once
//! `attempts` exceeds `max_retries`.

use serde::{Deserialize, Serialize};

/// Result reported by the executor for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutcome {
    /// Process exit code, `None` when the command could not be started or
    /// was killed by a signal.
    pub exit_code: Option<i32>,
}

impl ExecOutcome {
    pub fn success() -> Self {
        Self { exit_code: Some(0) }
    }

    pub fn failure(exit_code: Option<i32>) -> Self {
        Self { exit_code }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// What happens to a job after it leaves `processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum Transition {
    /// Succeeded; the record is deleted.
    Complete,
    /// Failed with budget left; back to pending after a delay.
    Retry {
        attempts: u32,
        delay_secs: u64,
        next_run: i64,
    },
    /// Failed with the budget exhausted; moved to the dead-letter table.
    DeadLetter { attempts: u32 },
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Complete => "complete",
            Transition::Retry { .. } => "retry",
            Transition::DeadLetter { .. } => "dead_letter",
        }
    }
}

/// Delay before the next attempt, saturating instead of overflowing.
pub fn backoff_delay(base: u64, attempts: u32) -> u64 {
    base.saturating_pow(attempts)
}

/// Decide the transition for a job that had `attempts` failures before this run.
pub fn next_transition(
    attempts: u32,
    max_retries: u32,
    outcome: ExecOutcome,
    backoff_base: u64,
    now: i64,
) -> Transition {
    if outcome.is_success() {
        return Transition::Complete;
    }

    let attempts = attempts.saturating_add(1);
    if attempts > max_retries {
        return Transition::DeadLetter { attempts };
    }

    let delay_secs = backoff_delay(backoff_base, attempts);
    let delay = i64::try_from(delay_secs).unwrap_or(i64::MAX);
    Transition::Retry {
        attempts,
        delay_secs,
        next_run: now.saturating_add(delay),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn success_completes_regardless_of_budget() {
        let t = next_transition(7, 0, ExecOutcome::success(), 2, NOW);
        assert_eq!(t, Transition::Complete);
    }

    #[test]
    fn delays_grow_geometrically() {
        let first = next_transition(0, 5, ExecOutcome::failure(Some(1)), 2, NOW);
        assert_eq!(
            first,
            Transition::Retry {
                attempts: 1,
                delay_secs: 2,
                next_run: NOW + 2
            }
        );

        let second = next_transition(1, 5, ExecOutcome::failure(Some(1)), 2, NOW);
        assert_eq!(
            second,
            Transition::Retry {
                attempts: 2,
                delay_secs: 4,
                next_run: NOW + 4
            }
        );

        let third = next_transition(2, 5, ExecOutcome::failure(None), 3, NOW);
        assert!(matches!(third, Transition::Retry { delay_secs: 27, .. }));
    }

    #[test]
    fn exhausted_budget_dead_letters() {
        let retry = next_transition(0, 1, ExecOutcome::failure(Some(127)), 2, NOW);
        assert!(matches!(retry, Transition::Retry { attempts: 1, .. }));

        let dead = next_transition(1, 1, ExecOutcome::failure(Some(127)), 2, NOW);
        assert_eq!(dead, Transition::DeadLetter { attempts: 2 });
    }

    #[test]
    fn zero_budget_dead_letters_on_first_failure() {
        let dead = next_transition(0, 0, ExecOutcome::failure(Some(1)), 2, NOW);
        assert_eq!(dead, Transition::DeadLetter { attempts: 1 });
    }

    #[test]
    fn huge_delays_saturate() {
        assert_eq!(backoff_delay(10, 40), u64::MAX);
        let t = next_transition(39, 100, ExecOutcome::failure(Some(1)), 10, NOW);
        assert!(matches!(t, Transition::Retry { next_run: i64::MAX, .. }));
    }

    #[test]
    fn nonzero_exit_and_missing_exit_code_are_failures() {
        assert!(!ExecOutcome::failure(Some(2)).is_success());
        assert!(!ExecOutcome::failure(None).is_success());
        assert!(ExecOutcome::success().is_success());
    }
}
