//! Bounded retry policy for per-task failures.
//!
//! A failed task is retried from the start, immediately, until the attempt
//! cap is reached. There is no backoff: the attempt counter alone decides.
//!
//! # Example
//!
//! ```
//! use harvester_core::download::{RetryDecision, RetryPolicy};
//!
//! let mut state = RetryPolicy::with_max_attempts(2).start();
//! state.begin_attempt();
//! assert_eq!(state.decide(), RetryDecision::Retry { next_attempt: 2 });
//! state.begin_attempt();
//! assert_eq!(state.decide(), RetryDecision::GiveUp);
//! ```

use tracing::debug;

/// Default maximum attempts per task (including the first one).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Decision on whether to run a failed task again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Run the task again; `next_attempt` is 1-indexed.
    Retry {
        /// Which attempt number the retry will be.
        next_attempt: u32,
    },

    /// The attempt cap is reached; abandon the task.
    GiveUp,
}

/// Maximum-attempts policy shared by every task of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with a custom attempt cap (clamped to at least 1).
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Starts a fresh attempt counter for one task.
    #[must_use]
    pub fn start(&self) -> RetryState {
        RetryState {
            attempt_count: 0,
            max_attempts: self.max_attempts,
        }
    }
}

/// Attempt counter for a single task execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    attempt_count: u32,
    max_attempts: u32,
}

impl RetryState {
    /// Records the start of a new attempt and returns its 1-based index.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt_count += 1;
        self.attempt_count
    }

    /// The cap this state was created with.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides what happens after the current attempt failed.
    #[must_use]
    pub fn decide(&self) -> RetryDecision {
        if self.attempt_count < self.max_attempts {
            RetryDecision::Retry {
                next_attempt: self.attempt_count + 1,
            }
        } else {
            debug!(
                attempts = self.attempt_count,
                max_attempts = self.max_attempts,
                "attempt cap reached"
            );
            RetryDecision::GiveUp
        }
    }
}
