//! Bounded retry with exponential backoff for external calls.

use std::time::Duration;

use rand::Rng;

use crate::config::JobsConfig;

/// Retry policy for transient external failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt budget (first try included)
    pub max_attempts: u32,
    /// Initial delay in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u64,
    /// Multiplier for exponential growth
    pub multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5_000,
            multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &JobsConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay_ms: config.initial_backoff_ms,
            max_delay_ms: config.max_backoff_ms,
            ..Self::default()
        }
    }

    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self.clone())
    }
}

/// Exponential backoff calculator with jitter.
pub struct ExponentialBackoff {
    policy: RetryPolicy,
    current_delay_ms: u64,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(policy: RetryPolicy) -> Self {
        let initial = policy.initial_delay_ms;
        Self {
            policy,
            current_delay_ms: initial,
            attempt: 0,
        }
    }

    /// Get the next delay duration.
    pub fn next_delay(&mut self) -> Duration {
        self.attempt += 1;

        // Exponential growth capped at the maximum
        let base_delay = self.current_delay_ms as f64 * self.policy.multiplier;
        let capped_delay = base_delay.min(self.policy.max_delay_ms as f64);

        let jitter_range = capped_delay * self.policy.jitter_factor;
        let final_delay = if jitter_range > 0.0 {
            let jitter = rand::rng().random_range(-jitter_range..jitter_range);
            (capped_delay + jitter).max(1.0) as u64
        } else {
            capped_delay.max(1.0) as u64
        };

        self.current_delay_ms = final_delay;

        Duration::from_millis(final_delay)
    }

    /// Reset the backoff to initial state.
    pub fn reset(&mut self) {
        self.current_delay_ms = self.policy.initial_delay_ms;
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
