//! Bounded, fixed-interval retry policy for the readiness poll.

use std::time::Duration;

use rsinit_common::{AdminError, AdminResult};

/// How long and how often to poll for readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of status queries.
    pub max_attempts: u32,
    /// Delay before each status query.
    pub interval: Duration,
    /// Delay before the initiation call, for the server to come up.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(2),
            initial_delay: Duration::from_secs(20),
        }
    }
}

impl RetryPolicy {
    /// A policy that never waits. Useful against already-running servers.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            interval: Duration::ZERO,
            initial_delay: Duration::ZERO,
        }
    }

    /// Set the attempt budget.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the poll interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the delay before initiation.
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Load overrides from `RSINIT_POLL_ATTEMPTS`, `RSINIT_POLL_INTERVAL_MS`
    /// and `RSINIT_INITIAL_DELAY_MS`. Unset or unparsable values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut policy = Self::default();

        if let Some(attempts) = lookup("RSINIT_POLL_ATTEMPTS").and_then(|v| v.parse().ok()) {
            policy.max_attempts = attempts;
        }
        if let Some(ms) = lookup("RSINIT_POLL_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            policy.interval = Duration::from_millis(ms);
        }
        if let Some(ms) = lookup("RSINIT_INITIAL_DELAY_MS").and_then(|v| v.parse().ok()) {
            policy.initial_delay = Duration::from_millis(ms);
        }

        policy
    }

    /// Time slept by a run that issued `attempts` status queries.
    pub fn waited(&self, attempts: u32) -> Duration {
        self.initial_delay
            .saturating_add(self.interval.saturating_mul(attempts))
    }

    /// Longest the whole procedure sleeps before giving up.
    pub fn budget(&self) -> Duration {
        self.waited(self.max_attempts)
    }

    /// Validate policy.
    pub fn validate(&self) -> AdminResult<()> {
        if self.max_attempts == 0 {
            return Err(AdminError::Configuration(
                "Poll attempts cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Milliseconds for log fields and reports, clamped to `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
