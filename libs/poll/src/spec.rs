//! Poll timing configuration.

use std::time::Duration;

use crate::error::PollError;

/// Timing for a single poll.
///
/// Built per call site and never mutated while a poll runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSpec {
    /// Budget for the whole poll, measured from the call.
    pub overall_timeout: Duration,

    /// Wait between the end of one attempt and the start of the next.
    pub poll_interval: Duration,

    /// Wait before the first attempt. Counts against `overall_timeout`.
    pub initial_delay: Option<Duration>,
}

impl PollSpec {
    /// Create a spec without an initial delay.
    pub fn new(overall_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            overall_timeout,
            poll_interval,
            initial_delay: None,
        }
    }

    /// Set the delay before the first attempt.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Multiply the overall timeout, leaving the cadence untouched.
    ///
    /// A factor of zero is treated as one.
    pub fn scaled(mut self, factor: u32) -> Self {
        self.overall_timeout = self.overall_timeout.saturating_mul(factor.max(1));
        self
    }

    /// Check that the interval is non-zero and fits in the timeout.
    pub fn validate(&self) -> Result<(), PollError> {
        if self.poll_interval.is_zero() {
            return Err(PollError::ZeroInterval);
        }
        if self.overall_timeout < self.poll_interval {
            return Err(PollError::TimeoutShorterThanInterval {
                timeout: self.overall_timeout,
                interval: self.poll_interval,
            });
        }
        Ok(())
    }

    /// Retrying a chart/package installer command.
    pub fn installer() -> Self {
        Self::new(Duration::from_secs(120), Duration::from_secs(20))
    }

    /// Waiting for workloads selected by label to come up.
    pub fn workload_ready() -> Self {
        Self::new(Duration::from_secs(240), Duration::from_secs(30))
    }

    /// Waiting for a command to start exiting cleanly.
    pub fn command_ready() -> Self {
        Self::new(Duration::from_secs(120), Duration::from_secs(5))
    }

    /// Waiting for a resource field to be populated.
    pub fn resource_field() -> Self {
        Self::new(Duration::from_secs(120), Duration::from_secs(10))
    }
}
