//! Error types for polling.

use std::time::Duration;

use thiserror::Error;

/// Errors returned before any probe runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PollError {
    /// The poll interval is zero.
    #[error("invalid poll spec: poll interval must be greater than zero")]
    ZeroInterval,

    /// The overall timeout is shorter than a single interval.
    #[error("invalid poll spec: overall timeout {timeout:?} is shorter than poll interval {interval:?}")]
    TimeoutShorterThanInterval { timeout: Duration, interval: Duration },
}

/// A non-satisfied poll converted into a hard failure.
///
/// `last` carries a rendering of the last observed value or error so the
/// failure can be diagnosed without re-running the poll.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WaitError {
    /// The budget ran out before the predicate accepted a value.
    #[error("timed out waiting for {operation} after {attempts} attempts ({elapsed:?}); last observed: {last}")]
    TimedOut {
        operation: String,
        attempts: u32,
        elapsed: Duration,
        last: String,
    },

    /// The probe reported a non-retryable failure.
    #[error("{operation} failed permanently on attempt {attempts}: {error}")]
    Fatal {
        operation: String,
        attempts: u32,
        error: String,
    },

    /// The cancel signal fired.
    #[error("waiting for {operation} was cancelled after {attempts} attempts")]
    Cancelled { operation: String, attempts: u32 },

    /// The `PollSpec` was rejected before polling started.
    #[error("{operation}: {source}")]
    Config {
        operation: String,
        #[source]
        source: PollError,
    },
}

impl WaitError {
    /// Returns true if the wait ended because of cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
