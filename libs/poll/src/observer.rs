//! Per-attempt callbacks.
//!
//! The poller calls an observer after every attempt instead of logging
//! itself, so call sites choose where attempt progress goes.

use std::fmt::{Debug, Display};
use std::time::Duration;

use tracing::{debug, info, warn};

/// What one attempt produced, borrowed from the poller.
#[derive(Debug)]
pub enum AttemptResult<'a, T, E> {
    /// The predicate accepted the value.
    Accepted(&'a T),

    /// The probe succeeded but the predicate rejected the value.
    Rejected(&'a T),

    /// Retryable probe failure.
    Transient(&'a E),

    /// Non-retryable probe failure.
    Fatal(&'a E),
}

/// Record of a finished attempt.
#[derive(Debug)]
pub struct Attempt<'a, T, E> {
    /// 1-based attempt number.
    pub number: u32,

    /// Time since the poll started.
    pub elapsed: Duration,

    /// What happened.
    pub result: AttemptResult<'a, T, E>,
}

/// Receives every finished attempt.
pub trait AttemptObserver<T, E>: Send {
    fn on_attempt(&mut self, attempt: &Attempt<'_, T, E>);
}

impl<T, E, F> AttemptObserver<T, E> for F
where
    F: FnMut(&Attempt<'_, T, E>) + Send,
{
    fn on_attempt(&mut self, attempt: &Attempt<'_, T, E>) {
        self(attempt)
    }
}

/// Observer that ignores attempts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl<T, E> AttemptObserver<T, E> for NoopObserver {
    fn on_attempt(&mut self, _attempt: &Attempt<'_, T, E>) {}
}

/// Observer that emits a tracing event per attempt.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    operation: String,
}

impl TracingObserver {
    /// Create an observer labelling events with `operation`.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }
}

impl<T: Debug, E: Display> AttemptObserver<T, E> for TracingObserver {
    fn on_attempt(&mut self, attempt: &Attempt<'_, T, E>) {
        let elapsed_ms = attempt.elapsed.as_millis() as u64;
        match attempt.result {
            AttemptResult::Accepted(_) => info!(
                operation = %self.operation,
                attempt = attempt.number,
                elapsed_ms,
                "Condition satisfied"
            ),
            AttemptResult::Rejected(value) => debug!(
                operation = %self.operation,
                attempt = attempt.number,
                elapsed_ms,
                value = ?value,
                "Condition not met yet"
            ),
            AttemptResult::Transient(error) => warn!(
                operation = %self.operation,
                attempt = attempt.number,
                elapsed_ms,
                error = %error,
                "Attempt failed, will retry"
            ),
            AttemptResult::Fatal(error) => warn!(
                operation = %self.operation,
                attempt = attempt.number,
                elapsed_ms,
                error = %error,
                "Attempt failed permanently"
            ),
        }
    }
}
