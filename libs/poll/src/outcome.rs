//! Terminal poll results.

use std::fmt::{Debug, Display};
use std::time::Duration;

use crate::error::WaitError;

/// Why a poll stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T, E> {
    /// The predicate accepted a value.
    Satisfied(T),

    /// The budget ran out. Holds the most recent rejected value and the most
    /// recent transient error, whichever were observed.
    TimedOut {
        last_value: Option<T>,
        last_error: Option<E>,
    },

    /// The probe reported a fatal failure.
    Fatal(E),

    /// The cancel signal fired.
    Cancelled,
}

impl<T, E> PollOutcome<T, E> {
    /// Returns true if the predicate was satisfied.
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied(_))
    }

    /// Returns true if the poll ran out of time.
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Returns true if the poll was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Terminal outcome plus the bookkeeping needed to diagnose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport<T, E> {
    pub outcome: PollOutcome<T, E>,

    /// Number of probe invocations.
    pub attempts: u32,

    /// Time from the call to the terminal outcome.
    pub elapsed: Duration,
}

impl<T: Debug, E: Display> PollReport<T, E> {
    /// Convert into the satisfied value, or a [`WaitError`] naming
    /// `operation` and the last observed state.
    pub fn into_result(self, operation: &str) -> Result<T, WaitError> {
        let operation = operation.to_string();
        match self.outcome {
            PollOutcome::Satisfied(value) => Ok(value),
            PollOutcome::TimedOut {
                last_value,
                last_error,
            } => Err(WaitError::TimedOut {
                operation,
                attempts: self.attempts,
                elapsed: self.elapsed,
                last: describe_last(last_value.as_ref(), last_error.as_ref()),
            }),
            PollOutcome::Fatal(error) => Err(WaitError::Fatal {
                operation,
                attempts: self.attempts,
                error: error.to_string(),
            }),
            PollOutcome::Cancelled => Err(WaitError::Cancelled {
                operation,
                attempts: self.attempts,
            }),
        }
    }
}

fn describe_last<T: Debug, E: Display>(value: Option<&T>, error: Option<&E>) -> String {
    match (value, error) {
        (Some(value), Some(error)) => format!("value {value:?}, error {error}"),
        (Some(value), None) => format!("value {value:?}"),
        (None, Some(error)) => format!("error {error}"),
        (None, None) => "nothing".to_string(),
    }
}
