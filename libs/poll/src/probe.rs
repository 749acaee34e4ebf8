//! Probes and predicates.

use std::future::Future;

use async_trait::async_trait;

/// What a single probe invocation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome<T, E> {
    /// The probe produced a value for the predicate to judge.
    Success(T),

    /// The attempt failed but a later attempt may succeed.
    Transient(E),

    /// Retrying is pointless (e.g. a malformed invocation).
    Fatal(E),
}

impl<T, E> ProbeOutcome<T, E> {
    /// Returns true for a fatal outcome.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// `Ok` maps to success and `Err` to a transient failure.
impl<T, E> From<Result<T, E>> for ProbeOutcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::Transient(error),
        }
    }
}

/// A unit of observation or action invoked once per attempt.
///
/// Implementations must be safe to run repeatedly. Probes with side effects
/// (installers, registrations) have to be idempotent themselves; the poller
/// does not check this.
#[async_trait]
pub trait Probe: Send {
    /// Value handed to the predicate.
    type Output: Send;

    /// Error carried by transient and fatal outcomes.
    type Error: Send;

    /// Run one attempt.
    async fn execute(&mut self) -> ProbeOutcome<Self::Output, Self::Error>;
}

/// Probe backed by a closure returning a future.
pub struct FnProbe<F>(F);

/// Wrap a closure as a [`Probe`].
pub fn probe_fn<F, Fut, T, E>(f: F) -> FnProbe<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = ProbeOutcome<T, E>> + Send,
{
    FnProbe(f)
}

#[async_trait]
impl<F, Fut, T, E> Probe for FnProbe<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = ProbeOutcome<T, E>> + Send,
    T: Send,
    E: Send,
{
    type Output = T;
    type Error = E;

    async fn execute(&mut self) -> ProbeOutcome<T, E> {
        (self.0)().await
    }
}

/// Acceptance test applied to a probe's value.
pub trait Predicate<T>: Send {
    /// Returns true if `value` ends the poll.
    fn accept(&mut self, value: &T) -> bool;
}

impl<T, F> Predicate<T> for F
where
    F: FnMut(&T) -> bool + Send,
{
    fn accept(&mut self, value: &T) -> bool {
        self(value)
    }
}

/// Predicate accepting any successful value.
pub fn accept_any<T>() -> impl FnMut(&T) -> bool + Send {
    |_| true
}
