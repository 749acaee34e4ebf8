//! Retry-until-condition polling.
//!
//! A poll repeatedly runs a [`Probe`] until a [`Predicate`] accepts its value,
//! the [`PollSpec`] budget runs out, or a cancel signal fires. Key rules:
//!
//! - An invalid spec is rejected before the probe ever runs
//! - A fatal probe outcome stops the poll immediately
//! - The deadline is checked after every attempt and the last wait is
//!   shortened to end on it, so no attempt starts late
//! - Cancellation is cooperative: it is honored between attempts and during
//!   waits, never by aborting a running probe
//!
//! ```ignore
//! use fleetcheck_poll::{poll_until, PollSpec, ProbeOutcome, probe_fn};
//!
//! let report = poll_until(
//!     probe_fn(|| async { ProbeOutcome::from(check_rollout().await) }),
//!     |status: &String| status.contains("successfully rolled out"),
//!     &PollSpec::workload_ready(),
//!     None,
//! )
//! .await?;
//! let status = report.into_result("fleet-controller rollout")?;
//! ```

mod error;
mod observer;
mod outcome;
mod poller;
mod probe;
mod spec;

pub use error::{PollError, WaitError};
pub use observer::{Attempt, AttemptObserver, AttemptResult, NoopObserver, TracingObserver};
pub use outcome::{PollOutcome, PollReport};
pub use poller::{poll_until, Poller};
pub use probe::{accept_any, probe_fn, FnProbe, Predicate, Probe, ProbeOutcome};
pub use spec::PollSpec;
