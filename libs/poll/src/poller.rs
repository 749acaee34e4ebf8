//! The retry-until-condition loop.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::PollError;
use crate::observer::{Attempt, AttemptObserver, AttemptResult, NoopObserver};
use crate::outcome::{PollOutcome, PollReport};
use crate::probe::{Predicate, Probe, ProbeOutcome};
use crate::spec::PollSpec;

/// Poll a probe until `predicate` accepts its value.
///
/// `cancel` is a shutdown-style channel: sending `true` cancels the poll at
/// the next checkpoint. Dropping the sender leaves the poll uncancellable.
pub async fn poll_until<P, Q>(
    probe: P,
    predicate: Q,
    spec: &PollSpec,
    cancel: Option<watch::Receiver<bool>>,
) -> Result<PollReport<P::Output, P::Error>, PollError>
where
    P: Probe,
    Q: Predicate<P::Output>,
{
    let mut poller = Poller::new(*spec);
    if let Some(cancel) = cancel {
        poller = poller.cancel_on(cancel);
    }
    poller.run(probe, predicate).await
}

/// Configured poll, ready to run once.
#[derive(Debug)]
pub struct Poller<O = NoopObserver> {
    spec: PollSpec,
    cancel: Option<watch::Receiver<bool>>,
    observer: O,
}

impl Poller<NoopObserver> {
    /// Create a poller with no cancel signal and no observer.
    pub fn new(spec: PollSpec) -> Self {
        Self {
            spec,
            cancel: None,
            observer: NoopObserver,
        }
    }
}

impl<O> Poller<O> {
    /// Cancel the poll when `cancel` becomes `true`.
    pub fn cancel_on(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Report every attempt to `observer`.
    pub fn observe<N>(self, observer: N) -> Poller<N> {
        Poller {
            spec: self.spec,
            cancel: self.cancel,
            observer,
        }
    }

    /// Run the poll to a terminal outcome.
    ///
    /// Returns `Err` only for an invalid spec, in which case the probe is
    /// never invoked.
    pub async fn run<P, Q>(
        mut self,
        mut probe: P,
        mut predicate: Q,
    ) -> Result<PollReport<P::Output, P::Error>, PollError>
    where
        P: Probe,
        Q: Predicate<P::Output>,
        O: AttemptObserver<P::Output, P::Error>,
    {
        self.spec.validate()?;

        let start = Instant::now();
        let mut attempts = 0u32;
        let mut last_value = None;
        let mut last_error = None;

        let finish = |outcome: PollOutcome<P::Output, P::Error>, attempts: u32| PollReport {
            outcome,
            attempts,
            elapsed: start.elapsed(),
        };

        if let Some(delay) = self.spec.initial_delay {
            if !wait(delay, self.cancel.as_mut()).await {
                return Ok(finish(PollOutcome::Cancelled, attempts));
            }
        }

        loop {
            if is_cancelled(&self.cancel) {
                return Ok(finish(PollOutcome::Cancelled, attempts));
            }

            attempts += 1;
            let outcome = probe.execute().await;
            let elapsed = start.elapsed();

            match outcome {
                ProbeOutcome::Success(value) => {
                    if predicate.accept(&value) {
                        self.observer.on_attempt(&Attempt {
                            number: attempts,
                            elapsed,
                            result: AttemptResult::Accepted(&value),
                        });
                        return Ok(finish(PollOutcome::Satisfied(value), attempts));
                    }
                    self.observer.on_attempt(&Attempt {
                        number: attempts,
                        elapsed,
                        result: AttemptResult::Rejected(&value),
                    });
                    last_value = Some(value);
                }
                ProbeOutcome::Transient(error) => {
                    self.observer.on_attempt(&Attempt {
                        number: attempts,
                        elapsed,
                        result: AttemptResult::Transient(&error),
                    });
                    last_error = Some(error);
                }
                ProbeOutcome::Fatal(error) => {
                    self.observer.on_attempt(&Attempt {
                        number: attempts,
                        elapsed,
                        result: AttemptResult::Fatal(&error),
                    });
                    return Ok(finish(PollOutcome::Fatal(error), attempts));
                }
            }

            if elapsed >= self.spec.overall_timeout {
                return Ok(finish(
                    PollOutcome::TimedOut {
                        last_value,
                        last_error,
                    },
                    attempts,
                ));
            }

            // The last wait is cut short so the final attempt starts at the
            // deadline, never after it.
            let remaining = self.spec.overall_timeout.saturating_sub(elapsed);
            if !wait(self.spec.poll_interval.min(remaining), self.cancel.as_mut()).await {
                return Ok(finish(PollOutcome::Cancelled, attempts));
            }
        }
    }
}

fn is_cancelled(cancel: &Option<watch::Receiver<bool>>) -> bool {
    cancel.as_ref().is_some_and(|rx| *rx.borrow())
}

/// Sleep for `duration`. Returns false if cancelled first.
async fn wait(duration: Duration, cancel: Option<&mut watch::Receiver<bool>>) -> bool {
    let Some(rx) = cancel else {
        tokio::time::sleep(duration).await;
        return true;
    };
    if *rx.borrow_and_update() {
        return false;
    }

    let sleep = tokio::time::sleep(duration);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            changed = rx.changed() => {
                if changed.is_err() {
                    // Sender dropped: nothing can cancel us any more.
                    (&mut sleep).await;
                    return true;
                }
                if *rx.borrow_and_update() {
                    return false;
                }
            }
        }
    }
}
