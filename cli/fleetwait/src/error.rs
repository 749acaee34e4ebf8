//! Error display and exit codes.

use colored::Colorize;
use fleetcheck_poll::WaitError;

/// Exit code used when the wait was cancelled (128 + SIGINT).
pub const EXIT_CANCELLED: i32 = 130;

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(wait_err) = err.downcast_ref::<WaitError>() {
        match wait_err {
            WaitError::TimedOut { .. } => {
                eprintln!(
                    "\n{}",
                    "Hint: Raise --timeout or set TIMEOUT_SCALE for slow environments.".yellow()
                );
            }
            WaitError::Fatal { .. } => {
                eprintln!(
                    "\n{}",
                    "Hint: This failure is not retried. Check the command and its flags.".yellow()
                );
            }
            WaitError::Cancelled { .. } | WaitError::Config { .. } => {}
        }
    }
}

/// Process exit code for an error.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<WaitError>() {
        Some(wait_err) if wait_err.is_cancelled() => EXIT_CANCELLED,
        _ => 1,
    }
}
