//! fleetwait - wait for something in a test environment to become true
//!
//! Wraps the fleetcheck poller so shell-driven suites can retry a command,
//! a cluster query, pod readiness, an installer, an HTTP endpoint or a
//! download until it matches.

use anyhow::Result;
use clap::Parser;

mod commands;
mod error;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.init_tracing();

    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(error::exit_code(&e));
    }

    Ok(())
}
