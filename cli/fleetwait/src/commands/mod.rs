//! CLI commands.

mod cmd;
mod download;
mod helm;
mod http;
mod pods;
mod resource;
mod suite_config;

use std::fmt::{Debug, Display};
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use fleetcheck_poll::{PollSpec, Poller, Predicate, Probe, TracingObserver, WaitError};
use fleetcheck_probes::SuiteConfig;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::output::OutputFormat;

/// fleetwait - retry a check until it passes or time runs out.
#[derive(Debug, Parser)]
#[command(name = "fleetwait")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Emit logs as JSON.
    #[arg(long, global = true, env = "FLEETWAIT_LOG_JSON")]
    log_json: bool,

    /// Output format for tabular results.
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a command until its output matches.
    Cmd(cmd::CmdCommand),

    /// Query a cluster object until a jsonpath value matches.
    Resource(resource::ResourceCommand),

    /// Wait until every pod behind each namespace/selector pair is Running.
    Pods(pods::PodsCommand),

    /// Request an HTTP endpoint until the response matches.
    Http(http::HttpCommand),

    /// Download a URL to a file, retrying until it succeeds.
    Download(download::DownloadCommand),

    /// Run helm until it exits successfully.
    Helm(helm::HelmCommand),

    /// Show the suite settings read from the environment.
    SuiteConfig(suite_config::SuiteConfigCommand),
}

impl Cli {
    /// Install the global tracing subscriber. Logs go to stderr so stdout
    /// only carries the matched value.
    pub fn init_tracing(&self) {
        let json = self.log_json;
        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
            .with(json.then(|| {
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
            }))
            .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
            .init();
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let suite = SuiteConfig::from_env()?;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received interrupt, cancelling");
                let _ = cancel_tx.send(true);
            }
        });

        let ctx = CommandContext {
            suite,
            cancel: cancel_rx,
            format: self.format,
        };

        match self.command {
            Commands::Cmd(cmd) => cmd.run(ctx).await,
            Commands::Resource(cmd) => cmd.run(ctx).await,
            Commands::Pods(cmd) => cmd.run(ctx).await,
            Commands::Http(cmd) => cmd.run(ctx).await,
            Commands::Download(cmd) => cmd.run(ctx).await,
            Commands::Helm(cmd) => cmd.run(ctx).await,
            Commands::SuiteConfig(cmd) => cmd.run(ctx),
        }
    }
}

/// Timing flags shared by every waiting command.
#[derive(Debug, Clone, Args)]
pub struct PollArgs {
    /// Give up after this many seconds (before TIMEOUT_SCALE).
    #[arg(long, value_parser = parse_secs)]
    timeout: Option<Duration>,

    /// Seconds between attempts.
    #[arg(long, value_parser = parse_secs)]
    interval: Option<Duration>,

    /// Seconds to wait before the first attempt.
    #[arg(long, value_parser = parse_secs)]
    initial_delay: Option<Duration>,
}

impl PollArgs {
    /// Overlay the flags on a default profile.
    pub fn to_spec(&self, profile: PollSpec) -> PollSpec {
        PollSpec {
            overall_timeout: self.timeout.unwrap_or(profile.overall_timeout),
            poll_interval: self.interval.unwrap_or(profile.poll_interval),
            initial_delay: self.initial_delay.or(profile.initial_delay),
        }
    }
}

fn parse_secs(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a number of seconds"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("'{raw}': {e}"))
}

/// Shared command context.
pub struct CommandContext {
    pub suite: SuiteConfig,
    pub cancel: watch::Receiver<bool>,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Poll `probe` until `predicate` holds, scaling the timeout by the
    /// suite's TIMEOUT_SCALE and logging each attempt.
    pub async fn wait_for<P, Q>(
        &self,
        operation: &str,
        spec: PollSpec,
        probe: P,
        predicate: Q,
    ) -> Result<P::Output>
    where
        P: Probe,
        P::Output: Debug,
        P::Error: Display,
        Q: Predicate<P::Output>,
    {
        let spec = self.suite.poll_spec(spec);
        info!(
            operation,
            timeout_secs = spec.overall_timeout.as_secs_f64(),
            interval_secs = spec.poll_interval.as_secs_f64(),
            "Waiting"
        );

        let report = Poller::new(spec)
            .cancel_on(self.cancel.clone())
            .observe(TracingObserver::new(operation))
            .run(probe, predicate)
            .await
            .map_err(|source| WaitError::Config {
                operation: operation.to_string(),
                source,
            })?;

        Ok(report.into_result(operation)?)
    }
}

/// Boxed predicate, for commands that choose one from their flags.
pub type BoxPredicate<T> = Box<dyn FnMut(&T) -> bool + Send>;
