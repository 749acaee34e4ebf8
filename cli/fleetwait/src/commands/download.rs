//! Download command (fetch a file, retrying until it succeeds).

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use fleetcheck_poll::{accept_any, PollSpec};
use fleetcheck_probes::http::DEFAULT_REQUEST_TIMEOUT;
use fleetcheck_probes::DownloadProbe;

use super::{CommandContext, PollArgs};

/// Download command - save a URL to a file once it answers 2xx.
#[derive(Debug, Args)]
pub struct DownloadCommand {
    #[command(flatten)]
    poll: PollArgs,

    /// URL to fetch.
    #[arg(long)]
    url: String,

    /// File to write.
    #[arg(long)]
    output: PathBuf,

    /// Skip TLS certificate verification.
    #[arg(long, short = 'k')]
    insecure: bool,
}

impl DownloadCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let probe =
            DownloadProbe::new(&self.url, &self.output, self.insecure, DEFAULT_REQUEST_TIMEOUT)?;

        let download = ctx
            .wait_for(
                &format!("download {}", self.url),
                self.poll.to_spec(PollSpec::resource_field()),
                probe,
                accept_any(),
            )
            .await?;

        println!("{} ({} bytes)", download.path.display(), download.bytes);
        Ok(())
    }
}
