//! Helm command (retry an installer invocation).

use anyhow::Result;
use clap::Args;
use fleetcheck_poll::{accept_any, PollSpec};
use fleetcheck_probes::HelmInvocation;

use super::{CommandContext, PollArgs};

/// Helm command - run helm with the given flags until it exits 0.
#[derive(Debug, Args)]
pub struct HelmCommand {
    #[command(flatten)]
    pub(super) poll: PollArgs,

    /// Flags passed to helm.
    #[arg(required = true, last = true)]
    pub(super) flags: Vec<String>,
}

impl HelmCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let operation = format!("helm {}", self.flags.join(" "));
        let output = ctx
            .wait_for(
                &operation,
                self.poll.to_spec(PollSpec::installer()),
                HelmInvocation::new(self.flags),
                accept_any(),
            )
            .await?;

        print!("{}", output.stdout);
        Ok(())
    }
}
