//! Cmd command (run a program until its output matches).

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use fleetcheck_poll::PollSpec;
use fleetcheck_probes::predicate::{contains, exited_ok};
use fleetcheck_probes::{CommandOutput, CommandProbe, CommandSpec};

use super::{BoxPredicate, CommandContext, PollArgs};

/// Cmd command - retry a program until it passes.
///
/// Without --contains the program must exit 0. With --contains its stdout
/// must contain the text, whatever the exit status, unless
/// --require-success is also given.
#[derive(Debug, Args)]
pub struct CmdCommand {
    #[command(flatten)]
    poll: PollArgs,

    /// Text stdout must contain.
    #[arg(long)]
    contains: Option<String>,

    /// Also require exit status 0.
    #[arg(long)]
    require_success: bool,

    /// Kill a single run after this many seconds.
    #[arg(long, value_parser = super::parse_secs)]
    attempt_timeout: Option<Duration>,

    /// Program and arguments.
    #[arg(required = true, last = true)]
    argv: Vec<String>,
}

impl CmdCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("No program given after --"))?;

        let mut spec = CommandSpec::new(program).args(args.iter().cloned());
        if let Some(timeout) = self.attempt_timeout {
            spec = spec.attempt_timeout(timeout);
        }

        let mut probe = CommandProbe::new(spec);
        if self.require_success {
            probe = probe.require_success();
        }

        let predicate: BoxPredicate<CommandOutput> = match self.contains {
            Some(needle) => Box::new(contains::<CommandOutput>(needle)),
            None => Box::new(exited_ok()),
        };

        let operation = self.argv.join(" ");
        let output = ctx
            .wait_for(
                &operation,
                self.poll.to_spec(PollSpec::command_ready()),
                probe,
                predicate,
            )
            .await?;

        print!("{}", output.stdout);
        Ok(())
    }
}
