//! Pods command (wait for pods to be Running).

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use fleetcheck_poll::PollSpec;
use fleetcheck_probes::predicate::all_pods_running;
use fleetcheck_probes::{PodCheck, PodPhases, PodReadiness};
use serde::Serialize;
use tabled::Tabled;

use super::{CommandContext, PollArgs};
use crate::output::print_output;

/// Pods command - poll until every selected pod is Running.
#[derive(Debug, Args)]
pub struct PodsCommand {
    #[command(flatten)]
    poll: PollArgs,

    /// Pods to check, as NAMESPACE:SELECTOR. Repeat for several.
    #[arg(long = "check", short = 'c', required = true, value_parser = parse_check)]
    checks: Vec<PodCheck>,

    /// Kubeconfig to use.
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,
}

/// Pod phases for one check.
#[derive(Debug, Clone, Serialize, Tabled)]
struct PodRow {
    #[tabled(rename = "Namespace")]
    namespace: String,

    #[tabled(rename = "Selector")]
    selector: String,

    #[tabled(rename = "Phases")]
    phases: String,
}

impl From<&PodPhases> for PodRow {
    fn from(observed: &PodPhases) -> Self {
        Self {
            namespace: observed.check.namespace.clone(),
            selector: observed.check.selector.clone(),
            phases: observed.phases.join(" "),
        }
    }
}

impl PodsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let operation = self
            .checks
            .iter()
            .map(|c| format!("pods {}:{}", c.namespace, c.selector))
            .collect::<Vec<_>>()
            .join(", ");

        let mut probe = PodReadiness::new(self.checks);
        if let Some(kubeconfig) = self.kubeconfig {
            probe = probe.kubeconfig(kubeconfig);
        }

        let observed = ctx
            .wait_for(
                &operation,
                self.poll.to_spec(PollSpec::workload_ready()),
                probe,
                all_pods_running(),
            )
            .await?;

        let rows: Vec<PodRow> = observed.iter().map(PodRow::from).collect();
        print_output(&rows, ctx.format);
        Ok(())
    }
}

fn parse_check(raw: &str) -> Result<PodCheck, String> {
    PodCheck::parse(raw).ok_or_else(|| format!("'{raw}' is not NAMESPACE:SELECTOR"))
}
