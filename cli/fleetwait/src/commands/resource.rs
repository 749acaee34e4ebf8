//! Resource command (wait for a cluster object field).

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use fleetcheck_poll::PollSpec;
use fleetcheck_probes::predicate::{found, found_containing};
use fleetcheck_probes::ResourceQuery;

use super::{BoxPredicate, CommandContext, PollArgs};

/// Resource command - poll `kubectl get` until a jsonpath value appears.
#[derive(Debug, Args)]
pub struct ResourceCommand {
    #[command(flatten)]
    poll: PollArgs,

    /// Resource kind (e.g. clusters.provisioning.cattle.io).
    #[arg(long)]
    kind: String,

    /// Object name.
    #[arg(long)]
    name: Option<String>,

    /// Namespace.
    #[arg(long, short = 'n')]
    namespace: Option<String>,

    /// Label selector.
    #[arg(long, short = 'l')]
    selector: Option<String>,

    /// Field selector.
    #[arg(long)]
    field_selector: Option<String>,

    /// Jsonpath expression, without the `jsonpath=` prefix.
    #[arg(long)]
    jsonpath: String,

    /// Text the value must contain. Any non-empty value matches if omitted.
    #[arg(long)]
    contains: Option<String>,

    /// Kubeconfig to use.
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,
}

impl ResourceCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let mut query = ResourceQuery::new(&self.kind, &self.jsonpath);
        if let Some(name) = &self.name {
            query = query.named(name);
        }
        if let Some(namespace) = &self.namespace {
            query = query.in_namespace(namespace);
        }
        if let Some(selector) = &self.selector {
            query = query.label_selector(selector);
        }
        if let Some(selector) = &self.field_selector {
            query = query.field_selector(selector);
        }
        if let Some(kubeconfig) = &self.kubeconfig {
            query = query.kubeconfig(kubeconfig);
        }

        let predicate: BoxPredicate<Option<String>> = match self.contains {
            Some(needle) => Box::new(found_containing(needle)),
            None => Box::new(found()),
        };

        let operation = match &self.name {
            Some(name) => format!("{} {name}", self.kind),
            None => self.kind.clone(),
        };
        let value = ctx
            .wait_for(
                &operation,
                self.poll.to_spec(PollSpec::resource_field()),
                query,
                predicate,
            )
            .await?;

        println!("{}", value.unwrap_or_default());
        Ok(())
    }
}
