//! Chart installer invocations.

use std::time::Duration;

use async_trait::async_trait;
use fleetcheck_poll::{Probe, ProbeOutcome};

use crate::command::{CommandError, CommandOutput, CommandProbe, CommandSpec};

/// Default per-attempt timeout. Installs run with `--wait`, so this is long.
pub const DEFAULT_HELM_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// One `helm` invocation with a fixed flag list.
///
/// Succeeds when helm exits 0; any other exit is retried. The flags must
/// describe an idempotent operation (`upgrade --install`, `repo add`).
#[derive(Debug, Clone)]
pub struct HelmInvocation {
    inner: CommandProbe,
}

impl HelmInvocation {
    pub fn new<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_binary("helm", flags)
    }

    /// Use another helm-compatible binary.
    pub fn with_binary<I, S>(binary: impl Into<String>, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = CommandSpec::new(binary)
            .args(flags)
            .attempt_timeout(DEFAULT_HELM_TIMEOUT);
        Self {
            inner: CommandProbe::new(spec).require_success(),
        }
    }

    /// `helm repo add NAME URL`.
    pub fn repo_add(name: &str, url: &str) -> Self {
        Self::new(["repo", "add", name, url])
    }

    /// `helm repo update`.
    pub fn repo_update() -> Self {
        Self::new(["repo", "update"])
    }

    /// The command each attempt runs.
    pub fn command(&self) -> &CommandSpec {
        self.inner.command()
    }
}

#[async_trait]
impl Probe for HelmInvocation {
    type Output = CommandOutput;
    type Error = CommandError;

    async fn execute(&mut self) -> ProbeOutcome<CommandOutput, CommandError> {
        self.inner.execute().await
    }
}
