//! Cluster state queries through `kubectl get`.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use fleetcheck_poll::{Probe, ProbeOutcome};
use thiserror::Error;

use crate::command::{CommandError, CommandSpec};

/// Default per-attempt timeout for a query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from querying cluster state.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Command(#[from] CommandError),

    /// kubectl ran but failed for a reason other than a missing object.
    #[error("kubectl get {kind} failed: {stderr}")]
    Failed { kind: String, stderr: String },
}

impl QueryError {
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Command(e) => e.is_fatal(),
            Self::Failed { .. } => false,
        }
    }
}

/// A `kubectl get` query producing one jsonpath value.
///
/// Yields `Some(value)` when the output is non-blank and `None` when the
/// object does not exist or the jsonpath selects nothing.
#[derive(Debug, Clone)]
pub struct ResourceQuery {
    binary: String,
    kind: String,
    name: Option<String>,
    namespace: Option<String>,
    label_selector: Option<String>,
    field_selector: Option<String>,
    jsonpath: String,
    kubeconfig: Option<PathBuf>,
    attempt_timeout: Duration,
}

impl ResourceQuery {
    /// Query objects of `kind`, printing `jsonpath` (without the
    /// `jsonpath=` prefix).
    pub fn new(kind: impl Into<String>, jsonpath: impl Into<String>) -> Self {
        Self {
            binary: "kubectl".to_string(),
            kind: kind.into(),
            name: None,
            namespace: None,
            label_selector: None,
            field_selector: None,
            jsonpath: jsonpath.into(),
            kubeconfig: None,
            attempt_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn label_selector(mut self, selector: impl Into<String>) -> Self {
        self.label_selector = Some(selector.into());
        self
    }

    pub fn field_selector(mut self, selector: impl Into<String>) -> Self {
        self.field_selector = Some(selector.into());
        self
    }

    /// Use a specific kubeconfig instead of the inherited `KUBECONFIG`.
    pub fn kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Use another kubectl-compatible binary.
    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// The command this query runs.
    pub fn to_command(&self) -> CommandSpec {
        let mut command = CommandSpec::new(&self.binary)
            .arg("get")
            .arg(&self.kind)
            .attempt_timeout(self.attempt_timeout);

        if let Some(name) = &self.name {
            command = command.arg(name);
        }
        if let Some(namespace) = &self.namespace {
            command = command.args(["--namespace", namespace.as_str()]);
        }
        if let Some(selector) = &self.label_selector {
            command = command.args(["--selector", selector.as_str()]);
        }
        if let Some(selector) = &self.field_selector {
            command = command.args(["--field-selector", selector.as_str()]);
        }
        command = command.args(["-o".to_string(), format!("jsonpath={}", self.jsonpath)]);

        if let Some(kubeconfig) = &self.kubeconfig {
            command = command.env("KUBECONFIG", kubeconfig.display().to_string());
        }
        command
    }

    /// Run the query once.
    pub async fn fetch(&self) -> Result<Option<String>, QueryError> {
        let output = self.to_command().run().await?;

        if output.success() {
            let value = output.stdout.trim();
            return Ok((!value.is_empty()).then(|| value.to_string()));
        }
        if is_not_found(&output.stderr) {
            return Ok(None);
        }
        Err(QueryError::Failed {
            kind: self.kind.clone(),
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// Only the API server's own NotFound counts. Client-side errors such as an
/// unknown kubeconfig context also say "not found" but must be reported.
fn is_not_found(stderr: &str) -> bool {
    stderr.contains("(NotFound)")
}

#[async_trait]
impl Probe for ResourceQuery {
    type Output = Option<String>;
    type Error = QueryError;

    async fn execute(&mut self) -> ProbeOutcome<Option<String>, QueryError> {
        match self.fetch().await {
            Ok(value) => ProbeOutcome::Success(value),
            Err(e) if e.is_fatal() => ProbeOutcome::Fatal(e),
            Err(e) => ProbeOutcome::Transient(e),
        }
    }
}
