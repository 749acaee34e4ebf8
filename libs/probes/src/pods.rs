//! Pod readiness across a list of namespace/selector pairs.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use fleetcheck_poll::{Probe, ProbeOutcome};

use crate::kubectl::{QueryError, ResourceQuery, DEFAULT_QUERY_TIMEOUT};

const PHASE_JSONPATH: &str = "{.items[*].status.phase}";

/// Pods selected by a label selector in one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodCheck {
    pub namespace: String,
    pub selector: String,
}

impl PodCheck {
    pub fn new(namespace: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            selector: selector.into(),
        }
    }

    /// Parse `NAMESPACE:SELECTOR`. The selector may itself contain `:`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (namespace, selector) = raw.split_once(':')?;
        if namespace.is_empty() || selector.is_empty() {
            return None;
        }
        Some(Self::new(namespace, selector))
    }
}

/// Phases observed for one [`PodCheck`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodPhases {
    pub check: PodCheck,
    pub phases: Vec<String>,
}

impl PodPhases {
    /// At least one pod matched and every matched pod is `Running`.
    pub fn all_running(&self) -> bool {
        !self.phases.is_empty() && self.phases.iter().all(|phase| phase == "Running")
    }
}

/// Probe reading pod phases for every check in a list.
///
/// Each attempt queries every check in order and yields all of them, so the
/// predicate sees the full picture. Any failing query fails the attempt.
#[derive(Debug, Clone)]
pub struct PodReadiness {
    checks: Vec<PodCheck>,
    binary: String,
    kubeconfig: Option<PathBuf>,
    attempt_timeout: Duration,
}

impl PodReadiness {
    pub fn new(checks: impl IntoIterator<Item = PodCheck>) -> Self {
        Self {
            checks: checks.into_iter().collect(),
            binary: "kubectl".to_string(),
            kubeconfig: None,
            attempt_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    /// Use another kubectl-compatible binary.
    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn query(&self, check: &PodCheck) -> ResourceQuery {
        let mut query = ResourceQuery::new("pods", PHASE_JSONPATH)
            .in_namespace(&check.namespace)
            .label_selector(&check.selector)
            .attempt_timeout(self.attempt_timeout)
            .binary(&self.binary);
        if let Some(kubeconfig) = &self.kubeconfig {
            query = query.kubeconfig(kubeconfig);
        }
        query
    }

    /// Read the phases for every check once.
    pub async fn fetch(&self) -> Result<Vec<PodPhases>, QueryError> {
        let mut observed = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            let value = self.query(check).fetch().await?;
            observed.push(PodPhases {
                check: check.clone(),
                phases: value
                    .as_deref()
                    .unwrap_or_default()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
            });
        }
        Ok(observed)
    }
}

#[async_trait]
impl Probe for PodReadiness {
    type Output = Vec<PodPhases>;
    type Error = QueryError;

    async fn execute(&mut self) -> ProbeOutcome<Vec<PodPhases>, QueryError> {
        match self.fetch().await {
            Ok(observed) => ProbeOutcome::Success(observed),
            Err(e) if e.is_fatal() => ProbeOutcome::Fatal(e),
            Err(e) => ProbeOutcome::Transient(e),
        }
    }
}
