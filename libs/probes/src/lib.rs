//! Probes for fleetcheck polls.
//!
//! Each collaborator a suite waits on is a [`Probe`](fleetcheck_poll::Probe):
//!
//! - [`CommandProbe`]: any external program
//! - [`ResourceQuery`]: a `kubectl get` jsonpath value, or "not found"
//! - [`HelmInvocation`]: a chart installer command with a flag list
//! - [`PodReadiness`]: every pod behind a list of namespace/selector pairs
//! - [`EndpointProbe`]: an HTTP GET
//! - [`DownloadProbe`]: an HTTP GET saved to a file
//!
//! [`predicate`] holds the matching acceptance tests and [`SuiteConfig`] the
//! settings shared by a whole suite run.

pub mod command;
pub mod helm;
pub mod http;
pub mod kubectl;
pub mod pods;
pub mod predicate;
pub mod suite;

pub use command::{CommandError, CommandOutput, CommandProbe, CommandSpec};
pub use helm::HelmInvocation;
pub use http::{Download, DownloadProbe, EndpointError, EndpointProbe, EndpointResponse};
pub use kubectl::{QueryError, ResourceQuery};
pub use pods::{PodCheck, PodPhases, PodReadiness};
pub use suite::{ConfigError, PlatformRelease, SuiteConfig};
