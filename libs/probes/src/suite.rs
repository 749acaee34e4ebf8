//! Suite-wide settings, read once at suite start.

use fleetcheck_poll::PollSpec;
use serde::Serialize;
use thiserror::Error;

/// Errors from reading suite settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TIMEOUT_SCALE must be a positive integer, got {0:?}")]
    InvalidTimeoutScale(String),
}

/// Platform release to install, from `channel[/version[/head_version]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformRelease {
    pub channel: String,
    pub version: Option<String>,
    pub head_version: Option<String>,
}

impl PlatformRelease {
    /// Parse `channel[/version[/head_version]]`. Segments past the third are
    /// ignored.
    pub fn parse(value: &str) -> Self {
        let mut parts = value.split('/').map(str::to_string);
        Self {
            channel: parts.next().unwrap_or_default(),
            version: parts.next().filter(|s| !s.is_empty()),
            head_version: parts.next().filter(|s| !s.is_empty()),
        }
    }
}

/// Settings shared by every step of a suite run.
///
/// Built once and passed by reference; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteConfig {
    /// Target architecture (`ARCH`).
    pub arch: Option<String>,

    /// Cluster name (`CLUSTER_NAME`).
    pub cluster_name: Option<String>,

    /// Public hostname of the management server (`PUBLIC_DNS`).
    pub management_hostname: Option<String>,

    /// Downstream node image tag, from `INSTALL_K3S_VERSION` with the first
    /// `+` replaced by `-`.
    pub downstream_image_tag: Option<String>,

    /// Release to install (`RANCHER_VERSION`).
    pub release: Option<PlatformRelease>,

    /// Multiplier applied to every poll timeout (`TIMEOUT_SCALE`).
    pub timeout_scale: u32,
}

impl SuiteConfig {
    /// Load settings from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_scale = match get("TIMEOUT_SCALE") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|scale| *scale > 0)
                .ok_or_else(|| ConfigError::InvalidTimeoutScale(raw.clone()))?,
            None => 1,
        };

        Ok(Self {
            arch: get("ARCH"),
            cluster_name: get("CLUSTER_NAME"),
            management_hostname: get("PUBLIC_DNS"),
            downstream_image_tag: get("INSTALL_K3S_VERSION").map(|v| v.replacen('+', "-", 1)),
            release: get("RANCHER_VERSION").map(|v| PlatformRelease::parse(&v)),
            timeout_scale,
        })
    }

    /// Apply the suite timeout scale to `spec`.
    pub fn poll_spec(&self, spec: PollSpec) -> PollSpec {
        spec.scaled(self.timeout_scale)
    }
}
