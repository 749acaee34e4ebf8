//! HTTP endpoint and download probes.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use fleetcheck_poll::{Probe, ProbeOutcome};
use thiserror::Error;
use tracing::debug;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from probing an endpoint.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request is malformed (bad URL, unsupported scheme).
    #[error("invalid request to {url}: {source}")]
    InvalidRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The request failed in flight (connection refused, timeout, reset).
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A download got a non-2xx response.
    #[error("GET {url} returned {status}")]
    Status { url: String, status: u16 },

    /// The downloaded body could not be saved.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn build_client(
    insecure: bool,
    request_timeout: Duration,
) -> Result<reqwest::Client, EndpointError> {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(insecure)
        .timeout(request_timeout)
        .build()
        .map_err(EndpointError::Client)
}

/// Malformed requests are fatal; everything else may clear up on retry.
fn request_failure<T>(url: &str, source: reqwest::Error) -> ProbeOutcome<T, EndpointError> {
    if source.is_builder() {
        ProbeOutcome::Fatal(EndpointError::InvalidRequest {
            url: url.to_string(),
            source,
        })
    } else {
        ProbeOutcome::Transient(EndpointError::Request {
            url: url.to_string(),
            source,
        })
    }
}

/// Status and body of an endpoint response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResponse {
    pub status: u16,
    pub body: String,
}

impl AsRef<str> for EndpointResponse {
    fn as_ref(&self) -> &str {
        &self.body
    }
}

/// Probe issuing one GET per attempt.
///
/// Any HTTP response, including 4xx and 5xx, is a value for the predicate.
/// Only failures to get a response at all are errors.
#[derive(Debug, Clone)]
pub struct EndpointProbe {
    url: String,
    client: reqwest::Client,
}

impl EndpointProbe {
    /// Create a probe for `url`.
    ///
    /// `insecure` skips certificate verification, for endpoints serving a
    /// self-signed certificate before trust is established.
    pub fn new(
        url: impl Into<String>,
        insecure: bool,
        request_timeout: Duration,
    ) -> Result<Self, EndpointError> {
        Ok(Self {
            url: url.into(),
            client: build_client(insecure, request_timeout)?,
        })
    }

    async fn fetch(&self) -> Result<EndpointResponse, reqwest::Error> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(EndpointResponse { status, body })
    }
}

#[async_trait]
impl Probe for EndpointProbe {
    type Output = EndpointResponse;
    type Error = EndpointError;

    async fn execute(&mut self) -> ProbeOutcome<EndpointResponse, EndpointError> {
        match self.fetch().await {
            Ok(response) => {
                debug!(url = %self.url, status = response.status, "Endpoint responded");
                ProbeOutcome::Success(response)
            }
            Err(source) => request_failure(&self.url, source),
        }
    }
}

/// A file saved by [`DownloadProbe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Probe fetching a URL and saving the body to a file.
///
/// A non-2xx response is retried and leaves the destination untouched. A
/// destination that cannot be written is fatal.
#[derive(Debug, Clone)]
pub struct DownloadProbe {
    url: String,
    destination: PathBuf,
    client: reqwest::Client,
}

impl DownloadProbe {
    pub fn new(
        url: impl Into<String>,
        destination: impl Into<PathBuf>,
        insecure: bool,
        request_timeout: Duration,
    ) -> Result<Self, EndpointError> {
        Ok(Self {
            url: url.into(),
            destination: destination.into(),
            client: build_client(insecure, request_timeout)?,
        })
    }
}

#[async_trait]
impl Probe for DownloadProbe {
    type Output = Download;
    type Error = EndpointError;

    async fn execute(&mut self) -> ProbeOutcome<Download, EndpointError> {
        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(source) => return request_failure(&self.url, source),
        };

        let status = response.status();
        if !status.is_success() {
            return ProbeOutcome::Transient(EndpointError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(source) => return request_failure(&self.url, source),
        };

        if let Err(source) = tokio::fs::write(&self.destination, &body).await {
            return ProbeOutcome::Fatal(EndpointError::Write {
                path: self.destination.clone(),
                source,
            });
        }

        debug!(
            url = %self.url,
            path = %self.destination.display(),
            bytes = body.len(),
            "Downloaded"
        );
        ProbeOutcome::Success(Download {
            path: self.destination.clone(),
            bytes: body.len() as u64,
        })
    }
}
