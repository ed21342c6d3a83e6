//! HTTP client for the upstream dependencies.
//!
//! # Responsibilities
//! - Issue timeout-bound GET requests to a named dependency
//! - Forward the inbound bearer token verbatim
//! - Decode JSON bodies into typed records
//!
//! # Design Decisions
//! - No internal retries: retry and suppression policy belongs to the
//!   breaker layer, this client reports one outcome per call
//! - 404 is split from other non-2xx statuses so callers can tell a
//!   missing entity apart from a dependency outage
//! - Dropping the returned future aborts the in-flight request, so a
//!   cancelled aggregation does not leak upstream work

use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::UpstreamConfig;

/// Logical name of an upstream dependency.
///
/// Used for breaker lookup and endpoint resolution; the set is fixed at
/// compile time because the aggregator only ever talks to these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// The user directory service.
    Directory,
    /// The post store service.
    Posts,
}

impl Dependency {
    /// All known dependencies, for registry construction and reporting.
    pub const ALL: [Dependency; 2] = [Dependency::Directory, Dependency::Posts];

    /// Stable name used in logs, metrics, and breaker keys.
    pub fn name(self) -> &'static str {
        match self {
            Dependency::Directory => "directory",
            Dependency::Posts => "posts",
        }
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure of a single upstream call, carrying the dependency it hit.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("{dependency}: request failed: {source}")]
    Transport {
        dependency: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{dependency}: unexpected status {status}")]
    Status {
        dependency: &'static str,
        status: StatusCode,
    },

    #[error("{dependency}: no resource at {path}")]
    NotFound {
        dependency: &'static str,
        path: String,
    },

    #[error("{dependency}: malformed payload: {source}")]
    Decode {
        dependency: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl UpstreamError {
    /// The dependency this failure belongs to.
    pub fn dependency(&self) -> &'static str {
        match self {
            UpstreamError::Transport { dependency, .. }
            | UpstreamError::Status { dependency, .. }
            | UpstreamError::NotFound { dependency, .. }
            | UpstreamError::Decode { dependency, .. } => dependency,
        }
    }
}

/// Client for the upstream dependencies.
///
/// Holds one shared connection pool; base URLs come from config, one per
/// logical dependency name.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    directory_base: String,
    posts_base: String,
    request_timeout: Duration,
}

impl UpstreamClient {
    /// Create a new client from upstream configuration.
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            directory_base: config.directory_url.trim_end_matches('/').to_string(),
            posts_base: config.posts_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout(),
        }
    }

    fn base(&self, dependency: Dependency) -> &str {
        match dependency {
            Dependency::Directory => &self.directory_base,
            Dependency::Posts => &self.posts_base,
        }
    }

    /// GET `path` from `dependency` and decode the JSON body as `T`.
    ///
    /// `auth` is the inbound `Authorization` header value, forwarded
    /// verbatim when present. Bounded by the configured per-call timeout.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        dependency: Dependency,
        path: &str,
        auth: Option<&str>,
    ) -> Result<T, UpstreamError> {
        let url = format!("{}{}", self.base(dependency), path);
        let name = dependency.name();

        tracing::debug!(dependency = name, url = %url, "Calling upstream");

        let mut request = self.http.get(&url).timeout(self.request_timeout);
        if let Some(token) = auth {
            request = request.header(AUTHORIZATION, token);
        }

        let response = request
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { dependency: name, source })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound {
                dependency: name,
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            return Err(UpstreamError::Status { dependency: name, status });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| UpstreamError::Decode { dependency: name, source })
    }
}
