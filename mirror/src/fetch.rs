//! Blocking HTTP retrieval for feed pages and release artifacts.
//!
//! Provides a trait-based abstraction over a single GET request so that the
//! pagination walker and the sync orchestrator can be exercised without
//! network access.

use std::io::Read;
use std::time::Duration;
use url::Url;

/// Default bound on opening a connection to the forge.
///
/// Only connection establishment is bounded; transfers may take as long as
/// they need.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(300);

/// Trait for fetching a resource from an absolute URL.
///
/// # Examples
///
/// ```no_run
/// use forge_mirror::fetch::{DEFAULT_OPEN_TIMEOUT, HttpFetcher, ResourceFetcher};
/// use url::Url;
///
/// let fetcher = HttpFetcher::new(DEFAULT_OPEN_TIMEOUT);
/// let url = Url::parse("https://forgeapi.puppetlabs.com/v3/releases").unwrap();
/// let body = fetcher.fetch(&url);
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ResourceFetcher {
    /// Fetch `url` and return the full response body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchFailure::Status`] for any response other than 200 and
    /// [`FetchFailure::Transport`] when the request could not be completed.
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchFailure>;
}

/// Recoverable failures of a single fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    /// The server answered with a status other than 200.
    #[error("HTTP {status} for {url}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code returned.
        status: u16,
    },

    /// The request failed below HTTP (DNS, connect, TLS, body read).
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// A server-supplied reference could not be resolved to a URL.
    #[error("cannot resolve {reference:?} to a download URL: {reason}")]
    InvalidUrl {
        /// The reference as published by the server.
        reference: String,
        /// Why resolution failed.
        reason: String,
    },
}

/// HTTP-based fetcher using a `ureq` agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Build a fetcher whose connection attempts give up after `open_timeout`.
    #[must_use]
    pub fn new(open_timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(open_timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_OPEN_TIMEOUT)
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchFailure> {
        let response = self
            .agent
            .get(url.as_str())
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(FetchFailure::Status {
                url: url.to_string(),
                status,
            });
        }

        // `as_reader` is not subject to the default body size limit.
        let mut bytes = Vec::new();
        response
            .into_body()
            .as_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| FetchFailure::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(bytes)
    }
}

/// Map a ureq error to a [`FetchFailure`].
fn map_ureq_error(url: &Url, err: &ureq::Error) -> FetchFailure {
    match err {
        ureq::Error::StatusCode(status) => FetchFailure::Status {
            url: url.to_string(),
            status: *status,
        },
        other => FetchFailure::Transport {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}
