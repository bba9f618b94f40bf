//! Validated configuration for a mirror run.
//!
//! [`SyncConfig`] is built once from the command line and passed by
//! reference into every component; nothing in the core reads global state.

use crate::cli::Cli;
use crate::fetch::DEFAULT_OPEN_TIMEOUT;
use crate::filter::SizePolicy;
use camino::{Utf8Path, Utf8PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// The public Puppet Forge API.
pub const DEFAULT_FORGE_URL: &str = "https://forgeapi.puppetlabs.com";

/// Errors arising from invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The forge URL could not be parsed.
    #[error("invalid forge URL \"{value}\": {source}")]
    InvalidUrl {
        /// The rejected URL string.
        value: String,
        /// The URL parser error.
        #[source]
        source: url::ParseError,
    },

    /// The forge URL does not use HTTP or HTTPS.
    #[error("unsupported forge URL scheme \"{scheme}\"; expected http or https")]
    UnsupportedScheme {
        /// The rejected scheme.
        scheme: String,
    },

    /// The module path is empty.
    #[error("module path must not be empty")]
    EmptyModulePath,

    /// The maximum size in megabytes does not fit in a byte count.
    #[error("maximum size of {megabytes} MB is too large")]
    MaxSizeOverflow {
        /// The rejected megabyte count.
        megabytes: u64,
    },
}

/// Everything the synchronisation core needs to know about a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    forge_base_url: Url,
    modules_root: Utf8PathBuf,
    size_policy: SizePolicy,
    open_timeout: Duration,
    dry_run: bool,
}

impl SyncConfig {
    /// Create a configuration with the default open timeout and dry run off.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedScheme`] unless the base URL is
    /// `http` or `https`, and [`ConfigError::EmptyModulePath`] for an empty
    /// module root.
    ///
    /// # Examples
    ///
    /// ```
    /// use forge_mirror::config::SyncConfig;
    /// use forge_mirror::filter::SizePolicy;
    /// use url::Url;
    ///
    /// let base = Url::parse("https://forgeapi.puppetlabs.com").unwrap();
    /// let config = SyncConfig::new(base, "/srv/forge".into(), SizePolicy::default()).unwrap();
    /// assert!(!config.dry_run());
    /// ```
    pub fn new(
        forge_base_url: Url,
        modules_root: Utf8PathBuf,
        size_policy: SizePolicy,
    ) -> Result<Self, ConfigError> {
        if !matches!(forge_base_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme {
                scheme: forge_base_url.scheme().to_owned(),
            });
        }
        if modules_root.as_str().is_empty() {
            return Err(ConfigError::EmptyModulePath);
        }
        Ok(Self {
            forge_base_url,
            modules_root,
            size_policy,
            open_timeout: DEFAULT_OPEN_TIMEOUT,
            dry_run: false,
        })
    }

    /// Set the bound on opening a connection.
    #[must_use]
    pub const fn with_open_timeout(mut self, open_timeout: Duration) -> Self {
        self.open_timeout = open_timeout;
        self
    }

    /// Enable or disable dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Base URL every feed and file reference is resolved against.
    #[must_use]
    pub const fn forge_base_url(&self) -> &Url {
        &self.forge_base_url
    }

    /// Root of the mirrored tree.
    #[must_use]
    pub fn modules_root(&self) -> &Utf8Path {
        &self.modules_root
    }

    /// Size limit applied to each release.
    #[must_use]
    pub const fn size_policy(&self) -> SizePolicy {
        self.size_policy
    }

    /// Bound on opening a connection.
    #[must_use]
    pub const fn open_timeout(&self) -> Duration {
        self.open_timeout
    }

    /// Whether artifacts are only reported, not fetched or written.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }
}

impl TryFrom<&Cli> for SyncConfig {
    type Error = ConfigError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        let forge_base_url =
            Url::parse(&cli.forge_url).map_err(|source| ConfigError::InvalidUrl {
                value: cli.forge_url.clone(),
                source,
            })?;
        let size_policy = SizePolicy::from_megabytes(cli.max_size_mb).ok_or(
            ConfigError::MaxSizeOverflow {
                megabytes: cli.max_size_mb,
            },
        )?;
        Ok(
            Self::new(forge_base_url, cli.module_path.clone(), size_policy)?
                .with_open_timeout(Duration::from_secs(cli.open_timeout_secs))
                .with_dry_run(cli.dry_run),
        )
    }
}
