//! Fatal errors for a mirror run.
//!
//! Per-release problems (fetch and write failures) never surface here; they
//! are reported as [`crate::sync::ReleaseOutcome`] values and the walk moves
//! on. Only conditions that leave the run without a trustworthy pagination
//! cursor, or that prevent it from starting, are errors.

use crate::config::ConfigError;
use crate::release::PageDecodeError;
use thiserror::Error;

/// Errors that terminate a synchronisation run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A feed page could not be decoded.
    #[error("failed to decode release page from {url}")]
    Decode {
        /// The page URL.
        url: String,
        /// The decode failure.
        #[source]
        source: PageDecodeError,
    },

    /// A feed reference could not be resolved against the forge base URL.
    #[error("cannot resolve {reference:?} against the forge base URL")]
    InvalidUrl {
        /// The reference that failed to resolve.
        reference: String,
        /// The URL parser error.
        #[source]
        source: url::ParseError,
    },
}

/// Errors surfaced by the CLI entrypoint.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The command-line configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The run terminated early.
    #[error("mirror run aborted: {0}")]
    Sync(#[from] SyncError),
}

/// Result type alias using [`MirrorError`].
pub type Result<T> = std::result::Result<T, MirrorError>;
