//! Forge mirror library.
//!
//! This crate walks the Puppet Forge v3 release feed and mirrors each
//! published module artifact into a local directory tree, skipping releases
//! that are already present with a matching checksum or that exceed the
//! configured size limit. It is used by the `forge-mirror` CLI binary and can
//! be driven programmatically with an injected [`fetch::ResourceFetcher`].
//!
//! # Modules
//!
//! - [`checksum`] - MD5 digest newtype and the local "already mirrored" check
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Validated synchronisation configuration
//! - [`error`] - Fatal run errors
//! - [`fetch`] - Blocking HTTP retrieval behind the `ResourceFetcher` trait
//! - [`filter`] - Release size policy
//! - [`output`] - Summary formatting for the CLI
//! - [`pagination`] - Lazy walker over the paginated release feed
//! - [`release`] - Typed decoding of release feed pages
//! - [`sync`] - Per-release orchestration and run summary
//! - [`writer`] - Local artifact layout and atomic file replacement

pub mod checksum;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod output;
pub mod pagination;
pub mod release;
pub mod sync;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod writer;
