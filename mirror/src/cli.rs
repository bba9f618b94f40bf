//! CLI argument definitions for the forge mirror.
//!
//! Parsing lives here so the binary stays focused on orchestration.
//! Validation of the parsed values happens in [`crate::config`].

use crate::config::DEFAULT_FORGE_URL;
use crate::filter::DEFAULT_MAX_SIZE_MB;
use camino::Utf8PathBuf;
use clap::Parser;
use log::LevelFilter;

/// Mirror Puppet Forge release archives into a local directory.
#[derive(Parser, Debug, Clone)]
#[command(name = "forge-mirror")]
#[command(version, about)]
#[command(long_about = concat!(
    "Mirror Puppet Forge release archives into a local directory.\n\n",
    "Every release in the forge's /v3/releases feed is stored as ",
    "<modulepath>/<owner>/<module>/<filename>. Archives whose local MD5 ",
    "already matches the published digest are skipped, so reruns only ",
    "fetch what is new or damaged.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Mirror the public forge:\n",
    "    $ forge-mirror -m /srv/forge\n\n",
    "  Skip anything over 5 MB:\n",
    "    $ forge-mirror -m /srv/forge --max-size 5\n\n",
    "  Preview against a private forge:\n",
    "    $ forge-mirror -m /srv/forge --forge-url https://forge.internal --dry-run\n\n",
    "Set FORGE_MIRROR_LOG (e.g. FORGE_MIRROR_LOG=debug) to control log output.",
))]
pub struct Cli {
    /// Root directory of the mirrored tree.
    #[arg(short = 'm', long = "modulepath", value_name = "DIR")]
    pub module_path: Utf8PathBuf,

    /// Skip releases whose published size exceeds this many megabytes.
    #[arg(long = "max-size", value_name = "MB", default_value_t = DEFAULT_MAX_SIZE_MB)]
    pub max_size_mb: u64,

    /// Base URL of the forge API.
    #[arg(long, value_name = "URL", default_value = DEFAULT_FORGE_URL)]
    pub forge_url: String,

    /// Seconds allowed for opening a connection.
    #[arg(long = "open-timeout", value_name = "SECS", default_value_t = 300)]
    pub open_timeout_secs: u64,

    /// Report what would be downloaded without fetching or writing archives.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Log level requested by the verbosity flags, if any.
    ///
    /// Returns `None` when neither `-v` nor `-q` was given, leaving the
    /// level to the environment.
    #[must_use]
    pub const fn log_level_override(&self) -> Option<LevelFilter> {
        if self.quiet {
            return Some(LevelFilter::Warn);
        }
        match self.verbosity {
            0 => None,
            1 => Some(LevelFilter::Debug),
            _ => Some(LevelFilter::Trace),
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
