//! Output formatting for the mirror CLI.
//!
//! Progress is reported through the `log` facade; this module only formats
//! the closing summary printed to stderr.

use crate::sync::SyncSummary;
use camino::Utf8Path;
use std::fmt::Display;
use std::io::Write;

/// Write a line to stderr, ignoring failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format the end-of-run summary.
///
/// # Example
///
/// ```
/// use camino::Utf8Path;
/// use forge_mirror::output::summary_message;
/// use forge_mirror::sync::SyncSummary;
///
/// let message = summary_message(&SyncSummary::default(), Utf8Path::new("/srv/forge"));
/// assert!(message.starts_with("Mirrored 0 releases"));
/// ```
#[must_use]
pub fn summary_message(summary: &SyncSummary, modules_root: &Utf8Path) -> String {
    let mut lines = vec![format!(
        "Mirrored {} {} from {} {} into {modules_root}",
        summary.releases(),
        plural(summary.releases(), "release", "releases"),
        summary.pages(),
        plural(summary.pages(), "page", "pages"),
    )];

    if summary.would_download() > 0 {
        lines.push(format!("  would download: {}", summary.would_download()));
    } else {
        lines.push(format!(
            "  downloaded:     {} ({} bytes)",
            summary.downloaded(),
            summary.bytes_downloaded()
        ));
    }
    lines.push(format!(
        "  up to date:     {}",
        summary.skipped_checksum_match()
    ));
    lines.push(format!("  too large:      {}", summary.skipped_too_large()));
    if summary.failures() > 0 {
        lines.push(format!(
            "  failed:         {} (fetch {}, write {})",
            summary.failures(),
            summary.failed_fetch(),
            summary.failed_write()
        ));
    }
    lines.join("\n")
}

const fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}
