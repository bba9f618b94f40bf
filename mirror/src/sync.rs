//! Release synchronisation orchestrator.
//!
//! Walks the release feed and, for every record, applies the size policy,
//! consults the checksum gate, then downloads and writes the archive. Each
//! release ends in exactly one [`ReleaseOutcome`]. Failures of a single
//! release are logged and counted; they never stop the walk. Only fatal
//! pagination errors end the run early.

use crate::checksum::should_skip;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::fetch::{FetchFailure, HttpFetcher, ResourceFetcher};
use crate::pagination::ReleasePages;
use crate::release::ReleaseRecord;
use crate::writer::{WriteFailure, artifact_path, write_artifact};
use log::{debug, info, warn};

/// What happened to a single release.
#[derive(Debug)]
pub enum ReleaseOutcome {
    /// The archive was fetched and written.
    Downloaded {
        /// Number of bytes written.
        bytes: u64,
    },
    /// Dry run: the archive would have been fetched and written.
    WouldDownload,
    /// A local file already matches the published digest.
    SkippedChecksumMatch,
    /// The published size exceeds the configured limit.
    SkippedTooLarge,
    /// The archive could not be fetched.
    FailedFetch(FetchFailure),
    /// The archive could not be written locally.
    FailedWrite(WriteFailure),
}

impl ReleaseOutcome {
    /// Return true for the two failure outcomes.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::FailedFetch(_) | Self::FailedWrite(_))
    }
}

/// Counts of outcomes over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pages: usize,
    downloaded: usize,
    would_download: usize,
    skipped_checksum_match: usize,
    skipped_too_large: usize,
    failed_fetch: usize,
    failed_write: usize,
    bytes_downloaded: u64,
}

impl SyncSummary {
    /// Add one release outcome to the tally.
    pub fn record(&mut self, outcome: &ReleaseOutcome) {
        match outcome {
            ReleaseOutcome::Downloaded { bytes } => {
                self.downloaded += 1;
                self.bytes_downloaded = self.bytes_downloaded.saturating_add(*bytes);
            }
            ReleaseOutcome::WouldDownload => self.would_download += 1,
            ReleaseOutcome::SkippedChecksumMatch => self.skipped_checksum_match += 1,
            ReleaseOutcome::SkippedTooLarge => self.skipped_too_large += 1,
            ReleaseOutcome::FailedFetch(_) => self.failed_fetch += 1,
            ReleaseOutcome::FailedWrite(_) => self.failed_write += 1,
        }
    }

    /// Feed pages fetched and decoded.
    #[must_use]
    pub const fn pages(&self) -> usize {
        self.pages
    }

    /// Releases written to disk.
    #[must_use]
    pub const fn downloaded(&self) -> usize {
        self.downloaded
    }

    /// Releases a dry run would have written.
    #[must_use]
    pub const fn would_download(&self) -> usize {
        self.would_download
    }

    /// Releases already present with a matching digest.
    #[must_use]
    pub const fn skipped_checksum_match(&self) -> usize {
        self.skipped_checksum_match
    }

    /// Releases rejected by the size policy.
    #[must_use]
    pub const fn skipped_too_large(&self) -> usize {
        self.skipped_too_large
    }

    /// Releases whose archive could not be fetched.
    #[must_use]
    pub const fn failed_fetch(&self) -> usize {
        self.failed_fetch
    }

    /// Releases whose archive could not be written.
    #[must_use]
    pub const fn failed_write(&self) -> usize {
        self.failed_write
    }

    /// Total bytes written.
    #[must_use]
    pub const fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded
    }

    /// Every release seen, whatever its outcome.
    #[must_use]
    pub const fn releases(&self) -> usize {
        self.downloaded
            + self.would_download
            + self.skipped_checksum_match
            + self.skipped_too_large
            + self.failed_fetch
            + self.failed_write
    }

    /// Releases that failed to fetch or write.
    #[must_use]
    pub const fn failures(&self) -> usize {
        self.failed_fetch + self.failed_write
    }
}

/// Mirror every release in the feed using the production HTTP fetcher.
///
/// # Errors
///
/// Returns a [`SyncError`] when a feed page cannot be decoded or a feed
/// reference cannot be resolved. Per-release failures are not errors.
pub fn sync_releases(config: &SyncConfig) -> Result<SyncSummary, SyncError> {
    let fetcher = HttpFetcher::new(config.open_timeout());
    sync_releases_with(config, &fetcher)
}

/// Testable inner function with an injected fetcher.
///
/// The production entry point [`sync_releases`] delegates here with a real
/// HTTP fetcher; tests inject stubs.
///
/// # Errors
///
/// See [`sync_releases`].
pub fn sync_releases_with(
    config: &SyncConfig,
    fetcher: &dyn ResourceFetcher,
) -> Result<SyncSummary, SyncError> {
    let mut summary = SyncSummary::default();
    let mut pages = ReleasePages::new(fetcher, config.forge_base_url())?;

    for batch in pages.by_ref() {
        for record in batch? {
            let outcome = mirror_release(config, fetcher, &record);
            report_outcome(&record, &outcome);
            summary.record(&outcome);
        }
    }

    summary.pages = pages.pages_fetched();
    Ok(summary)
}

/// Bring a single release up to date.
#[must_use]
pub fn mirror_release(
    config: &SyncConfig,
    fetcher: &dyn ResourceFetcher,
    record: &ReleaseRecord,
) -> ReleaseOutcome {
    if !config.size_policy().accept(record) {
        return ReleaseOutcome::SkippedTooLarge;
    }

    let path = match artifact_path(config.modules_root(), record) {
        Ok(path) => path,
        Err(failure) => return ReleaseOutcome::FailedWrite(failure),
    };

    if should_skip(&path, record.file_md5()) {
        return ReleaseOutcome::SkippedChecksumMatch;
    }

    if config.dry_run() {
        return ReleaseOutcome::WouldDownload;
    }

    let url = match config.forge_base_url().join(record.file_uri()) {
        Ok(url) => url,
        Err(err) => {
            return ReleaseOutcome::FailedFetch(FetchFailure::InvalidUrl {
                reference: record.file_uri().to_owned(),
                reason: err.to_string(),
            });
        }
    };

    info!("downloading {url}");
    let bytes = match fetcher.fetch(&url) {
        Ok(bytes) => bytes,
        Err(failure) => return ReleaseOutcome::FailedFetch(failure),
    };

    match write_artifact(&path, &bytes) {
        Ok(()) => ReleaseOutcome::Downloaded {
            bytes: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
        },
        Err(failure) => ReleaseOutcome::FailedWrite(failure),
    }
}

fn report_outcome(record: &ReleaseRecord, outcome: &ReleaseOutcome) {
    let name = record.release_name();
    match outcome {
        ReleaseOutcome::Downloaded { bytes } => {
            debug!("wrote {} ({bytes} bytes)", record.filename());
        }
        ReleaseOutcome::WouldDownload => info!("would download {}", record.file_uri()),
        ReleaseOutcome::SkippedChecksumMatch => debug!("{} is up to date", record.filename()),
        ReleaseOutcome::SkippedTooLarge => info!(
            "{name} is too big ({} bytes), skipping",
            record.file_size()
        ),
        ReleaseOutcome::FailedFetch(failure) => warn!("skipping {name}: {failure}"),
        ReleaseOutcome::FailedWrite(failure) => warn!("skipping {name}: {failure}"),
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
