//! Lazy walker over the paginated release feed.
//!
//! The walk starts at `/v3/releases` and follows each page's
//! `pagination.next` reference until the server stops supplying one. Pages
//! are fetched strictly one at a time: the next request is only issued when
//! the caller asks for the next batch of records.
//!
//! A failed fetch ends the walk quietly, the same way a final page does. An
//! undecodable page or an unresolvable `next` reference is fatal and is
//! yielded once as an error before the walk ends.

use crate::error::SyncError;
use crate::fetch::ResourceFetcher;
use crate::release::{ReleaseRecord, decode_page};
use log::{debug, warn};
use std::iter::FusedIterator;
use url::Url;

/// Feed endpoint, relative to the forge base URL.
pub const RELEASES_ENDPOINT: &str = "/v3/releases";

/// Iterator yielding the records of each feed page in order.
///
/// # Examples
///
/// ```
/// use forge_mirror::fetch::{FetchFailure, ResourceFetcher};
/// use forge_mirror::pagination::ReleasePages;
/// use url::Url;
///
/// struct SinglePage;
///
/// impl ResourceFetcher for SinglePage {
///     fn fetch(&self, _url: &Url) -> Result<Vec<u8>, FetchFailure> {
///         Ok(br#"{"results":[],"pagination":{"next":null}}"#.to_vec())
///     }
/// }
///
/// let base = Url::parse("https://forge.test").unwrap();
/// let pages: Vec<_> = ReleasePages::new(&SinglePage, &base).unwrap().collect();
/// assert_eq!(pages.len(), 1);
/// ```
pub struct ReleasePages<'a> {
    fetcher: &'a dyn ResourceFetcher,
    base: &'a Url,
    cursor: Option<Url>,
    pending: Option<SyncError>,
    pages_fetched: usize,
}

impl<'a> ReleasePages<'a> {
    /// Start a walk at the feed endpoint below `base`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidUrl`] if the endpoint cannot be joined
    /// onto `base`.
    pub fn new(fetcher: &'a dyn ResourceFetcher, base: &'a Url) -> Result<Self, SyncError> {
        let first = base
            .join(RELEASES_ENDPOINT)
            .map_err(|source| SyncError::InvalidUrl {
                reference: RELEASES_ENDPOINT.to_owned(),
                source,
            })?;
        Ok(Self {
            fetcher,
            base,
            cursor: Some(first),
            pending: None,
            pages_fetched: 0,
        })
    }

    /// Number of pages fetched and decoded so far.
    #[must_use]
    pub const fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}

impl Iterator for ReleasePages<'_> {
    type Item = Result<Vec<ReleaseRecord>, SyncError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending.take() {
            return Some(Err(err));
        }
        let url = self.cursor.take()?;

        let body = match self.fetcher.fetch(&url) {
            Ok(body) => body,
            Err(failure) => {
                warn!("stopping release walk: {failure}");
                return None;
            }
        };
        let page = match decode_page(&body) {
            Ok(page) => page,
            Err(source) => {
                return Some(Err(SyncError::Decode {
                    url: url.to_string(),
                    source,
                }));
            }
        };
        self.pages_fetched += 1;
        let (records, next) = page.into_parts();
        debug!(
            "page {} ({url}): {} releases",
            self.pages_fetched,
            records.len()
        );

        if let Some(reference) = next {
            match self.base.join(&reference) {
                Ok(next_url) => self.cursor = Some(next_url),
                Err(source) => self.pending = Some(SyncError::InvalidUrl { reference, source }),
            }
        }
        Some(Ok(records))
    }
}

impl FusedIterator for ReleasePages<'_> {}
