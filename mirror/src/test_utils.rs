//! Shared test utilities for the mirror crate.

use crate::checksum::Md5Digest;
use crate::fetch::{FetchFailure, ResourceFetcher};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashMap;
use url::Url;

/// Lowercase hex MD5 of `bytes`.
pub fn md5_hex(bytes: &[u8]) -> String {
    Md5Digest::of_bytes(bytes).as_str().to_owned()
}

/// A release as the forge would publish it, with its archive content.
#[derive(Debug, Clone)]
pub struct ReleaseFixture {
    owner: String,
    module: String,
    version: String,
    content: Vec<u8>,
    file_size: Option<u64>,
    file_md5: Option<String>,
}

impl ReleaseFixture {
    /// Creates a release whose published size and digest match `content`.
    pub fn new(owner: &str, module: &str, version: &str, content: &[u8]) -> Self {
        Self {
            owner: owner.to_owned(),
            module: module.to_owned(),
            version: version.to_owned(),
            content: content.to_vec(),
            file_size: None,
            file_md5: None,
        }
    }

    /// Overrides the published `file_size`.
    #[must_use]
    pub fn with_file_size(mut self, file_size: u64) -> Self {
        self.file_size = Some(file_size);
        self
    }

    /// Overrides the published `file_md5`.
    #[must_use]
    pub fn with_md5(mut self, file_md5: &str) -> Self {
        self.file_md5 = Some(file_md5.to_owned());
        self
    }

    /// Owner username.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Module name.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Archive filename, e.g. `foo-bar-1.2.3.tar.gz`.
    pub fn filename(&self) -> String {
        format!("{}-{}-{}.tar.gz", self.owner, self.module, self.version)
    }

    /// Server-relative archive path.
    pub fn file_uri(&self) -> String {
        format!("/v3/files/{}", self.filename())
    }

    /// Archive bytes served for this release.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// The release object as it appears in a feed page.
    pub fn to_json(&self) -> serde_json::Value {
        let size = self.file_size.unwrap_or_else(|| {
            u64::try_from(self.content.len()).unwrap_or(u64::MAX)
        });
        let md5 = self
            .file_md5
            .clone()
            .unwrap_or_else(|| md5_hex(&self.content));
        json!({
            "uri": format!("/v3/releases/{}-{}-{}", self.owner, self.module, self.version),
            "slug": format!("{}-{}-{}", self.owner, self.module, self.version),
            "version": self.version,
            "file_uri": self.file_uri(),
            "file_size": size,
            "file_md5": md5,
            "module": {
                "name": self.module,
                "slug": format!("{}-{}", self.owner, self.module),
                "owner": { "username": self.owner, "slug": self.owner },
            },
            "metadata": {
                "name": format!("{}-{}", self.owner, self.module),
                "version": self.version,
            },
        })
    }
}

/// Serialises a feed page holding `releases` and pointing at `next`.
pub fn page_json(releases: &[ReleaseFixture], next: Option<&str>) -> String {
    let results: Vec<serde_json::Value> = releases.iter().map(ReleaseFixture::to_json).collect();
    json!({
        "pagination": {
            "limit": 20,
            "offset": 0,
            "next": next,
        },
        "results": results,
    })
    .to_string()
}

/// Path of feed page `index` (zero-based) as linked by [`StubFetcher::with_feed`].
pub fn page_path(index: usize) -> String {
    if index == 0 {
        "/v3/releases".to_owned()
    } else {
        format!("/v3/releases?offset={index}")
    }
}

/// An in-memory [`ResourceFetcher`] that serves canned responses by URL.
///
/// Unregistered URLs answer with HTTP 404. Every request is recorded so
/// tests can assert on what was, and was not, fetched.
#[derive(Debug, Default)]
pub struct StubFetcher {
    responses: HashMap<String, Result<Vec<u8>, FetchFailure>>,
    requests: RefCell<Vec<String>>,
}

impl StubFetcher {
    /// Serves `body` for `url`.
    #[must_use]
    pub fn with_body(mut self, url: &str, body: impl AsRef<[u8]>) -> Self {
        self.responses
            .insert(normalise(url), Ok(body.as_ref().to_vec()));
        self
    }

    /// Answers `url` with the given HTTP status.
    #[must_use]
    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        let key = normalise(url);
        self.responses.insert(
            key.clone(),
            Err(FetchFailure::Status { url: key, status }),
        );
        self
    }

    /// Serves a feed below `base`: one page per slice, linked in order,
    /// plus the archive of every release.
    #[must_use]
    pub fn with_feed(mut self, base: &str, pages: &[Vec<ReleaseFixture>]) -> Self {
        for (index, releases) in pages.iter().enumerate() {
            let next = (index + 1 < pages.len()).then(|| page_path(index + 1));
            let url = join(base, &page_path(index));
            self = self.with_body(&url, page_json(releases, next.as_deref()));
            for release in releases {
                self = self.with_release(base, release);
            }
        }
        self
    }

    /// Serves the archive of `release` at its `file_uri` below `base`.
    #[must_use]
    pub fn with_release(self, base: &str, release: &ReleaseFixture) -> Self {
        let url = join(base, &release.file_uri());
        self.with_body(&url, release.content())
    }

    /// All requested URLs, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// How many times `url` was requested.
    pub fn request_count(&self, url: &str) -> usize {
        let key = normalise(url);
        self.requests.borrow().iter().filter(|r| **r == key).count()
    }

    /// Forgets recorded requests, keeping the canned responses.
    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }
}

impl ResourceFetcher for StubFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchFailure> {
        let key = url.to_string();
        self.requests.borrow_mut().push(key.clone());
        self.responses
            .get(&key)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchFailure::Status {
                    url: key,
                    status: 404,
                })
            })
    }
}

fn normalise(url: &str) -> String {
    Url::parse(url).map_or_else(|_| url.to_owned(), |parsed| parsed.to_string())
}

fn join(base: &str, reference: &str) -> String {
    Url::parse(base)
        .and_then(|parsed| parsed.join(reference))
        .map_or_else(|_| format!("{base}{reference}"), |joined| joined.to_string())
}
