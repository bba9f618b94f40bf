//! Typed decoding of release feed pages.
//!
//! The forge returns each page of `/v3/releases` as a JSON object with a
//! `results` array and a `pagination` object. Only the fields the mirror
//! needs are modelled; unknown fields are ignored, but a missing or
//! mistyped required field fails the whole page so that schema drift is
//! noticed instead of silently mirroring the wrong thing.

use crate::checksum::Md5Digest;
use serde::Deserialize;

/// Errors arising from page decoding.
#[derive(Debug, thiserror::Error)]
pub enum PageDecodeError {
    /// JSON deserialisation or field validation failed.
    #[error("release page decode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A release record rejected during decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// The last segment of `file_uri` is empty, so no filename can be derived.
    #[error("file_uri {file_uri:?} does not end in a filename")]
    EmptyFilename {
        /// The offending URI.
        file_uri: String,
    },
}

/// One published module release from the feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "WireRelease")]
pub struct ReleaseRecord {
    module_name: String,
    owner_username: String,
    file_uri: String,
    file_md5: Md5Digest,
    file_size: u64,
    release_name: String,
}

impl ReleaseRecord {
    /// Module name, scoped to its owner.
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Username of the publishing owner.
    #[must_use]
    pub fn owner_username(&self) -> &str {
        &self.owner_username
    }

    /// Server-relative path of the release archive.
    #[must_use]
    pub fn file_uri(&self) -> &str {
        &self.file_uri
    }

    /// Digest published by the forge for the archive.
    #[must_use]
    pub const fn file_md5(&self) -> &Md5Digest {
        &self.file_md5
    }

    /// Published archive size in bytes.
    #[must_use]
    pub const fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Display name of the release, used only in log output.
    #[must_use]
    pub fn release_name(&self) -> &str {
        &self.release_name
    }

    /// Local filename: the final path segment of [`Self::file_uri`].
    ///
    /// # Examples
    ///
    /// ```
    /// use forge_mirror::release::decode_page;
    ///
    /// let body = concat!(
    ///     r#"{"results":[{"file_size":3,"file_uri":"/v3/files/foo-bar-1.2.3.tar.gz","#,
    ///     r#""file_md5":"5eb63bbbe01eeed093cb22bb8f5acdc3","#,
    ///     r#""module":{"name":"bar","owner":{"username":"foo"}},"#,
    ///     r#""metadata":{"name":"foo-bar"}}],"pagination":{"next":null}}"#,
    /// );
    /// let page = decode_page(body.as_bytes()).expect("valid page");
    /// assert_eq!(page.results()[0].filename(), "foo-bar-1.2.3.tar.gz");
    /// ```
    #[must_use]
    pub fn filename(&self) -> &str {
        last_segment(&self.file_uri)
    }
}

/// One decoded page of the release feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "WirePage")]
pub struct Page {
    results: Vec<ReleaseRecord>,
    next: Option<String>,
}

impl Page {
    /// Records on this page, in server order.
    #[must_use]
    pub fn results(&self) -> &[ReleaseRecord] {
        &self.results
    }

    /// Reference to the next page, or `None` on the final page.
    #[must_use]
    pub fn next(&self) -> Option<&str> {
        self.next.as_deref()
    }

    /// Split the page into its records and next-page reference.
    #[must_use]
    pub fn into_parts(self) -> (Vec<ReleaseRecord>, Option<String>) {
        (self.results, self.next)
    }
}

/// Decode a response body into a [`Page`].
///
/// # Errors
///
/// Returns an error if the body is not JSON, a required field is missing or
/// mistyped, a digest is malformed, or a `file_uri` has no filename.
pub fn decode_page(body: &[u8]) -> Result<Page, PageDecodeError> {
    Ok(serde_json::from_slice(body)?)
}

fn last_segment(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

#[derive(Deserialize)]
struct WirePage {
    results: Vec<ReleaseRecord>,
    pagination: WirePagination,
}

#[derive(Deserialize)]
struct WirePagination {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Deserialize)]
struct WireRelease {
    file_size: u64,
    file_uri: String,
    file_md5: Md5Digest,
    module: WireModule,
    #[serde(default)]
    metadata: Option<WireMetadata>,
}

#[derive(Deserialize)]
struct WireModule {
    name: String,
    owner: WireOwner,
}

#[derive(Deserialize)]
struct WireOwner {
    username: String,
}

#[derive(Deserialize)]
struct WireMetadata {
    #[serde(default)]
    name: Option<String>,
}

impl From<WirePage> for Page {
    fn from(wire: WirePage) -> Self {
        // An empty reference would resolve back to the base URL.
        let next = wire.pagination.next.filter(|next| !next.is_empty());
        Self {
            results: wire.results,
            next,
        }
    }
}

impl TryFrom<WireRelease> for ReleaseRecord {
    type Error = RecordError;

    fn try_from(wire: WireRelease) -> Result<Self, Self::Error> {
        if last_segment(&wire.file_uri).is_empty() {
            return Err(RecordError::EmptyFilename {
                file_uri: wire.file_uri,
            });
        }
        let release_name = wire
            .metadata
            .and_then(|metadata| metadata.name)
            .unwrap_or_else(|| format!("{}-{}", wire.module.owner.username, wire.module.name));
        Ok(Self {
            module_name: wire.module.name,
            owner_username: wire.module.owner.username,
            file_uri: wire.file_uri,
            file_md5: wire.file_md5,
            file_size: wire.file_size,
            release_name,
        })
    }
}
