//! Local artifact layout and atomic file replacement.
//!
//! Mirrored archives live at `<modules_root>/<owner>/<module>/<filename>`.
//! Bytes are staged in a hidden temporary file next to the destination and
//! renamed into place, so an interrupted write never leaves a truncated file
//! under the final name. Staged files left behind by a killed run are
//! removed the next time an artifact is written to the same directory.

use crate::release::ReleaseRecord;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use std::io::{self, Write};

/// Name prefix of staged artifact files.
const STAGING_PREFIX: &str = ".forge-mirror-";

/// Name suffix of staged artifact files.
const STAGING_SUFFIX: &str = ".part";

/// Errors that abandon a single artifact write.
#[derive(Debug, thiserror::Error)]
pub enum WriteFailure {
    /// A path component supplied by the forge is not a plain file name.
    #[error("refusing to use {component:?} as a path component")]
    UnsafeComponent {
        /// The rejected component.
        component: String,
    },

    /// The destination path has no parent directory.
    #[error("artifact path {path} has no parent directory")]
    NoParent {
        /// The destination path.
        path: Utf8PathBuf,
    },

    /// Creating the destination directory failed.
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Writing the staged bytes failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// The destination path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Renaming the staged file over the destination failed.
    #[error("failed to move artifact into place at {path}: {source}")]
    Persist {
        /// The destination path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Compute where `record` is stored below `modules_root`.
///
/// # Errors
///
/// Returns [`WriteFailure::UnsafeComponent`] if the owner, module, or
/// filename is empty, `.`/`..`, or contains a path separator.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use forge_mirror::release::decode_page;
/// use forge_mirror::writer::artifact_path;
///
/// let body = concat!(
///     r#"{"results":[{"file_size":3,"file_uri":"/v3/files/foo-bar-1.2.3.tar.gz","#,
///     r#""file_md5":"5eb63bbbe01eeed093cb22bb8f5acdc3","#,
///     r#""module":{"name":"bar","owner":{"username":"foo"}}}],"pagination":{"next":null}}"#,
/// );
/// let page = decode_page(body.as_bytes()).expect("valid page");
/// let path = artifact_path(Utf8Path::new("/srv/forge"), &page.results()[0]).unwrap();
/// assert_eq!(path, "/srv/forge/foo/bar/foo-bar-1.2.3.tar.gz");
/// ```
pub fn artifact_path(
    modules_root: &Utf8Path,
    record: &ReleaseRecord,
) -> Result<Utf8PathBuf, WriteFailure> {
    let owner = checked_component(record.owner_username())?;
    let module = checked_component(record.module_name())?;
    let filename = checked_component(record.filename())?;
    Ok(modules_root.join(owner).join(module).join(filename))
}

fn checked_component(value: &str) -> Result<&str, WriteFailure> {
    let mut components = Utf8Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Utf8Component::Normal(name)), None) if name == value && !value.contains('\\') => {
            Ok(value)
        }
        _ => Err(WriteFailure::UnsafeComponent {
            component: value.to_owned(),
        }),
    }
}

/// Write `bytes` to `path`, creating parent directories and replacing any
/// existing file atomically.
///
/// # Errors
///
/// Returns a [`WriteFailure`] naming the path when directory creation,
/// writing, or the final rename fails. The destination is left untouched in
/// every failure case.
pub fn write_artifact(path: &Utf8Path, bytes: &[u8]) -> Result<(), WriteFailure> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .ok_or_else(|| WriteFailure::NoParent {
            path: path.to_owned(),
        })?;

    fs::create_dir_all(parent).map_err(|source| WriteFailure::CreateDirectory {
        path: parent.to_owned(),
        source,
    })?;

    remove_stale_staging(parent);

    let write_error = |source: io::Error| WriteFailure::Write {
        path: path.to_owned(),
        source,
    };
    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(STAGING_SUFFIX)
        .tempfile_in(parent)
        .map_err(write_error)?;
    staged.write_all(bytes).map_err(write_error)?;
    staged.as_file().sync_all().map_err(write_error)?;

    staged
        .persist(path)
        .map_err(|err| WriteFailure::Persist {
            path: path.to_owned(),
            source: err.error,
        })?;
    Ok(())
}

/// Delete staged files an interrupted run left in `dir`.
///
/// Runs are sequential, so any staged file found here is abandoned.
/// Failures are logged and otherwise ignored.
fn remove_stale_staging(dir: &Utf8Path) {
    let entries = match dir.read_dir_utf8() {
        Ok(entries) => entries,
        Err(err) => {
            debug!("cannot scan {dir} for staged files: {err}");
            return;
        }
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !(name.starts_with(STAGING_PREFIX) && name.ends_with(STAGING_SUFFIX)) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => debug!("removed stale staging file {}", entry.path()),
            Err(err) => debug!("cannot remove stale staging file {}: {err}", entry.path()),
        }
    }
}
