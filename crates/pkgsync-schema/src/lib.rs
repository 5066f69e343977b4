//! Manifest loading, saving, and dependency merging for pkgsync.
//!
//! This crate is the schema layer: an order-preserving `Manifest` with typed
//! accessors for the fields pkgsync reads, the insertion-ordered
//! `DependencyMap`, the reference-wins `merge`, and flat exact-dependency files.

pub mod deps;
pub mod exact;
pub mod manifest;

pub use deps::{merge, Change, DependencyMap, MergeOutcome};
pub use manifest::{
    parse_manifest_str, Manifest, DEPENDENCIES, REPOSITORY, SOURCE_DIRECTORIES, TEST_DEPENDENCIES,
};

use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("manifest must be a JSON object")]
    NotAnObject,
    #[error("manifest is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("manifest field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("invalid manifest field '{field}': {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Replace `path` with `content` through a temporary file in the same
/// directory.
///
/// An existing file keeps its permissions. A new file gets 0644 on unix.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<(), ManifestError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    match fs::metadata(path) {
        Ok(meta) => tmp.as_file().set_permissions(meta.permissions())?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => set_new_file_mode(tmp.as_file())?,
        Err(e) => return Err(e.into()),
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ManifestError::Io(e.error))?;
    if let Ok(f) = fs::File::open(dir) {
        let _ = f.sync_all();
    }
    Ok(())
}

#[cfg(unix)]
fn set_new_file_mode(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_new_file_mode(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}
