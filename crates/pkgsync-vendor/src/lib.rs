//! Native package vendoring for pkgsync.
//!
//! Packages listed in a flat exact-dependency file are fetched as tarballs,
//! unpacked under a vendor tree after a path-traversal check, registered as
//! source directories in consuming manifests, and finally have their
//! generated native namespace rewritten to the consuming project's.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod layout;
pub mod munge;
pub mod package;
pub mod pipeline;
pub mod register;

pub use config::VendorConfig;
pub use extract::extract_archive;
pub use fetch::{ArchiveFetcher, HttpFetcher};
pub use layout::VendorLayout;
pub use munge::rename;
pub use package::{
    archive_url, native_name, packages_from_exact_deps, parse_repository_url, PackageDescriptor,
};
pub use pipeline::{install, vendor, InstallReport, VendorReport};
pub use register::{update_source_directories, Registration};

use std::path::PathBuf;
use thiserror::Error;

/// Manifest file every vendored package carries at its root.
pub const PACKAGE_MANIFEST: &str = "elm-package.json";

#[derive(Debug, Error)]
pub enum VendorError {
    #[error("vendor I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest error: {0}")]
    Manifest(#[from] pkgsync_schema::ManifestError),
    #[error("malformed package key '{0}', expected 'owner/project'")]
    MalformedPackageKey(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("archive {archive} member '{member}' escapes the extraction directory")]
    PathTraversal { archive: PathBuf, member: String },
    #[error("unrecognized repository URL '{0}', expected https://github.com/<owner>/<project>.git")]
    UnrecognizedRepositoryUrl(String),
    #[error("vendor config error: {0}")]
    Config(String),
}
