//! Orchestration for pkgsync.
//!
//! `sync` brings a subordinate manifest (or a flat exact-dependency file) into line
//! with a top-level one, `check` reports every difference between two
//! manifests as a human-readable mismatch list, and `requires` walks
//! sprockets-style `#= require` directives through an asset tree.

pub mod check;
pub mod requires;
pub mod sync;
mod text;

pub use check::{check_manifests, CheckOptions, CheckReport, Mismatch};
pub use requires::{find_requirements, Requirements};
pub use sync::{sync_exact, sync_manifests, SyncOptions, SyncOutcome, SyncReport};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] pkgsync_schema::ManifestError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),
}
