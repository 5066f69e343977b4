use crate::extract::extract_archive;
use crate::fetch::ArchiveFetcher;
use crate::layout::VendorLayout;
use crate::munge::rename;
use crate::package::{packages_from_exact_deps, PackageDescriptor};
use crate::register::update_source_directories;
use crate::VendorError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, Serialize)]
pub struct VendorReport {
    /// Packages fetched and extracted by this run.
    pub vendored: Vec<PackageDescriptor>,
    /// Packages whose vendor directory already existed.
    pub skipped: Vec<PackageDescriptor>,
    /// Consuming manifests whose `source-directories` were extended.
    pub updated_manifests: Vec<PathBuf>,
    /// `repository` of the last consuming manifest.
    pub repository: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallReport {
    #[serde(flatten)]
    pub vendor: VendorReport,
    /// Native files whose namespace was rewritten.
    pub renamed_files: usize,
}

/// Fetch, extract, and register every package in the flat exact-dependency
/// file `native_manifest` that is not vendored yet.
///
/// The first failure ends the run. Manifests rewritten before it stay
/// rewritten.
pub fn vendor(
    native_manifest: &Path,
    consumers: &[PathBuf],
    layout: &VendorLayout,
    fetcher: &dyn ArchiveFetcher,
) -> Result<VendorReport, VendorError> {
    let deps = pkgsync_schema::exact::load(native_manifest)?;
    let (skipped, required): (Vec<_>, Vec<_>) = packages_from_exact_deps(&deps)?
        .into_iter()
        .partition(|p| layout.exists(p));

    for package in &skipped {
        debug!("{package} already vendored, skipping");
    }

    fetch_packages(layout, fetcher, &required)?;
    let registration = update_source_directories(layout, consumers, &required)?;

    Ok(VendorReport {
        vendored: required,
        skipped,
        updated_manifests: registration.updated,
        repository: registration.repository,
    })
}

/// Download and unpack each package into `<root>/<owner>/`.
pub fn fetch_packages(
    layout: &VendorLayout,
    fetcher: &dyn ArchiveFetcher,
    packages: &[PackageDescriptor],
) -> Result<(), VendorError> {
    for package in packages {
        let owner_dir = layout.ensure_owner_dir(package)?;
        let archive = layout.archive_path(package);

        info!("downloading {package}");
        fetcher.fetch(package, &archive)?;
        extract_archive(&archive, &owner_dir)?;
    }
    Ok(())
}

/// [`vendor`], then rewrite the native namespace of the newly vendored
/// packages to the consuming project's.
pub fn install(
    native_manifest: &Path,
    consumers: &[PathBuf],
    layout: &VendorLayout,
    fetcher: &dyn ArchiveFetcher,
) -> Result<InstallReport, VendorError> {
    let report = vendor(native_manifest, consumers, layout, fetcher)?;

    let renamed_files = match (&report.repository, report.vendored.is_empty()) {
        (_, true) => 0,
        (Some(repository), false) => rename(layout, repository, &report.vendored)?,
        (None, false) => {
            warn!("no consuming manifest given; native namespaces left unchanged");
            0
        }
    };

    Ok(InstallReport {
        vendor: report,
        renamed_files,
    })
}
