use crate::package::PackageDescriptor;
use crate::VendorError;
use std::fs;
use std::path::PathBuf;

/// Directory layout of the vendor tree.
///
/// ```text
/// <root>/<owner>/<project>-<version>/          extracted package
/// <root>/<owner>/<project>-<version>-tar.gz    downloaded archive, kept
/// ```
#[derive(Debug, Clone)]
pub struct VendorLayout {
    root: PathBuf,
}

impl VendorLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn owner_dir(&self, package: &PackageDescriptor) -> PathBuf {
        self.root.join(&package.owner)
    }

    #[inline]
    pub fn package_dir(&self, package: &PackageDescriptor) -> PathBuf {
        self.owner_dir(package).join(package.dir_name())
    }

    #[inline]
    pub fn archive_path(&self, package: &PackageDescriptor) -> PathBuf {
        self.owner_dir(package)
            .join(format!("{}-tar.gz", package.dir_name()))
    }

    #[inline]
    pub fn package_manifest(&self, package: &PackageDescriptor) -> PathBuf {
        self.package_dir(package).join(crate::PACKAGE_MANIFEST)
    }

    /// Create `<root>/<owner>` if missing. An existing directory is fine.
    pub fn ensure_owner_dir(&self, package: &PackageDescriptor) -> Result<PathBuf, VendorError> {
        let dir = self.owner_dir(package);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Package directory path, with its owner directory created.
    pub fn prepare_package_dir(&self, package: &PackageDescriptor) -> Result<PathBuf, VendorError> {
        self.ensure_owner_dir(package)?;
        Ok(self.package_dir(package))
    }

    /// Whether the package directory is present. Says nothing about whether
    /// a previous extraction finished.
    pub fn exists(&self, package: &PackageDescriptor) -> bool {
        self.package_dir(package).is_dir()
    }
}
