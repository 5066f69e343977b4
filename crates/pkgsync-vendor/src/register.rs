use crate::layout::VendorLayout;
use crate::package::PackageDescriptor;
use crate::VendorError;
use pkgsync_schema::Manifest;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Outcome of registering vendored source directories.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    /// `repository` of the last consuming manifest processed.
    pub repository: Option<String>,
    /// Consuming manifests that were rewritten.
    pub updated: Vec<PathBuf>,
}

/// Add each vendored package's source directories to every consuming
/// manifest, as paths relative to that manifest's directory.
///
/// Existing entries are left in place and new ones appended, so the rewrite
/// touches as few lines as possible. A manifest with nothing to add is not
/// written.
pub fn update_source_directories(
    layout: &VendorLayout,
    consumers: &[PathBuf],
    packages: &[PackageDescriptor],
) -> Result<Registration, VendorError> {
    let mut registration = Registration::default();

    for consumer in consumers {
        let mut manifest = Manifest::load(consumer)?;
        registration.repository = Some(manifest.repository()?.to_owned());
        let consumer_dir = consumer.parent().unwrap_or(Path::new(""));

        let mut needs_save = false;
        for package in packages {
            let package_dir = layout.package_dir(package);
            let vendored = Manifest::load(layout.package_manifest(package))?;
            for dir in vendored.source_directories()? {
                let relative = relative_path(consumer_dir, &package_dir.join(&dir));
                if manifest.add_source_directory(&relative)? {
                    debug!("{}: added source directory {relative}", consumer.display());
                    needs_save = true;
                }
            }
        }

        if needs_save {
            manifest.save_verbatim(consumer)?;
            info!("updated source-directories in {}", consumer.display());
            registration.updated.push(consumer.clone());
        }
    }

    Ok(registration)
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> Vec<Component<'_>> {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

/// `to` expressed relative to the directory `from`, with `/` separators.
///
/// Both paths should be absolute, or both relative to the same base. When
/// one is absolute and the other is not there is no relative form, and the
/// normalized `to` is returned.
pub fn relative_path(from: &Path, to: &Path) -> String {
    let from = normalize(from);
    let to = normalize(to);

    let rooted = |c: &[Component<'_>]| {
        matches!(c.first(), Some(Component::RootDir | Component::Prefix(_)))
    };
    if rooted(from.as_slice()) != rooted(to.as_slice()) {
        return to.iter().collect::<PathBuf>().to_string_lossy().into_owned();
    }

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
    let mut parts = vec!["..".to_owned(); from.len() - common];
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );

    if parts.is_empty() {
        ".".to_owned()
    } else {
        parts.join("/")
    }
}
