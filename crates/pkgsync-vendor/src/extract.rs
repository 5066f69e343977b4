use crate::VendorError;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Extract a tar archive (plain or gzip-compressed) into `dest`.
///
/// Every member is checked before anything is written: a member path, or a
/// link target, that would resolve outside `dest` fails the whole archive
/// with [`VendorError::PathTraversal`]. Returns the number of members.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<usize, VendorError> {
    let members = validate_members(archive_path)?;

    fs::create_dir_all(dest)?;
    let mut ar = open_archive(archive_path)?;
    ar.set_preserve_permissions(false);
    ar.set_preserve_mtime(false);
    ar.set_unpack_xattrs(false);
    ar.unpack(dest)?;
    debug!(
        "extracted {members} members from {} into {}",
        archive_path.display(),
        dest.display()
    );
    Ok(members)
}

fn open_archive(path: &Path) -> Result<tar::Archive<Box<dyn Read>>, VendorError> {
    let mut reader = BufReader::new(File::open(path)?);
    let gzipped = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    let inner: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(reader))
    } else {
        Box::new(reader)
    };
    Ok(tar::Archive::new(inner))
}

/// One archive member as seen by the validation pass.
struct Member {
    path: PathBuf,
    resolved: Vec<OsString>,
    link: Option<(bool, PathBuf)>,
}

fn validate_members(archive_path: &Path) -> Result<usize, VendorError> {
    let traversal = |member: &Path| VendorError::PathTraversal {
        archive: archive_path.to_path_buf(),
        member: member.to_string_lossy().into_owned(),
    };

    let mut ar = open_archive(archive_path)?;
    let mut members = Vec::new();
    for entry in ar.entries()? {
        let entry = entry?;
        let path = entry.path()?.into_owned();
        let Some(resolved) = resolve(&[], &path) else {
            return Err(traversal(&path));
        };
        let kind = entry.header().entry_type();
        let link = if kind.is_symlink() || kind.is_hard_link() {
            entry
                .link_name()?
                .map(|target| (kind.is_symlink(), target.into_owned()))
        } else {
            None
        };
        members.push(Member {
            path,
            resolved,
            link,
        });
    }

    let symlinks: Vec<&[OsString]> = members
        .iter()
        .filter(|m| matches!(m.link, Some((true, _))))
        .map(|m| m.resolved.as_slice())
        .collect();
    // a path that descends through a symlink member could land anywhere
    let through_symlink = |resolved: &[OsString]| {
        symlinks
            .iter()
            .any(|link| resolved.len() > link.len() && resolved.starts_with(link))
    };

    for member in &members {
        if through_symlink(&member.resolved) {
            return Err(traversal(&member.path));
        }
        if let Some((is_symlink, target)) = &member.link {
            // symlinks resolve from the member's directory, hard links
            // from the archive root
            let base = if *is_symlink {
                &member.resolved[..member.resolved.len().saturating_sub(1)]
            } else {
                &[][..]
            };
            match resolve(base, target) {
                Some(to) if !through_symlink(&to) => {}
                _ => return Err(traversal(&member.path)),
            }
        }
    }
    Ok(members.len())
}

/// Lexically walk `path` from `base`, both relative to the extraction root.
/// `None` if the walk leaves the root at any point.
fn resolve(base: &[OsString], path: &Path) -> Option<Vec<OsString>> {
    let mut out = base.to_vec();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return None,
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop()?;
            }
            Component::Normal(name) => out.push(name.to_os_string()),
        }
    }
    Some(out)
}
