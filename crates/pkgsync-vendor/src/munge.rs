use crate::layout::VendorLayout;
use crate::package::{native_name, parse_repository_url, PackageDescriptor};
use crate::VendorError;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const NATIVE_DIR: &str = "Native";
const NATIVE_EXTENSION: &str = "js";

/// Rewrite the generated namespace in each vendored package's native code
/// from the package's own `owner/project` to the consuming project's, taken
/// from `repository` (`https://github.com/{owner}/{project}.git`).
///
/// Returns the number of files rewritten.
pub fn rename(
    layout: &VendorLayout,
    repository: &str,
    packages: &[PackageDescriptor],
) -> Result<usize, VendorError> {
    let (owner, project) = parse_repository_url(repository)?;
    let target = native_name(&owner, &project);

    let mut rewritten = 0;
    for package in packages {
        let source = package.native_name();
        for file in find_native_files(&layout.package_dir(package))? {
            if replace_in_file(&file, &source, &target)? {
                debug!("renamed {source} -> {target} in {}", file.display());
                rewritten += 1;
            }
        }
    }
    Ok(rewritten)
}

/// Native source files below `root`: `.js` files with a `Native` directory
/// somewhere between `root` and the file. Sorted for stable output.
pub fn find_native_files(root: &Path) -> Result<Vec<PathBuf>, VendorError> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                stack.push(path);
            } else if file_type.is_file()
                && path.extension() == Some(OsStr::new(NATIVE_EXTENSION))
                && under_native_dir(root, &path)
            {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

fn under_native_dir(root: &Path, file: &Path) -> bool {
    let Ok(relative) = file.strip_prefix(root) else {
        return false;
    };
    relative
        .parent()
        .is_some_and(|dir| dir.components().any(|c| c == Component::Normal(OsStr::new(NATIVE_DIR))))
}

fn replace_in_file(path: &Path, from: &str, to: &str) -> Result<bool, VendorError> {
    let content = fs::read(path)?;
    match replace_bytes(&content, from.as_bytes(), to.as_bytes()) {
        Some(replaced) => {
            fs::write(path, replaced)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Every occurrence of `from` in `haystack` replaced by `to`, or `None` when
/// there is none. Works on bytes so non-UTF-8 sources are handled too.
fn replace_bytes(haystack: &[u8], from: &[u8], to: &[u8]) -> Option<Vec<u8>> {
    if from.is_empty() {
        return None;
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;
    let mut found = false;
    while let Some(pos) = rest.windows(from.len()).position(|w| w == from) {
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(to);
        rest = &rest[pos + from.len()..];
        found = true;
    }
    out.extend_from_slice(rest);
    found.then_some(out)
}
