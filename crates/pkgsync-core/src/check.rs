use crate::text::{wrap_paragraphs, WRAP_WIDTH};
use crate::CoreError;
use pkgsync_schema::{exact, merge, Change, DependencyMap, Manifest};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const FAILURE_HEADER: &str = "BUILD FAILED due to dependency mismatch, errors:";
const SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    /// Both files are flat exact-dependency maps rather than full manifests.
    pub exact: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    PackageNotFound {
        package: String,
        reference_name: String,
        candidate_name: String,
    },
    VersionMismatch {
        package: String,
        reference_name: String,
        reference_version: String,
        candidate_name: String,
        candidate_version: String,
    },
}

impl Mismatch {
    fn from_change(change: Change, reference_name: &str, candidate_name: &str) -> Self {
        match change {
            Change::Inserted { package, .. } => Mismatch::PackageNotFound {
                package,
                reference_name: reference_name.to_owned(),
                candidate_name: candidate_name.to_owned(),
            },
            Change::Changed { package, from, to } => Mismatch::VersionMismatch {
                package,
                reference_name: reference_name.to_owned(),
                reference_version: to,
                candidate_name: candidate_name.to_owned(),
                candidate_version: from,
            },
        }
    }

    pub fn package(&self) -> &str {
        match self {
            Mismatch::PackageNotFound { package, .. } | Mismatch::VersionMismatch { package, .. } => {
                package
            }
        }
    }

    fn unwrapped(&self) -> String {
        match self {
            Mismatch::PackageNotFound {
                package,
                reference_name,
                candidate_name,
            } => format!(
                "Package {package} was a dependency in the reference package file \
                 ({reference_name}) but was not in the candidate package file \
                 ({candidate_name}).\n\n\
                 You can probably fix this error by adding {package} to the \
                 dependencies in {candidate_name}."
            ),
            Mismatch::VersionMismatch {
                package,
                reference_name,
                reference_version,
                candidate_name,
                candidate_version,
            } => format!(
                "Package version mismatch for {package}!\n\n\
                 The reference package file ({reference_name}) has version \
                 \"{reference_version}\", but the candidate package file \
                 ({candidate_name}) has version \"{candidate_version}\".\n\n\
                 You can probably fix this error by changing the version bounds \
                 for {package} in {candidate_name} to \"{reference_version}\"."
            ),
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&wrap_paragraphs(&self.unwrapped(), WRAP_WIDTH))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub reference: PathBuf,
    pub candidate: PathBuf,
    #[serde(skip)]
    pub reference_deps: DependencyMap,
    #[serde(skip)]
    pub candidate_deps: DependencyMap,
    pub mismatches: Vec<Mismatch>,
}

impl CheckReport {
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Both dependency sets, sorted, each preceded by its file name.
    pub fn dependency_listing(&self) -> Result<String, CoreError> {
        Ok(format!(
            "{} {}\n{} {}",
            self.reference.display(),
            exact::to_json_string(&self.reference_deps)?,
            self.candidate.display(),
            exact::to_json_string(&self.candidate_deps)?,
        ))
    }

    /// The aggregated failure text, or `None` when the dependencies match.
    pub fn failure_message(&self) -> Option<String> {
        if self.is_match() {
            return None;
        }
        let body = self
            .mismatches
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(SEPARATOR);
        Some(format!("{FAILURE_HEADER}{SEPARATOR}{body}"))
    }
}

/// Compare the dependencies of `candidate_path` against `reference_path`.
///
/// Every reference dependency the candidate lacks or pins differently is a
/// mismatch. Dependencies only the candidate declares are fine.
pub fn check_manifests(
    reference_path: &Path,
    candidate_path: &Path,
    options: CheckOptions,
) -> Result<CheckReport, CoreError> {
    let (reference_deps, candidate_deps) = if options.exact {
        (exact::load(reference_path)?, exact::load(candidate_path)?)
    } else {
        (
            Manifest::load(reference_path)?.dependencies()?,
            Manifest::load(candidate_path)?.dependencies()?,
        )
    };

    let reference_name = reference_path.display().to_string();
    let candidate_name = candidate_path.display().to_string();
    let mismatches: Vec<Mismatch> = merge(&reference_deps, &candidate_deps)
        .changes
        .into_iter()
        .map(|change| Mismatch::from_change(change, &reference_name, &candidate_name))
        .collect();
    debug!("{} mismatches against {reference_name}", mismatches.len());

    Ok(CheckReport {
        reference: reference_path.to_path_buf(),
        candidate: candidate_path.to_path_buf(),
        reference_deps,
        candidate_deps,
        mismatches,
    })
}
