use crate::CoreError;
use pkgsync_schema::{exact, merge, Change, DependencyMap, Manifest, ManifestError};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Leave the individual change messages out of the rendered report.
    pub quiet: bool,
    /// Report what would change without writing.
    pub dry: bool,
    /// Record candidate-only dependencies as `test-dependencies`.
    pub note_test_deps: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    NoChanges,
    DryRun,
    Written,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub changes: Vec<Change>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_dependencies: Option<DependencyMap>,
    pub outcome: SyncOutcome,
    #[serde(skip)]
    quiet: bool,
}

impl SyncReport {
    pub fn messages(&self) -> Vec<String> {
        self.changes.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.outcome == SyncOutcome::NoChanges {
            return write!(f, "No changes needed.");
        }
        write!(f, "{} packages changed.", self.changes.len())?;
        if !self.quiet {
            for change in &self.changes {
                write!(f, "\n{change}")?;
            }
        }
        if self.outcome == SyncOutcome::DryRun {
            write!(f, "\nNo changes written.")?;
        }
        Ok(())
    }
}

/// Bring the subordinate manifest at `candidate_path` in line with the top-level
/// manifest at `reference_path`.
///
/// The candidate's dependencies become the merge result. With
/// `note_test_deps`, every merged dependency the reference does not declare
/// is also recorded under `test-dependencies`. The candidate file is written
/// at most once, and never on a dry run.
pub fn sync_manifests(
    reference_path: &Path,
    candidate_path: &Path,
    options: SyncOptions,
) -> Result<SyncReport, CoreError> {
    let reference = Manifest::load(reference_path)?;
    let mut candidate = Manifest::load(candidate_path)?;

    let reference_deps = reference.dependencies()?;
    let outcome = merge(&reference_deps, &candidate.dependencies()?);
    candidate.set_dependencies(&outcome.merged);

    let test_dependencies = options.note_test_deps.then(|| {
        let test_deps: DependencyMap = outcome
            .merged
            .iter()
            .filter(|(package, _)| !reference_deps.contains(package))
            .collect();
        test_deps.sorted()
    });
    if let Some(test_deps) = &test_dependencies {
        debug!("{} candidate-only dependencies", test_deps.len());
        candidate.set_test_dependencies(test_deps);
    }

    finish(outcome.changes, test_dependencies, options, candidate_path, || {
        candidate.save(candidate_path)
    })
}

/// [`sync_manifests`] for flat exact-dependency files. `note_test_deps` does
/// not apply to these and is ignored.
pub fn sync_exact(
    reference_path: &Path,
    candidate_path: &Path,
    options: SyncOptions,
) -> Result<SyncReport, CoreError> {
    let reference = exact::load(reference_path)?;
    let candidate = exact::load(candidate_path)?;
    let outcome = merge(&reference, &candidate);

    let options = SyncOptions {
        note_test_deps: false,
        ..options
    };
    finish(outcome.changes, None, options, candidate_path, || {
        exact::save(&outcome.merged, candidate_path)
    })
}

fn finish(
    changes: Vec<Change>,
    test_dependencies: Option<DependencyMap>,
    options: SyncOptions,
    candidate_path: &Path,
    persist: impl FnOnce() -> Result<(), ManifestError>,
) -> Result<SyncReport, CoreError> {
    let outcome = if changes.is_empty() && !options.note_test_deps {
        SyncOutcome::NoChanges
    } else if options.dry {
        SyncOutcome::DryRun
    } else {
        persist()?;
        info!("wrote {}", candidate_path.display());
        SyncOutcome::Written
    };

    Ok(SyncReport {
        changes,
        test_dependencies,
        outcome,
        quiet: options.quiet,
    })
}
