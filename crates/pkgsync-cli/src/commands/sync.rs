use super::{emit, json_pretty, CliError, EXIT_SUCCESS};
use pkgsync_core::{sync_manifests, SyncOptions, SyncReport};
use std::path::Path;

pub fn run(top_level: &Path, spec: &Path, options: SyncOptions, json: bool) -> Result<u8, CliError> {
    let report = sync_manifests(top_level, spec, options)?;
    print_report(&report, json)
}

pub(super) fn print_report(report: &SyncReport, json: bool) -> Result<u8, CliError> {
    if json {
        emit(json_pretty(report)?)?;
    } else {
        emit(report)?;
    }
    Ok(EXIT_SUCCESS)
}
