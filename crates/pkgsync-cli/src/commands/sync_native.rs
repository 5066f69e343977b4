use super::sync::print_report;
use super::CliError;
use pkgsync_core::{sync_exact, SyncOptions};
use std::path::Path;

pub fn run(top_level: &Path, spec: &Path, options: SyncOptions, json: bool) -> Result<u8, CliError> {
    let report = sync_exact(top_level, spec, options)?;
    print_report(&report, json)
}
