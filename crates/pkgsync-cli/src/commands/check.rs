use super::{colorize_status, emit, json_pretty, CliError, EXIT_FAILURE, EXIT_SUCCESS};
use pkgsync_core::{check_manifests, CheckOptions};
use std::path::Path;
use tracing::warn;

pub fn run(
    reference: &Path,
    candidate: &Path,
    quiet: bool,
    exact: bool,
    json: bool,
) -> Result<u8, CliError> {
    if exact {
        warn!("--exact is deprecated and will be removed in a future version; compare the manifests directly");
    }

    let report = check_manifests(reference, candidate, CheckOptions { exact })?;
    let code = if report.is_match() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    };

    if json {
        let payload = serde_json::json!({
            "matching": report.is_match(),
            "reference": report.reference,
            "candidate": report.candidate,
            "mismatches": report.mismatches,
        });
        emit(json_pretty(&payload)?)?;
        return Ok(code);
    }

    if !quiet {
        emit(report.dependency_listing()?)?;
    }
    match report.failure_message() {
        Some(message) => emit(colorize_status(&message, false))?,
        None if !quiet => emit(colorize_status("Matching deps!", true))?,
        None => {}
    }
    Ok(code)
}
