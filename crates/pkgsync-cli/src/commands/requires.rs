use super::{emit, json_pretty, CliError, EXIT_SUCCESS};
use pkgsync_core::find_requirements;
use std::path::Path;

pub fn run(asset_dir: &Path, file: &Path, json: bool) -> Result<u8, CliError> {
    let reqs = find_requirements(asset_dir, file)?;
    if json {
        emit(json_pretty(&reqs)?)?;
        return Ok(EXIT_SUCCESS);
    }

    emit(reqs.found.join("\n"))?;
    if !reqs.missing.is_empty() {
        emit("--------------")?;
        emit("Could not find the following files:\n")?;
        emit(reqs.missing.join("\n"))?;
    }
    Ok(EXIT_SUCCESS)
}
