use super::{absolute, emit, json_pretty, spin_fail, spin_ok, spinner, CliError, EXIT_SUCCESS};
use pkgsync_vendor::{install, HttpFetcher, VendorConfig, VendorLayout};
use std::path::{Path, PathBuf};

/// Command-line values that take precedence over the vendor config file.
pub struct Overrides<'a> {
    pub config: Option<&'a Path>,
    pub vendor_dir: Option<&'a Path>,
    pub archive_base: Option<&'a str>,
}

pub fn run(
    native_manifest: &Path,
    consumers: &[PathBuf],
    overrides: Overrides<'_>,
    json: bool,
) -> Result<u8, CliError> {
    let config = resolve_config(&overrides)?;
    let native_manifest = absolute(native_manifest)?;
    let consumers = consumers
        .iter()
        .map(PathBuf::as_path)
        .map(absolute)
        .collect::<Result<Vec<_>, _>>()?;
    let layout = VendorLayout::new(absolute(&config.vendor_dir)?);
    let fetcher = HttpFetcher::new(&config.archive_base_url);

    let pb = (!json).then(|| spinner("vendoring native packages..."));
    let report = match install(&native_manifest, &consumers, &layout, &fetcher) {
        Ok(r) => r,
        Err(e) => {
            if let Some(pb) = &pb {
                spin_fail(pb, "vendoring failed");
            }
            return Err(e.into());
        }
    };

    if json {
        emit(json_pretty(&report)?)?;
        return Ok(EXIT_SUCCESS);
    }

    if let Some(pb) = &pb {
        spin_ok(
            pb,
            &format!(
                "vendored {} packages ({} already present)",
                report.vendor.vendored.len(),
                report.vendor.skipped.len()
            ),
        );
    }
    for package in &report.vendor.vendored {
        emit(format_args!("  {package} -> {}", layout.package_dir(package).display()))?;
    }
    for manifest in &report.vendor.updated_manifests {
        emit(format_args!("updated {}", manifest.display()))?;
    }
    if report.renamed_files > 0 {
        emit(format_args!("rewrote native namespace in {} files", report.renamed_files))?;
    }
    Ok(EXIT_SUCCESS)
}

fn resolve_config(overrides: &Overrides<'_>) -> Result<VendorConfig, CliError> {
    let mut config = match overrides.config {
        Some(path) => VendorConfig::load(&absolute(path)?),
        None => VendorConfig::load_default(),
    }?;

    if let Some(dir) = overrides.vendor_dir {
        config = config.with_vendor_dir(dir);
    }
    if let Some(url) = overrides.archive_base {
        config = config.with_archive_base_url(url);
    }
    Ok(config)
}
