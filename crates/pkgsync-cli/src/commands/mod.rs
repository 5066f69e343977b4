pub mod check;
pub mod completions;
pub mod install;
pub mod requires;
pub mod sync;
pub mod sync_native;

use indicatif::{ProgressBar, ProgressStyle};
use pkgsync_core::CoreError;
use pkgsync_vendor::VendorError;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;

/// Why a command stopped. Decides the process exit code.
#[derive(Debug)]
pub enum CliError {
    /// A manifest could not be read, parsed, or has the wrong shape.
    Manifest(String),
    /// Anything else: I/O, network, archive, bad arguments.
    Failure(String),
    /// stdout was closed by the reader; not reported.
    BrokenPipe,
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Manifest(_) => EXIT_MANIFEST_ERROR,
            CliError::Failure(_) => EXIT_FAILURE,
            CliError::BrokenPipe => EXIT_SUCCESS,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Manifest(msg) | CliError::Failure(msg) => f.write_str(msg),
            CliError::BrokenPipe => f.write_str("broken pipe"),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Manifest(_) => CliError::Manifest(e.to_string()),
            CoreError::Io(_) | CoreError::Regex(_) => CliError::Failure(e.to_string()),
        }
    }
}

impl From<VendorError> for CliError {
    fn from(e: VendorError) -> Self {
        match e {
            VendorError::Manifest(_) => CliError::Manifest(e.to_string()),
            _ => CliError::Failure(e.to_string()),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::BrokenPipe {
            CliError::BrokenPipe
        } else {
            CliError::Failure(format!("cannot write output: {e}"))
        }
    }
}

/// Write `text` and a newline to stdout.
pub fn emit(text: impl fmt::Display) -> Result<(), CliError> {
    let mut out = io::stdout().lock();
    writeln!(out, "{text}")?;
    out.flush()?;
    Ok(())
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Failure(format!("JSON serialization failed: {e}")))
}

/// Resolve `path` against the working directory once, at the CLI boundary.
pub fn absolute(path: &Path) -> Result<PathBuf, CliError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| CliError::Failure(format!("cannot determine working directory: {e}")))?;
    Ok(cwd.join(path))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    finish_plain(pb, format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    finish_plain(pb, format!("✗ {msg}"));
}

fn finish_plain(pb: &ProgressBar, msg: String) {
    if let Ok(style) = ProgressStyle::with_template("{msg}") {
        pb.set_style(style);
    }
    pb.finish_with_message(msg);
}

/// Green for success, bold red for failure. Plain when stdout is not a terminal.
pub fn colorize_status(text: &str, ok: bool) -> String {
    use console::Style;
    if ok {
        Style::new().green().apply_to(text).to_string()
    } else {
        Style::new().red().bold().apply_to(text).to_string()
    }
}
