mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::CliError;
use pkgsync_core::SyncOptions;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "pkgsync",
    version,
    about = "Keep package manifests in step and vendor native packages"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    /// Vendor config file (defaults to ~/.config/pkgsync/vendor.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check that every reference dependency is pinned identically in the candidate.
    Check {
        /// The source of truth for dependency comparisons.
        reference: PathBuf,
        /// The file which should change if different from the reference.
        candidate: PathBuf,
        /// Succeed quietly instead of printing the dependencies as they are examined.
        #[arg(short, long, default_value_t = false)]
        quiet: bool,
        /// (DEPRECATED) both files are flat exact-dependency maps.
        #[arg(short, long, default_value_t = false)]
        exact: bool,
    },
    /// Copy dependencies from a top-level manifest into a spec manifest.
    Sync {
        /// The top-level manifest.
        top_level: PathBuf,
        /// The subordinate manifest to update.
        spec: PathBuf,
        /// Don't print the individual changes.
        #[arg(short, long, default_value_t = false)]
        quiet: bool,
        /// Only report what would change.
        #[arg(short, long, default_value_t = false)]
        dry: bool,
        /// Record candidate-only dependencies as test-dependencies.
        #[arg(long, default_value_t = false)]
        note: bool,
    },
    /// Copy dependencies between flat native exact-dependency files.
    SyncNative {
        /// The top-level native dependency file.
        top_level: PathBuf,
        /// The subordinate native dependency file to update.
        spec: PathBuf,
        /// Don't print the individual changes.
        #[arg(short, long, default_value_t = false)]
        quiet: bool,
        /// Only report what would change.
        #[arg(short, long, default_value_t = false)]
        dry: bool,
    },
    /// Vendor the native packages listed in a flat exact-dependency file.
    Install {
        /// The native exact-dependency file.
        native_manifest: PathBuf,
        /// Manifest to register vendored source directories in (repeatable).
        #[arg(short = 'e', long = "elm-config")]
        elm_config: Vec<PathBuf>,
        /// Directory to vendor packages into (overrides config file).
        #[arg(long)]
        vendor_dir: Option<PathBuf>,
        /// Base URL archives are downloaded from (overrides config file).
        #[arg(long)]
        archive_base: Option<String>,
    },
    /// List the files a coffee asset transitively requires.
    Requires {
        /// The file to start the requirement search from.
        file: PathBuf,
        /// Asset directory required names resolve in.
        #[arg(long, default_value = ".")]
        asset_dir: PathBuf,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PKGSYNC_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let json_output = cli.json;

    let result = match cli.command {
        Commands::Check {
            reference,
            candidate,
            quiet,
            exact,
        } => commands::absolute(&reference).and_then(|reference| {
            let candidate = commands::absolute(&candidate)?;
            commands::check::run(&reference, &candidate, quiet, exact, json_output)
        }),
        Commands::Sync {
            top_level,
            spec,
            quiet,
            dry,
            note,
        } => commands::absolute(&top_level).and_then(|top_level| {
            let spec = commands::absolute(&spec)?;
            let options = SyncOptions {
                quiet,
                dry,
                note_test_deps: note,
            };
            commands::sync::run(&top_level, &spec, options, json_output)
        }),
        Commands::SyncNative {
            top_level,
            spec,
            quiet,
            dry,
        } => commands::absolute(&top_level).and_then(|top_level| {
            let spec = commands::absolute(&spec)?;
            let options = SyncOptions {
                quiet,
                dry,
                note_test_deps: false,
            };
            commands::sync_native::run(&top_level, &spec, options, json_output)
        }),
        Commands::Install {
            native_manifest,
            elm_config,
            vendor_dir,
            archive_base,
        } => commands::install::run(
            &native_manifest,
            &elm_config,
            commands::install::Overrides {
                config: cli.config.as_deref(),
                vendor_dir: vendor_dir.as_deref(),
                archive_base: archive_base.as_deref(),
            },
            json_output,
        ),
        Commands::Requires { file, asset_dir } => commands::absolute(&file).and_then(|file| {
            let asset_dir = commands::absolute(&asset_dir)?;
            commands::requires::run(&asset_dir, &file, json_output)
        }),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(CliError::BrokenPipe) => ExitCode::from(CliError::BrokenPipe.exit_code()),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
