//! objcpatch - An in-place Objective-C metadata patcher.
//!
//! Randomizes or pattern-replaces Objective-C class and category names in a
//! Mach-O binary without changing its size or layout.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use objcpatch::{patch_file, PatchConfig};

/// Patch Objective-C class and category names in a Mach-O binary in place.
#[derive(Parser, Debug)]
#[command(name = "objcpatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Mach-O binary to patch (thin or universal)
    #[arg(value_parser = existing_file)]
    binary: PathBuf,

    /// Class names to leave untouched (repeatable, or comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Replace PATTERN with REPLACEMENT instead of randomizing.
    /// Both must have the same length
    #[arg(short, long, num_args = 2, value_names = ["PATTERN", "REPLACEMENT"])]
    replace: Option<Vec<String>>,

    /// Only report warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Patch in memory and report, but do not write the file
    #[arg(long)]
    dry_run: bool,

    /// Seed for the random name generator
    #[arg(long)]
    seed: Option<u64>,

    /// Increase log verbosity (-v for debug output)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.quiet, cli.verbose);

    let config = build_config(&cli)?;
    let start = Instant::now();

    let report = patch_file(&cli.binary, &config)
        .with_context(|| format!("Failed to patch: {}", cli.binary.display()))?;

    info!(
        "Patched {} names in {:.2}s",
        report.stats.total_patched(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

fn setup_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .finish();

    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Builds and validates the run configuration before any file I/O.
fn build_config(cli: &Cli) -> Result<PatchConfig> {
    let config = match cli.replace.as_deref() {
        Some([pattern, replacement]) => {
            PatchConfig::replace(pattern.as_str(), replacement.as_str())
                .context("Invalid --replace arguments")?
        }
        Some(_) => anyhow::bail!("--replace takes exactly two values: PATTERN REPLACEMENT"),
        None => PatchConfig::randomize(),
    };

    Ok(config
        .with_exclusions(cli.exclude.iter().filter(|name| !name.is_empty()).cloned())
        .with_quiet(cli.quiet)
        .with_dry_run(cli.dry_run)
        .with_seed(cli.seed))
}

fn existing_file(value: &str) -> std::result::Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else if path.exists() {
        Err(format!("not a regular file: {}", value))
    } else {
        Err(format!("file does not exist: {}", value))
    }
}
