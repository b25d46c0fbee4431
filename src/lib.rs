//! objcpatch - An in-place Objective-C metadata patcher for Mach-O binaries.
//!
//! This library rewrites the class names stored in `__objc_classname` and the
//! category names reached through `__objc_catlist`, either with random
//! alphanumerics or by replacing a fixed pattern. Every rewrite keeps the
//! original byte length, so no offsets, pointers or load commands change.
//!
//! # Features
//!
//! - Thin and universal (fat) binaries, 32-bit and 64-bit slices of either
//!   byte order
//! - Exclusion list for class names
//! - Reproducible runs with a fixed seed
//! - Dry-run mode that never touches the file
//!
//! # Example
//!
//! ```no_run
//! use objcpatch::{patch_file, PatchConfig};
//!
//! fn main() -> objcpatch::Result<()> {
//!     let config = PatchConfig::replace("Secret", "Public")?
//!         .with_exclusions(["AppDelegate"])
//!         .with_dry_run(true);
//!
//!     let report = patch_file("MyApp.app/MyApp", &config)?;
//!     println!("{}", report.stats);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod image;
pub mod macho;
pub mod patcher;
pub mod util;

// Re-export main types
pub use config::PatchConfig;
pub use error::{Error, Result};
pub use image::{SourceImage, WorkingImage};
pub use macho::{BinaryKind, MachOSlice};
pub use patcher::{patch_image, PatchOutcome, PatchStats, PatchStrategy, ReplaceRule};

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tempfile::NamedTempFile;
use tracing::info;

/// Summary of a [`patch_file`] run.
#[derive(Debug, Clone)]
pub struct PatchReport {
    /// The patched file
    pub path: PathBuf,
    /// Counters for the run
    pub stats: PatchStats,
    /// True if the file was rewritten on disk
    pub written: bool,
}

/// Patches a Mach-O file in place.
///
/// The file is memory-mapped read-only and patched into a separate buffer.
/// The mapping is released before the buffer is written to a temporary file
/// and renamed over the original path. In dry-run mode nothing is written.
///
/// # Arguments
///
/// * `path` - Path of the binary to patch
/// * `config` - Validated run configuration
///
/// # Returns
///
/// A [`PatchReport`] on success. Fails if the file cannot be read, is not a
/// Mach-O file, or cannot be written back.
pub fn patch_file<P: AsRef<Path>>(path: P, config: &PatchConfig) -> Result<PatchReport> {
    let path = path.as_ref().to_path_buf();

    let file = File::open(&path).map_err(|e| Error::FileOpen {
        path: path.clone(),
        source: e,
    })?;

    // Mapping an empty file fails on some platforms.
    let file_len = file.metadata()?.len();
    if file_len == 0 {
        return Err(Error::NotMachO(0));
    }

    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MemoryMap {
        path: path.clone(),
        source: e,
    })?;

    info!(
        "Patching {} ({} bytes, {} mode)",
        path.display(),
        mmap.len(),
        config.strategy.label()
    );
    let outcome = patch_image(&mmap, config)?;
    drop(mmap);
    drop(file);

    let written = if config.dry_run {
        info!("Dry run complete. Binary was not modified.");
        false
    } else {
        write_image(&path, outcome.image.as_bytes())?;
        info!("Successfully patched binary in-place: {}", path.display());
        true
    };

    info!("{}", outcome.stats);

    Ok(PatchReport {
        path,
        stats: outcome.stats,
        written,
    })
}

/// Replaces `path` with `data`.
///
/// The bytes go to a temporary file in the same directory, which is then
/// renamed over `path`. The original stays intact if any step fails.
fn write_image(path: &Path, data: &[u8]) -> Result<()> {
    let write_err = |e: std::io::Error| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path).map_err(write_err)?.permissions();

    let temp = NamedTempFile::new_in(dir).map_err(write_err)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        writer.write_all(data).map_err(write_err)?;
        writer.flush().map_err(write_err)?;
    }
    temp.as_file().set_permissions(permissions).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;

    temp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
