//! Objective-C metadata patchers.
//!
//! This module contains the core of the tool: it walks every architecture
//! slice of a Mach-O file and rewrites class and category names in a
//! working copy of the file, leaving the source bytes untouched.
//!
//! # Patch Pipeline
//!
//! 1. **Container detection** - thin object or universal binary
//! 2. **Slice parsing** - segments and sections per architecture
//! 3. **Class names** - every entry of `__objc_classname` not excluded
//! 4. **Category names** - names reached through `__objc_catlist`
//!
//! A universal member that fails to parse is reported and skipped; the
//! other members are still patched.

mod catlist;
mod classname;
mod context;
mod slice;
mod strategy;

pub use catlist::*;
pub use classname::*;
pub use context::*;
pub use slice::*;
pub use strategy::*;

use tracing::error;

use crate::config::PatchConfig;
use crate::error::Result;
use crate::image::WorkingImage;
use crate::macho::{detect, BinaryKind, MachOSlice};

/// Result of patching an in-memory image.
#[derive(Debug)]
pub struct PatchOutcome {
    /// The patched bytes, same length as the input
    pub image: WorkingImage,
    /// Counters for the run
    pub stats: PatchStats,
}

/// Patches every slice of `source` according to `config`.
///
/// `source` is never modified. Fails if the input is not a Mach-O file, if a
/// thin file cannot be parsed, or if a universal member fails with an error
/// that is not [recoverable](crate::Error::is_recoverable). Other per-slice
/// and per-section problems are logged and counted in [`PatchStats`].
pub fn patch_image(source: &[u8], config: &PatchConfig) -> Result<PatchOutcome> {
    let kind = detect(source)?;
    let mut ctx = PatchContext::new(source, config);

    match kind {
        BinaryKind::Thin => {
            let slice = MachOSlice::parse(source, 0)?;
            patch_slice(&mut ctx, &slice, source);
        }
        BinaryKind::Universal(archs) => {
            for arch in &archs {
                let parsed = arch.file_range(source.len()).and_then(|range| {
                    let member = &source[range.clone()];
                    MachOSlice::parse(member, range.start).map(|slice| (slice, member))
                });

                match parsed {
                    Ok((slice, member)) => patch_slice(&mut ctx, &slice, member),
                    Err(e) if e.is_recoverable() => {
                        error!(
                            "Failed to get object for architecture {} (index {}): {}",
                            arch.arch_name(),
                            arch.index,
                            e
                        );
                        ctx.stats.slices_failed += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }

    let (image, stats) = ctx.finish();
    Ok(PatchOutcome { image, stats })
}
