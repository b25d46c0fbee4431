//! Patch context that holds state for one run across all slices.

use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::config::PatchConfig;
use crate::image::{SourceImage, WorkingImage};
use crate::util::display_name;

/// Which kind of metadata string is being patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// An entry of `__objc_classname`
    Class,
    /// A category name reached through `__objc_catlist`
    Category,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Class => f.write_str("[CLASS]"),
            EntryKind::Category => f.write_str("[CATEGORY]"),
        }
    }
}

/// Counters collected during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchStats {
    /// Slices that were parsed and scanned
    pub slices_processed: usize,
    /// Universal members that failed to parse
    pub slices_failed: usize,
    /// Target sections that could not be read
    pub sections_skipped: usize,
    /// Class names rewritten
    pub classes_patched: usize,
    /// Class names left alone because they were excluded
    pub classes_excluded: usize,
    /// Category names rewritten
    pub categories_patched: usize,
    /// Category slots whose pointer chain did not resolve
    pub categories_unresolved: usize,
}

impl PatchStats {
    /// Total number of strings rewritten.
    pub fn total_patched(&self) -> usize {
        self.classes_patched + self.categories_patched
    }
}

impl fmt::Display for PatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} classes, {} categories patched ({} excluded, {} unresolved) across {} slices",
            self.classes_patched,
            self.categories_patched,
            self.classes_excluded,
            self.categories_unresolved,
            self.slices_processed
        )?;
        if self.slices_failed > 0 {
            write!(f, ", {} slices failed", self.slices_failed)?;
        }
        if self.sections_skipped > 0 {
            write!(f, ", {} sections skipped", self.sections_skipped)?;
        }
        Ok(())
    }
}

/// Context for a patch run.
///
/// Reads go through `source`, writes through `working`; the two never
/// alias. The random source is seeded once and shared by every entry.
#[derive(Debug)]
pub struct PatchContext<'a> {
    /// The original, unmodified file
    pub source: SourceImage<'a>,
    /// The buffer receiving patches
    pub working: WorkingImage,
    /// Run configuration
    pub config: &'a PatchConfig,
    /// Counters for the final report
    pub stats: PatchStats,
    rng: StdRng,
}

impl<'a> PatchContext<'a> {
    /// Creates a context with a working copy of `source`.
    pub fn new(source: &'a [u8], config: &'a PatchConfig) -> Self {
        let source = SourceImage::new(source);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            working: source.to_working(),
            source,
            config,
            stats: PatchStats::default(),
            rng,
        }
    }

    /// Logs a progress message unless quiet mode is on.
    pub fn info(&self, message: impl fmt::Display) {
        if !self.config.quiet {
            info!("{}", message);
        }
    }

    /// Logs a warning. Warnings are shown even in quiet mode.
    pub fn warn(&self, message: impl fmt::Display) {
        warn!("{}", message);
    }

    /// Applies the configured strategy to `original`, found at absolute file
    /// offset `offset`, and writes the result into the working image.
    ///
    /// Returns true if the string was changed.
    pub fn patch_string(&mut self, kind: EntryKind, offset: u64, original: &[u8]) -> bool {
        let Some(patched) = self.config.strategy.apply(original, &mut self.rng) else {
            return false;
        };
        debug_assert_eq!(patched.len(), original.len());

        if let Err(e) = self.working.write_at(offset, &patched) {
            self.warn(format_args!(
                "{} Cannot patch {} at file offset {}: {}",
                kind,
                display_name(original),
                offset,
                e
            ));
            return false;
        }

        self.info(format_args!(
            "{} Found: {} at file offset {}",
            kind,
            display_name(original),
            offset
        ));
        self.info(format_args!("  -> Replaced with: {}", display_name(&patched)));
        true
    }

    /// Finishes the run, returning the working image and counters.
    pub fn finish(self) -> (WorkingImage, PatchStats) {
        (self.working, self.stats)
    }
}
