//! Run configuration.
//!
//! A [`PatchConfig`] is built and validated before any file is touched and
//! stays immutable for the whole run.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::patcher::PatchStrategy;

/// Options controlling a patch run.
#[derive(Debug, Clone, Default)]
pub struct PatchConfig {
    /// Class names left untouched (exact match)
    pub exclusions: BTreeSet<String>,
    /// How strings are rewritten
    pub strategy: PatchStrategy,
    /// Suppress per-entry progress output
    pub quiet: bool,
    /// Patch in memory only; never write the file
    pub dry_run: bool,
    /// Seed for the random source (OS entropy if unset)
    pub seed: Option<u64>,
}

impl PatchConfig {
    /// Creates a configuration that randomizes every name.
    pub fn randomize() -> Self {
        Self::default()
    }

    /// Creates a configuration that replaces `pattern` with `replacement`.
    ///
    /// Fails if the pattern is empty or the lengths differ.
    pub fn replace(pattern: impl Into<Vec<u8>>, replacement: impl Into<Vec<u8>>) -> Result<Self> {
        Ok(Self {
            strategy: PatchStrategy::replace(pattern, replacement)?,
            ..Default::default()
        })
    }

    /// Adds class names to the exclusion set.
    pub fn with_exclusions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions.extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets quiet mode.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Sets dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Returns true if `name` is in the exclusion set.
    ///
    /// Names that are not valid UTF-8 can never match.
    pub fn is_excluded(&self, name: &[u8]) -> bool {
        std::str::from_utf8(name)
            .map(|s| self.exclusions.contains(s))
            .unwrap_or(false)
    }
}
