//! Patch strategies: how a single metadata string is rewritten.
//!
//! The scanners in [`classname`](super::classname) and
//! [`catlist`](super::catlist) only ever call [`PatchStrategy::apply`];
//! they do not know which mode is active.

use rand::distr::{Alphanumeric, Distribution};
use rand::Rng;

use crate::error::{Error, Result};
use crate::util::find_non_overlapping;

/// A validated pattern/replacement pair of equal, non-zero length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceRule {
    pattern: Vec<u8>,
    replacement: Vec<u8>,
}

impl ReplaceRule {
    /// Creates a rule, rejecting an empty pattern or a length mismatch.
    ///
    /// Equal lengths guarantee that a patched string keeps its size, so no
    /// other offset in the binary moves.
    pub fn new(pattern: impl Into<Vec<u8>>, replacement: impl Into<Vec<u8>>) -> Result<Self> {
        let pattern = pattern.into();
        let replacement = replacement.into();

        if pattern.is_empty() {
            return Err(Error::EmptyPattern);
        }
        if pattern.len() != replacement.len() {
            return Err(Error::PatternLengthMismatch {
                pattern_len: pattern.len(),
                replacement_len: replacement.len(),
            });
        }

        Ok(Self {
            pattern,
            replacement,
        })
    }

    /// Replaces every non-overlapping occurrence of the pattern.
    ///
    /// Scanning resumes after each replacement, so text introduced by a
    /// replacement is never matched again. Returns `None` if the pattern
    /// does not occur.
    pub fn apply(&self, original: &[u8]) -> Option<Vec<u8>> {
        let hits = find_non_overlapping(original, &self.pattern);
        if hits.is_empty() {
            return None;
        }

        let mut patched = original.to_vec();
        for pos in hits {
            patched[pos..pos + self.replacement.len()].copy_from_slice(&self.replacement);
        }
        Some(patched)
    }
}

/// How metadata strings are rewritten for the whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PatchStrategy {
    /// Overwrite every string with random alphanumeric text
    #[default]
    Randomize,
    /// Substitute an equal-length pattern inside each string
    Replace(ReplaceRule),
}

impl PatchStrategy {
    /// Creates a validated replace strategy.
    pub fn replace(pattern: impl Into<Vec<u8>>, replacement: impl Into<Vec<u8>>) -> Result<Self> {
        ReplaceRule::new(pattern, replacement).map(PatchStrategy::Replace)
    }

    /// Computes the new contents for `original`.
    ///
    /// Returns `None` when the string should be left untouched. A returned
    /// value always has exactly `original.len()` bytes.
    pub fn apply<R: Rng + ?Sized>(&self, original: &[u8], rng: &mut R) -> Option<Vec<u8>> {
        if original.is_empty() {
            return None;
        }

        match self {
            PatchStrategy::Randomize => Some(random_alphanumeric(original.len(), rng)),
            PatchStrategy::Replace(rule) => rule.apply(original),
        }
    }

    /// Returns a short label for log output.
    pub fn label(&self) -> &'static str {
        match self {
            PatchStrategy::Randomize => "randomize",
            PatchStrategy::Replace(_) => "replace",
        }
    }
}

/// Generates `len` characters drawn uniformly from `[A-Za-z0-9]`.
pub fn random_alphanumeric<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<u8> {
    (0..len).map(|_| Alphanumeric.sample(&mut *rng)).collect()
}
