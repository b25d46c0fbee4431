//! Error types for the Objective-C metadata patcher.
//!
//! Errors fall into three tiers: configuration and load errors abort a run
//! before anything is written, slice and section errors are logged and the
//! affected region is skipped, and write errors abort after patching.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for patching operations.
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open file '{path}': {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to memory map file '{path}': {source}")]
    MemoryMap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ==================== Configuration Errors ====================
    #[error("replacement pattern cannot be empty")]
    EmptyPattern,

    #[error(
        "pattern and replacement must be the same length for binary safety \
         (pattern: {pattern_len} bytes, replacement: {replacement_len} bytes)"
    )]
    PatternLengthMismatch {
        pattern_len: usize,
        replacement_len: usize,
    },

    // ==================== Container Errors ====================
    #[error("not a Mach-O binary (magic: {0:#010x})")]
    NotMachO(u32),

    #[error("universal header truncated: {nfat_arch} architectures need {needed} bytes, have {available}")]
    TruncatedFatHeader {
        nfat_arch: u32,
        needed: usize,
        available: usize,
    },

    #[error("architecture {index} ({arch}) spans {offset:#x}+{size:#x}, beyond file size {file_size:#x}")]
    FatArchOutOfBounds {
        index: usize,
        arch: &'static str,
        offset: u64,
        size: u64,
        file_size: usize,
    },

    // ==================== Mach-O Errors ====================
    #[error("invalid Mach-O magic: {0:#x}")]
    InvalidMachoMagic(u32),

    #[error("load command at offset {offset:#x} extends beyond header")]
    LoadCommandOverflow { offset: usize },

    #[error("section '{name}' at {offset:#x}+{size:#x} lies outside the slice ({slice_size:#x} bytes)")]
    SectionOutOfBounds {
        name: String,
        offset: u64,
        size: u64,
        slice_size: usize,
    },

    #[error("section '{name}' has no file contents (zero-fill)")]
    SectionZeroFill { name: String },

    #[error("section name at offset {offset:#x} is not valid UTF-8")]
    InvalidSectionName { offset: usize },

    // ==================== Parse Errors ====================
    #[error("parse error at offset {offset:#x}: {reason}")]
    Parse { offset: usize, reason: String },

    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
}

/// A specialized Result type for patching operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if this error only affects one slice or section.
    ///
    /// Recoverable errors are logged and the affected region is skipped;
    /// the remaining slices and sections are still processed.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::FatArchOutOfBounds { .. }
                | Error::InvalidMachoMagic(_)
                | Error::LoadCommandOverflow { .. }
                | Error::SectionOutOfBounds { .. }
                | Error::SectionZeroFill { .. }
                | Error::InvalidSectionName { .. }
                | Error::Parse { .. }
                | Error::BufferTooSmall { .. }
        )
    }

    /// Creates a parse error with a formatted message.
    #[inline]
    pub fn parse(offset: usize, reason: impl Into<String>) -> Self {
        Error::Parse {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a buffer too small error.
    #[inline]
    pub fn buffer_too_small(needed: usize, available: usize) -> Self {
        Error::BufferTooSmall { needed, available }
    }
}
