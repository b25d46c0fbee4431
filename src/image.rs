//! Source and working images.
//!
//! The original file bytes and the buffer being patched are distinct types.
//! [`SourceImage`] can only be read and [`WorkingImage`] can only be written
//! by the patchers, so a pointer chain is always followed through the
//! original bytes even after the strings it passes through were patched.

use std::ops::Range;

use crate::error::{Error, Result};
use crate::util::{cstr_at, read_ptr_at};

/// Read-only view of the original file contents.
#[derive(Debug, Clone, Copy)]
pub struct SourceImage<'a> {
    data: &'a [u8],
}

impl<'a> SourceImage<'a> {
    /// Wraps the original bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Returns the size in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the image is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the whole image.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the bytes in `range`, or `None` if it is out of bounds.
    #[inline]
    pub fn get(&self, range: Range<usize>) -> Option<&'a [u8]> {
        self.data.get(range)
    }

    /// Reads a pointer of `ptr_size` bytes at an absolute file offset.
    pub fn read_ptr(&self, offset: u64, ptr_size: usize, big_endian: bool) -> Option<u64> {
        read_ptr_at(self.data, usize::try_from(offset).ok()?, ptr_size, big_endian)
    }

    /// Reads the NUL-terminated string at an absolute file offset.
    pub fn read_cstr(&self, offset: u64) -> Option<&'a [u8]> {
        cstr_at(self.data, usize::try_from(offset).ok()?)
    }

    /// Creates a working copy with identical contents.
    pub fn to_working(&self) -> WorkingImage {
        WorkingImage {
            data: self.data.to_vec(),
        }
    }
}

/// The buffer patches are written into; persisted at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingImage {
    data: Vec<u8>,
}

impl WorkingImage {
    /// Returns the size in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the image is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Overwrites `bytes.len()` bytes at an absolute file offset.
    ///
    /// The image never grows; a write past the end is rejected.
    pub fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        let available = self.data.len();
        let start = usize::try_from(offset)
            .map_err(|_| Error::buffer_too_small(usize::MAX, available))?;
        let end = start
            .checked_add(bytes.len())
            .filter(|&end| end <= available)
            .ok_or_else(|| Error::buffer_too_small(start.saturating_add(bytes.len()), available))?;

        self.data[start..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Returns the patched contents for persistence.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
