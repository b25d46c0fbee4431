//! Byte-level helpers shared by the Mach-O parser and the patchers.
//!
//! This module provides:
//! - Unaligned little-endian and big-endian reads (via byteorder)
//! - Bounds-checked pointer reads sized by slice bitness
//! - NUL-terminated string extraction (via memchr)
//! - Non-overlapping substring search (via memchr::memmem)

use byteorder::{BigEndian, ByteOrder, LittleEndian};

// =============================================================================
// Fast Unaligned Reads
// =============================================================================

/// Reads a little-endian u32 from an unaligned byte slice.
///
/// # Panics
///
/// Panics if `data.len() < 4`.
#[inline(always)]
pub fn read_u32_le(data: &[u8]) -> u32 {
    LittleEndian::read_u32(data)
}

/// Reads a big-endian u32 at `offset`, or `None` if it would overrun.
///
/// Universal headers are always stored big-endian.
#[inline]
pub fn read_u32_be_at(data: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    data.get(offset..end).map(BigEndian::read_u32)
}

/// Reads a big-endian u64 at `offset`, or `None` if it would overrun.
#[inline]
pub fn read_u64_be_at(data: &[u8], offset: usize) -> Option<u64> {
    let end = offset.checked_add(8)?;
    data.get(offset..end).map(BigEndian::read_u64)
}

/// Reads a pointer of `ptr_size` bytes (4 or 8) at `offset`, in the byte
/// order of the object it belongs to.
///
/// Returns `None` if the read would overrun `data`. 32-bit pointers are
/// zero-extended.
#[inline]
pub fn read_ptr_at(data: &[u8], offset: usize, ptr_size: usize, big_endian: bool) -> Option<u64> {
    let end = offset.checked_add(ptr_size)?;
    let bytes = data.get(offset..end)?;
    if big_endian {
        read_ptr::<BigEndian>(bytes, ptr_size)
    } else {
        read_ptr::<LittleEndian>(bytes, ptr_size)
    }
}

#[inline(always)]
fn read_ptr<B: ByteOrder>(bytes: &[u8], ptr_size: usize) -> Option<u64> {
    match ptr_size {
        8 => Some(B::read_u64(bytes)),
        4 => Some(B::read_u32(bytes) as u64),
        _ => None,
    }
}

// =============================================================================
// Strings
// =============================================================================

/// Finds the position of the first null byte in a slice.
///
/// Returns `data.len()` if there is no terminator.
#[inline(always)]
pub fn memchr_null(data: &[u8]) -> usize {
    memchr::memchr(0, data).unwrap_or(data.len())
}

/// Returns the NUL-terminated string starting at `offset`, without the
/// terminator.
///
/// A string running to the end of `data` is returned whole. Returns `None`
/// only if `offset` is past the end of `data`.
#[inline]
pub fn cstr_at(data: &[u8], offset: usize) -> Option<&[u8]> {
    let tail = data.get(offset..)?;
    Some(&tail[..memchr_null(tail)])
}

/// Returns the start positions of all non-overlapping occurrences of
/// `needle` in `haystack`, scanning left to right.
///
/// An empty needle never matches.
pub fn find_non_overlapping(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    memchr::memmem::find_iter(haystack, needle).collect()
}

/// Renders raw name bytes for log output.
#[inline]
pub fn display_name(bytes: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}
