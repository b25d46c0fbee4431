//! Container detection for thin and universal (fat) Mach-O files.
//!
//! Universal headers are big-endian regardless of the architectures they
//! contain. Each architecture entry gives the offset and size of one
//! complete Mach-O object inside the file.

use std::ops::Range;

use super::constants::*;
use crate::error::{Error, Result};
use crate::util::{read_u32_be_at, read_u32_le, read_u64_be_at};

/// Size of the universal header (magic + nfat_arch).
const FAT_HEADER_SIZE: usize = 8;
/// Size of a 32-bit architecture entry.
const FAT_ARCH_SIZE: usize = 20;
/// Size of a 64-bit architecture entry.
const FAT_ARCH_64_SIZE: usize = 32;

/// One architecture entry of a universal binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatArch {
    /// Position in the architecture table
    pub index: usize,
    /// CPU type
    pub cputype: u32,
    /// CPU subtype
    pub cpusubtype: u32,
    /// File offset of the member object
    pub offset: u64,
    /// Size of the member object
    pub size: u64,
}

impl FatArch {
    /// Returns the architecture as a string.
    pub fn arch_name(&self) -> &'static str {
        arch_name(self.cputype, self.cpusubtype)
    }

    /// Returns the byte range of the member object within a file of
    /// `file_size` bytes.
    pub fn file_range(&self, file_size: usize) -> Result<Range<usize>> {
        let out_of_bounds = || Error::FatArchOutOfBounds {
            index: self.index,
            arch: self.arch_name(),
            offset: self.offset,
            size: self.size,
            file_size,
        };

        let start = usize::try_from(self.offset).map_err(|_| out_of_bounds())?;
        let len = usize::try_from(self.size).map_err(|_| out_of_bounds())?;
        let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
        if end > file_size {
            return Err(out_of_bounds());
        }
        Ok(start..end)
    }
}

/// The kind of container a file holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryKind {
    /// A single Mach-O object starting at offset 0
    Thin,
    /// A universal container with one object per architecture
    Universal(Vec<FatArch>),
}

/// Identifies whether `data` is a thin Mach-O or a universal binary.
///
/// Returns [`Error::NotMachO`] for anything else. The architecture table of
/// a universal binary is read here, but member objects are not validated;
/// that happens per slice so one bad member does not reject the file.
pub fn detect(data: &[u8]) -> Result<BinaryKind> {
    let Some(be_magic) = read_u32_be_at(data, 0) else {
        return Err(Error::NotMachO(0));
    };

    if be_magic == FAT_MAGIC || be_magic == FAT_MAGIC_64 {
        let nfat_arch = read_u32_be_at(data, 4).ok_or(Error::TruncatedFatHeader {
            nfat_arch: 0,
            needed: FAT_HEADER_SIZE,
            available: data.len(),
        })?;

        // Java class files start with the same magic followed by a version
        // number that is always large.
        if nfat_arch >= FAT_MAX_ARCHS {
            return Err(Error::NotMachO(be_magic));
        }

        return parse_fat_archs(data, nfat_arch, be_magic == FAT_MAGIC_64)
            .map(BinaryKind::Universal);
    }

    match read_u32_le(&data[..4]) {
        MH_MAGIC | MH_MAGIC_64 | MH_CIGAM | MH_CIGAM_64 => Ok(BinaryKind::Thin),
        magic => Err(Error::NotMachO(magic)),
    }
}

fn parse_fat_archs(data: &[u8], nfat_arch: u32, is_64: bool) -> Result<Vec<FatArch>> {
    let entry_size = if is_64 { FAT_ARCH_64_SIZE } else { FAT_ARCH_SIZE };
    let needed = FAT_HEADER_SIZE + nfat_arch as usize * entry_size;
    if needed > data.len() {
        return Err(Error::TruncatedFatHeader {
            nfat_arch,
            needed,
            available: data.len(),
        });
    }

    let truncated = || Error::TruncatedFatHeader {
        nfat_arch,
        needed,
        available: data.len(),
    };

    let mut archs = Vec::with_capacity(nfat_arch as usize);
    for index in 0..nfat_arch as usize {
        let base = FAT_HEADER_SIZE + index * entry_size;
        let cputype = read_u32_be_at(data, base).ok_or_else(truncated)?;
        let cpusubtype = read_u32_be_at(data, base + 4).ok_or_else(truncated)?;

        // The trailing align field is not needed to locate the member.
        let (offset, size) = if is_64 {
            (
                read_u64_be_at(data, base + 8).ok_or_else(truncated)?,
                read_u64_be_at(data, base + 16).ok_or_else(truncated)?,
            )
        } else {
            (
                read_u32_be_at(data, base + 8).ok_or_else(truncated)? as u64,
                read_u32_be_at(data, base + 12).ok_or_else(truncated)? as u64,
            )
        };

        archs.push(FatArch {
            index,
            cputype,
            cpusubtype,
            offset,
            size,
        });
    }

    Ok(archs)
}
