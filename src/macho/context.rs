//! Parsed view of a single-architecture Mach-O slice.

use zerocopy::FromBytes;

use super::constants::*;
use super::structs::*;
use crate::error::{Error, Result};

// =============================================================================
// Section Info
// =============================================================================

/// Parsed section information, normalized across 32-bit and 64-bit layouts.
#[derive(Debug, Clone)]
pub struct SectionInfo {
    /// Raw section name (16 bytes, null-padded)
    pub sectname: [u8; 16],
    /// Raw segment name (16 bytes, null-padded)
    pub segname: [u8; 16],
    /// Virtual memory address
    pub addr: u64,
    /// Size in bytes
    pub size: u64,
    /// File offset, relative to the slice
    pub offset: u64,
    /// Section type and attributes
    pub flags: u32,
    /// Offset of the section structure within the slice
    pub struct_offset: usize,
}

impl SectionInfo {
    fn from_section(sect: &Section, struct_offset: usize) -> Self {
        Self {
            sectname: sect.sectname,
            segname: sect.segname,
            addr: sect.addr as u64,
            size: sect.size as u64,
            offset: sect.offset as u64,
            flags: sect.flags,
            struct_offset,
        }
    }

    fn from_section64(sect: &Section64, struct_offset: usize) -> Self {
        Self {
            sectname: sect.sectname,
            segname: sect.segname,
            addr: sect.addr,
            size: sect.size,
            offset: sect.offset as u64,
            flags: sect.flags,
            struct_offset,
        }
    }

    /// Returns the section name.
    pub fn name(&self) -> Result<&str> {
        decode_name(&self.sectname).ok_or(Error::InvalidSectionName {
            offset: self.struct_offset,
        })
    }

    /// Returns the full name (segment,section), lossily decoded.
    pub fn full_name(&self) -> String {
        format!(
            "{},{}",
            decode_name(&self.segname).unwrap_or("?"),
            decode_name(&self.sectname).unwrap_or("?")
        )
    }

    /// Returns the section type.
    #[inline]
    pub fn section_type(&self) -> u32 {
        self.flags & SECTION_TYPE
    }

    /// Returns true if the section occupies no bytes in the file.
    #[inline]
    pub fn is_zerofill(&self) -> bool {
        matches!(
            self.section_type(),
            S_ZEROFILL | S_GB_ZEROFILL | S_THREAD_LOCAL_ZEROFILL
        )
    }
}

/// Reads a `T` at `offset`, swapping it to host order when the object's byte
/// order differs from the host's.
fn read_struct<T: FromBytes + ByteSwap>(data: &[u8], offset: usize, big_endian: bool) -> Option<T> {
    let mut value = T::read_from_prefix(data.get(offset..)?).ok()?.0;
    if big_endian != cfg!(target_endian = "big") {
        value.swap_bytes();
    }
    Some(value)
}

// =============================================================================
// Mach-O Slice
// =============================================================================

/// One architecture's Mach-O object.
///
/// Segment and section offsets are relative to the start of the slice; add
/// `base_offset` to get a position in the containing file.
#[derive(Debug, Clone)]
pub struct MachOSlice {
    /// Offset of this slice within the containing file
    pub base_offset: usize,
    /// Size of the slice in bytes
    pub size: usize,
    /// CPU type from the header
    pub cputype: u32,
    /// CPU subtype from the header
    pub cpusubtype: u32,
    /// True for MH_MAGIC_64 objects
    pub is_64: bool,
    /// True for byte-swapped (MH_CIGAM*) objects
    pub big_endian: bool,
    /// Segments in load command order
    pub segments: Vec<Segment>,
    /// Sections in load command order
    pub sections: Vec<SectionInfo>,
}

impl MachOSlice {
    /// Parses a slice from its raw bytes.
    ///
    /// Both byte orders are accepted; big-endian objects are swapped to host
    /// order as each structure is read.
    ///
    /// # Arguments
    /// * `data` - The bytes of this slice only
    /// * `base_offset` - Offset of the slice within the containing file
    pub fn parse(data: &[u8], base_offset: usize) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::buffer_too_small(4, data.len()));
        }

        let magic = crate::util::read_u32_le(data);
        let (is_64, big_endian) = match magic {
            MH_MAGIC_64 => (true, false),
            MH_CIGAM_64 => (true, true),
            MH_MAGIC => (false, false),
            MH_CIGAM => (false, true),
            _ => return Err(Error::InvalidMachoMagic(magic)),
        };

        let (cputype, cpusubtype, ncmds, sizeofcmds, header_size) = if is_64 {
            let header: MachHeader64 = read_struct(data, 0, big_endian)
                .ok_or_else(|| Error::buffer_too_small(MachHeader64::SIZE, data.len()))?;
            (
                header.cputype,
                header.cpusubtype,
                header.ncmds,
                header.sizeofcmds,
                MachHeader64::SIZE,
            )
        } else {
            let header: MachHeader = read_struct(data, 0, big_endian)
                .ok_or_else(|| Error::buffer_too_small(MachHeader::SIZE, data.len()))?;
            (
                header.cputype,
                header.cpusubtype,
                header.ncmds,
                header.sizeofcmds,
                MachHeader::SIZE,
            )
        };

        let mut slice = Self {
            base_offset,
            size: data.len(),
            cputype,
            cpusubtype,
            is_64,
            big_endian,
            segments: Vec::new(),
            sections: Vec::new(),
        };

        slice.parse_load_commands(data, header_size, ncmds, sizeofcmds as usize)?;

        Ok(slice)
    }

    /// Parses all load commands, collecting segments and their sections.
    fn parse_load_commands(
        &mut self,
        data: &[u8],
        header_size: usize,
        ncmds: u32,
        sizeofcmds: usize,
    ) -> Result<()> {
        let mut offset = header_size;
        let end_offset = header_size.saturating_add(sizeofcmds);

        for _ in 0..ncmds {
            if offset + LoadCommand::SIZE > end_offset || offset + LoadCommand::SIZE > data.len() {
                return Err(Error::LoadCommandOverflow { offset });
            }

            let lc: LoadCommand = read_struct(data, offset, self.big_endian)
                .ok_or_else(|| Error::parse(offset, "failed to parse load command"))?;

            let cmdsize = lc.cmdsize as usize;
            if cmdsize < LoadCommand::SIZE {
                return Err(Error::parse(offset, "load command size too small"));
            }
            if offset + cmdsize > data.len() {
                return Err(Error::LoadCommandOverflow { offset });
            }

            let cmd_data = &data[offset..offset + cmdsize];
            match lc.cmd {
                LC_SEGMENT_64 => self.parse_segment64(cmd_data, offset)?,
                LC_SEGMENT => self.parse_segment(cmd_data, offset)?,
                _ => {}
            }

            offset += cmdsize;
        }

        Ok(())
    }

    fn parse_segment64(&mut self, cmd_data: &[u8], offset: usize) -> Result<()> {
        let seg: SegmentCommand64 = read_struct(cmd_data, 0, self.big_endian)
            .ok_or_else(|| Error::parse(offset, "failed to parse segment command"))?;

        let mut sect_offset = SegmentCommand64::SIZE;
        for _ in 0..seg.nsects {
            let sect: Section64 = read_struct(cmd_data, sect_offset, self.big_endian)
                .ok_or_else(|| Error::parse(offset + sect_offset, "failed to parse section"))?;

            self.sections
                .push(SectionInfo::from_section64(&sect, offset + sect_offset));
            sect_offset += Section64::SIZE;
        }

        self.segments.push(Segment::from(&seg));
        Ok(())
    }

    fn parse_segment(&mut self, cmd_data: &[u8], offset: usize) -> Result<()> {
        let seg: SegmentCommand = read_struct(cmd_data, 0, self.big_endian)
            .ok_or_else(|| Error::parse(offset, "failed to parse segment command"))?;

        let mut sect_offset = SegmentCommand::SIZE;
        for _ in 0..seg.nsects {
            let sect: Section = read_struct(cmd_data, sect_offset, self.big_endian)
                .ok_or_else(|| Error::parse(offset + sect_offset, "failed to parse section"))?;

            self.sections
                .push(SectionInfo::from_section(&sect, offset + sect_offset));
            sect_offset += Section::SIZE;
        }

        self.segments.push(Segment::from(&seg));
        Ok(())
    }

    /// Returns the width of a pointer in this slice.
    #[inline]
    pub fn pointer_size(&self) -> usize {
        if self.is_64 {
            8
        } else {
            4
        }
    }

    /// Returns the architecture as a string.
    pub fn arch_name(&self) -> &'static str {
        arch_name(self.cputype, self.cpusubtype)
    }

    /// Converts a virtual address to a file offset within this slice.
    ///
    /// Segments are searched in load command order and the first one whose
    /// range contains `addr` wins. Returns `None` for addresses that are not
    /// backed by any segment, such as those filled in by dyld at load time.
    pub fn addr_to_offset(&self, addr: u64) -> Option<u64> {
        self.segments.iter().find_map(|seg| seg.addr_to_offset(addr))
    }

    /// Returns the file contents of `section`.
    ///
    /// `data` must be the bytes of this slice, as passed to [`parse`](Self::parse).
    pub fn section_data<'a>(&self, data: &'a [u8], section: &SectionInfo) -> Result<&'a [u8]> {
        if section.is_zerofill() {
            return Err(Error::SectionZeroFill {
                name: section.full_name(),
            });
        }

        let out_of_bounds = || Error::SectionOutOfBounds {
            name: section.full_name(),
            offset: section.offset,
            size: section.size,
            slice_size: data.len(),
        };

        let start = usize::try_from(section.offset).map_err(|_| out_of_bounds())?;
        let len = usize::try_from(section.size).map_err(|_| out_of_bounds())?;
        let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
        data.get(start..end).ok_or_else(out_of_bounds)
    }
}
