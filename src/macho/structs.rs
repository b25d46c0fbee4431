//! Mach-O binary structures.
//!
//! These structures match the on-disk format of Mach-O files and are read in
//! host (little-endian) order. Big-endian objects are read the same way and
//! then fixed up with [`ByteSwap`]. Both the 32-bit and 64-bit variants of
//! the header, segment command and section are provided; the context
//! normalizes them into [`Segment`] and [`SectionInfo`](super::SectionInfo).

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::constants::*;

/// Decodes a fixed-width, NUL-padded name field.
fn fixed_name(raw: &[u8; 16]) -> Option<&str> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(16);
    std::str::from_utf8(&raw[..end]).ok()
}

/// Encodes a name into a fixed-width, NUL-padded field.
fn set_fixed_name(raw: &mut [u8; 16], name: &str) {
    *raw = [0u8; 16];
    let bytes = name.as_bytes();
    let len = bytes.len().min(16);
    raw[..len].copy_from_slice(&bytes[..len]);
}

// =============================================================================
// Header Structures
// =============================================================================

/// 32-bit Mach-O header.
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct MachHeader {
    /// Magic number (MH_MAGIC)
    pub magic: u32,
    /// CPU type
    pub cputype: u32,
    /// CPU subtype
    pub cpusubtype: u32,
    /// File type
    pub filetype: u32,
    /// Number of load commands
    pub ncmds: u32,
    /// Size of load commands
    pub sizeofcmds: u32,
    /// Flags
    pub flags: u32,
}

impl MachHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 28;
}

/// 64-bit Mach-O header.
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct MachHeader64 {
    /// Magic number (MH_MAGIC_64)
    pub magic: u32,
    /// CPU type
    pub cputype: u32,
    /// CPU subtype
    pub cpusubtype: u32,
    /// File type
    pub filetype: u32,
    /// Number of load commands
    pub ncmds: u32,
    /// Size of load commands
    pub sizeofcmds: u32,
    /// Flags
    pub flags: u32,
    /// Reserved
    pub reserved: u32,
}

impl MachHeader64 {
    /// Size of the header in bytes.
    pub const SIZE: usize = 32;
}

// =============================================================================
// Load Command Header
// =============================================================================

/// Generic load command header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct LoadCommand {
    /// Type of load command
    pub cmd: u32,
    /// Size of load command
    pub cmdsize: u32,
}

impl LoadCommand {
    /// Size of the load command header.
    pub const SIZE: usize = 8;
}

// =============================================================================
// Segment Commands
// =============================================================================

/// 32-bit segment command.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct SegmentCommand {
    /// LC_SEGMENT
    pub cmd: u32,
    /// Size of this load command
    pub cmdsize: u32,
    /// Segment name (16 bytes, null-padded)
    pub segname: [u8; 16],
    /// Virtual memory address
    pub vmaddr: u32,
    /// Virtual memory size
    pub vmsize: u32,
    /// File offset
    pub fileoff: u32,
    /// Amount of file to map
    pub filesize: u32,
    /// Maximum VM protection
    pub maxprot: u32,
    /// Initial VM protection
    pub initprot: u32,
    /// Number of sections
    pub nsects: u32,
    /// Flags
    pub flags: u32,
}

impl SegmentCommand {
    /// Size of the segment command (without sections).
    pub const SIZE: usize = 56;

    /// Sets the segment name from a string.
    pub fn set_name(&mut self, name: &str) {
        set_fixed_name(&mut self.segname, name);
    }
}

impl Default for SegmentCommand {
    fn default() -> Self {
        Self {
            cmd: LC_SEGMENT,
            cmdsize: Self::SIZE as u32,
            segname: [0u8; 16],
            vmaddr: 0,
            vmsize: 0,
            fileoff: 0,
            filesize: 0,
            maxprot: 0,
            initprot: 0,
            nsects: 0,
            flags: 0,
        }
    }
}

/// 64-bit segment command.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct SegmentCommand64 {
    /// LC_SEGMENT_64
    pub cmd: u32,
    /// Size of this load command
    pub cmdsize: u32,
    /// Segment name (16 bytes, null-padded)
    pub segname: [u8; 16],
    /// Virtual memory address
    pub vmaddr: u64,
    /// Virtual memory size
    pub vmsize: u64,
    /// File offset
    pub fileoff: u64,
    /// Amount of file to map
    pub filesize: u64,
    /// Maximum VM protection
    pub maxprot: u32,
    /// Initial VM protection
    pub initprot: u32,
    /// Number of sections
    pub nsects: u32,
    /// Flags
    pub flags: u32,
}

impl SegmentCommand64 {
    /// Size of the segment command (without sections).
    pub const SIZE: usize = 72;

    /// Sets the segment name from a string.
    pub fn set_name(&mut self, name: &str) {
        set_fixed_name(&mut self.segname, name);
    }
}

impl Default for SegmentCommand64 {
    fn default() -> Self {
        Self {
            cmd: LC_SEGMENT_64,
            cmdsize: Self::SIZE as u32,
            segname: [0u8; 16],
            vmaddr: 0,
            vmsize: 0,
            fileoff: 0,
            filesize: 0,
            maxprot: 0,
            initprot: 0,
            nsects: 0,
            flags: 0,
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// 32-bit section.
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Section {
    /// Section name (16 bytes, null-padded)
    pub sectname: [u8; 16],
    /// Segment name (16 bytes, null-padded)
    pub segname: [u8; 16],
    /// Virtual memory address
    pub addr: u32,
    /// Size in bytes
    pub size: u32,
    /// File offset
    pub offset: u32,
    /// Alignment (power of 2)
    pub align: u32,
    /// File offset of relocation entries
    pub reloff: u32,
    /// Number of relocation entries
    pub nreloc: u32,
    /// Flags
    pub flags: u32,
    /// Reserved (for runtime use)
    pub reserved1: u32,
    /// Reserved (for runtime use)
    pub reserved2: u32,
}

impl Section {
    /// Size of a section entry.
    pub const SIZE: usize = 68;

    /// Sets the section and segment names.
    pub fn set_names(&mut self, segment: &str, section: &str) {
        set_fixed_name(&mut self.segname, segment);
        set_fixed_name(&mut self.sectname, section);
    }
}

/// 64-bit section.
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Section64 {
    /// Section name (16 bytes, null-padded)
    pub sectname: [u8; 16],
    /// Segment name (16 bytes, null-padded)
    pub segname: [u8; 16],
    /// Virtual memory address
    pub addr: u64,
    /// Size in bytes
    pub size: u64,
    /// File offset
    pub offset: u32,
    /// Alignment (power of 2)
    pub align: u32,
    /// File offset of relocation entries
    pub reloff: u32,
    /// Number of relocation entries
    pub nreloc: u32,
    /// Flags
    pub flags: u32,
    /// Reserved (for runtime use)
    pub reserved1: u32,
    /// Reserved (for runtime use)
    pub reserved2: u32,
    /// Reserved
    pub reserved3: u32,
}

impl Section64 {
    /// Size of a section entry.
    pub const SIZE: usize = 80;

    /// Sets the section and segment names.
    pub fn set_names(&mut self, segment: &str, section: &str) {
        set_fixed_name(&mut self.segname, segment);
        set_fixed_name(&mut self.sectname, section);
    }
}

// =============================================================================
// Byte Swapping
// =============================================================================

/// Reverses the byte order of every integer field.
///
/// Name fields are byte strings and are left alone.
pub trait ByteSwap {
    /// Swaps all integer fields in place.
    fn swap_bytes(&mut self);
}

macro_rules! impl_byte_swap {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl ByteSwap for $ty {
            fn swap_bytes(&mut self) {
                $(self.$field = self.$field.swap_bytes();)*
            }
        }
    };
}

impl_byte_swap!(MachHeader {
    magic, cputype, cpusubtype, filetype, ncmds, sizeofcmds, flags
});
impl_byte_swap!(MachHeader64 {
    magic, cputype, cpusubtype, filetype, ncmds, sizeofcmds, flags, reserved
});
impl_byte_swap!(LoadCommand { cmd, cmdsize });
impl_byte_swap!(SegmentCommand {
    cmd, cmdsize, vmaddr, vmsize, fileoff, filesize, maxprot, initprot, nsects, flags
});
impl_byte_swap!(SegmentCommand64 {
    cmd, cmdsize, vmaddr, vmsize, fileoff, filesize, maxprot, initprot, nsects, flags
});
impl_byte_swap!(Section {
    addr, size, offset, align, reloff, nreloc, flags, reserved1, reserved2
});
impl_byte_swap!(Section64 {
    addr, size, offset, align, reloff, nreloc, flags, reserved1, reserved2, reserved3
});

// =============================================================================
// Normalized Segment
// =============================================================================

/// A segment's address mapping, independent of the command's bitness.
///
/// Only the fields needed for address translation are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment name
    pub name: String,
    /// Virtual memory address
    pub vmaddr: u64,
    /// Virtual memory size
    pub vmsize: u64,
    /// File offset, relative to the slice
    pub fileoff: u64,
    /// Bytes backed by the file
    pub filesize: u64,
}

impl Segment {
    /// Returns true if `addr` falls in `[vmaddr, vmaddr + vmsize)`.
    ///
    /// A range that would overflow is clamped to `u64::MAX`.
    #[inline]
    pub fn contains_addr(&self, addr: u64) -> bool {
        let end = self.vmaddr.saturating_add(self.vmsize);
        addr >= self.vmaddr && addr < end
    }

    /// Translates `addr` to a slice-relative file offset, if contained.
    #[inline]
    pub fn addr_to_offset(&self, addr: u64) -> Option<u64> {
        if self.contains_addr(addr) {
            self.fileoff.checked_add(addr - self.vmaddr)
        } else {
            None
        }
    }
}

impl From<&SegmentCommand> for Segment {
    fn from(cmd: &SegmentCommand) -> Self {
        Self {
            name: fixed_name(&cmd.segname).unwrap_or_default().to_string(),
            vmaddr: cmd.vmaddr as u64,
            vmsize: cmd.vmsize as u64,
            fileoff: cmd.fileoff as u64,
            filesize: cmd.filesize as u64,
        }
    }
}

impl From<&SegmentCommand64> for Segment {
    fn from(cmd: &SegmentCommand64) -> Self {
        Self {
            name: fixed_name(&cmd.segname).unwrap_or_default().to_string(),
            vmaddr: cmd.vmaddr,
            vmsize: cmd.vmsize,
            fileoff: cmd.fileoff,
            filesize: cmd.filesize,
        }
    }
}

/// Decodes a raw 16-byte section or segment name.
///
/// Returns `None` if the bytes before the first NUL are not valid UTF-8.
pub fn decode_name(raw: &[u8; 16]) -> Option<&str> {
    fixed_name(raw)
}

// =============================================================================
// Display Implementations
// =============================================================================

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Segment {{ name: \"{}\", vm: {:#x}+{:#x}, file: {:#x}+{:#x} }}",
            self.name, self.vmaddr, self.vmsize, self.fileoff, self.filesize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_sizes() {
        assert_eq!(std::mem::size_of::<MachHeader>(), MachHeader::SIZE);
        assert_eq!(std::mem::size_of::<MachHeader64>(), MachHeader64::SIZE);
        assert_eq!(std::mem::size_of::<SegmentCommand>(), SegmentCommand::SIZE);
        assert_eq!(
            std::mem::size_of::<SegmentCommand64>(),
            SegmentCommand64::SIZE
        );
        assert_eq!(std::mem::size_of::<Section>(), Section::SIZE);
        assert_eq!(std::mem::size_of::<Section64>(), Section64::SIZE);
    }

    #[test]
    fn test_segment_translation() {
        let seg = Segment {
            name: "__DATA".into(),
            vmaddr: 0x1000,
            vmsize: 0x200,
            fileoff: 0x400,
            filesize: 0x200,
        };
        assert_eq!(seg.addr_to_offset(0x1050), Some(0x450));
        assert_eq!(seg.addr_to_offset(0x1000), Some(0x400));
        assert_eq!(seg.addr_to_offset(0x11FF), Some(0x5FF));
        assert_eq!(seg.addr_to_offset(0x1200), None);
        assert_eq!(seg.addr_to_offset(0x1300), None);
        assert_eq!(seg.addr_to_offset(0xFFF), None);
    }

    #[test]
    fn test_segment_overflowing_range() {
        let seg = Segment {
            name: "__HUGE".into(),
            vmaddr: u64::MAX - 0x10,
            vmsize: 0x100,
            fileoff: 0,
            filesize: 0,
        };
        assert!(seg.contains_addr(u64::MAX - 1));
        assert_eq!(seg.addr_to_offset(u64::MAX - 0x10), Some(0));
    }

    #[test]
    fn test_segment_from_32bit_command() {
        let mut cmd = SegmentCommand::default();
        cmd.set_name("__TEXT");
        cmd.vmaddr = 0x4000;
        cmd.vmsize = 0x1000;
        cmd.fileoff = 0;
        cmd.filesize = 0x1000;

        let seg = Segment::from(&cmd);
        assert_eq!(seg.name, "__TEXT");
        assert_eq!(seg.addr_to_offset(0x4010), Some(0x10));
    }

    #[test]
    fn test_byte_swap_section() {
        let mut sect = Section64::default();
        sect.set_names("__DATA", SECT_OBJC_CATLIST);
        sect.addr = 0x1122_3344_5566_7788;
        sect.offset = 0x400;

        let mut swapped = sect;
        swapped.swap_bytes();
        assert_eq!(swapped.addr, 0x8877_6655_4433_2211);
        assert_eq!(swapped.offset, 0x0004_0000);
        assert_eq!(swapped.sectname, sect.sectname);

        swapped.swap_bytes();
        assert_eq!(swapped.addr, sect.addr);
    }

    #[test]
    fn test_decode_name() {
        let mut raw = [0u8; 16];
        raw[..16].copy_from_slice(b"__objc_classname");
        assert_eq!(decode_name(&raw), Some("__objc_classname"));

        let bad = [0xFFu8; 16];
        assert_eq!(decode_name(&bad), None);
    }
}
