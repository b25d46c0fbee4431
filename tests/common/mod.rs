//! Synthetic Mach-O images for integration tests.

#![allow(dead_code)]

use objcpatch::macho::*;
use zerocopy::IntoBytes;

/// Size of every generated slice.
pub const SLICE_SIZE: usize = 0x1000;
/// Slice-relative offset of the class name table.
pub const CLASSNAME_OFFSET: usize = 0x400;
/// Slice-relative offset of the category list.
pub const CATLIST_OFFSET: usize = 0x600;
/// Slice-relative offset of the first category record.
pub const RECORDS_OFFSET: usize = 0x700;
/// Slice-relative offset of the category name strings.
pub const CATNAMES_OFFSET: usize = 0x800;

const RECORD_STRIDE: usize = 0x20;

/// Describes one architecture slice to generate.
///
/// The single segment starts at `fileoff` within the slice and is mapped at
/// `vmbase`, so a slice offset `off` lives at `vmbase + (off - fileoff)`.
#[derive(Debug, Clone)]
pub struct SliceLayout {
    pub cputype: u32,
    pub is_64: bool,
    pub big_endian: bool,
    pub vmbase: u64,
    pub fileoff: usize,
    pub classes: Vec<&'static str>,
    pub categories: Vec<&'static str>,
}

impl SliceLayout {
    fn new(
        cputype: u32,
        is_64: bool,
        classes: &[&'static str],
        categories: &[&'static str],
    ) -> Self {
        Self {
            cputype,
            is_64,
            big_endian: false,
            vmbase: if is_64 { 0x1_0000_0000 } else { 0x4000 },
            fileoff: 0,
            classes: classes.to_vec(),
            categories: categories.to_vec(),
        }
    }

    pub fn arm64(classes: &[&'static str], categories: &[&'static str]) -> Self {
        Self::new(CPU_TYPE_ARM64, true, classes, categories)
    }

    pub fn x86_64(classes: &[&'static str], categories: &[&'static str]) -> Self {
        Self::new(CPU_TYPE_X86_64, true, classes, categories)
    }

    pub fn i386(classes: &[&'static str], categories: &[&'static str]) -> Self {
        Self::new(CPU_TYPE_X86, false, classes, categories)
    }

    /// A big-endian 32-bit PowerPC slice.
    pub fn ppc(classes: &[&'static str], categories: &[&'static str]) -> Self {
        Self {
            big_endian: true,
            ..Self::new(CPU_TYPE_POWERPC, false, classes, categories)
        }
    }

    /// Maps the segment at `vmbase`.
    pub fn with_vmbase(mut self, vmbase: u64) -> Self {
        self.vmbase = vmbase;
        self
    }

    /// Starts the segment at slice offset `fileoff` (below the name tables).
    pub fn with_fileoff(mut self, fileoff: usize) -> Self {
        assert!(fileoff <= CLASSNAME_OFFSET);
        self.fileoff = fileoff;
        self
    }

    /// Virtual address of slice offset `off`.
    pub fn va(&self, off: usize) -> u64 {
        self.vmbase + (off - self.fileoff) as u64
    }

    fn segment_size(&self) -> usize {
        SLICE_SIZE - self.fileoff
    }

    fn ptr_size(&self) -> usize {
        if self.is_64 {
            8
        } else {
            4
        }
    }

    /// Offset of class `index` within the slice.
    pub fn class_offset(&self, index: usize) -> usize {
        CLASSNAME_OFFSET
            + self.classes[..index]
                .iter()
                .map(|name| name.len() + 1)
                .sum::<usize>()
    }

    /// Offset of category `index`'s name within the slice.
    pub fn category_offset(&self, index: usize) -> usize {
        CATNAMES_OFFSET
            + self.categories[..index]
                .iter()
                .map(|name| name.len() + 1)
                .sum::<usize>()
    }

    /// Builds the slice bytes.
    ///
    /// One segment maps the whole slice; it holds a class name table and a
    /// category list whose records point at a separate string area.
    pub fn build(&self) -> Vec<u8> {
        let mut data = vec![0u8; SLICE_SIZE];
        let ptr = self.ptr_size();

        let classnames: Vec<u8> = self
            .classes
            .iter()
            .flat_map(|name| name.bytes().chain(std::iter::once(0)))
            .collect();
        let catlist_size = self.categories.len() * ptr;

        if self.is_64 {
            self.write_commands_64(&mut data, classnames.len() as u64, catlist_size as u64);
        } else {
            self.write_commands_32(&mut data, classnames.len() as u32, catlist_size as u32);
        }

        data[CLASSNAME_OFFSET..CLASSNAME_OFFSET + classnames.len()].copy_from_slice(&classnames);

        for (i, name) in self.categories.iter().enumerate() {
            let slot = CATLIST_OFFSET + i * ptr;
            let record = RECORDS_OFFSET + i * RECORD_STRIDE;
            let name_off = self.category_offset(i);

            self.write_ptr(&mut data, slot, self.va(record));
            self.write_ptr(&mut data, record, self.va(name_off));
            data[name_off..name_off + name.len()].copy_from_slice(name.as_bytes());
        }

        data
    }

    fn write_commands_64(&self, data: &mut [u8], classnames_size: u64, catlist_size: u64) {
        let cmdsize = SegmentCommand64::SIZE + 2 * Section64::SIZE;
        let mut header = MachHeader64 {
            magic: MH_MAGIC_64,
            cputype: self.cputype,
            filetype: 0x2,
            ncmds: 1,
            sizeofcmds: cmdsize as u32,
            ..Default::default()
        };
        self.store(&mut header);
        data[..MachHeader64::SIZE].copy_from_slice(header.as_bytes());

        let mut seg = SegmentCommand64::default();
        seg.cmd = LC_SEGMENT_64;
        seg.cmdsize = cmdsize as u32;
        seg.set_name("__DATA");
        seg.vmaddr = self.vmbase;
        seg.vmsize = self.segment_size() as u64;
        seg.fileoff = self.fileoff as u64;
        seg.filesize = self.segment_size() as u64;
        seg.nsects = 2;

        let mut classname = Section64::default();
        classname.set_names("__TEXT", SECT_OBJC_CLASSNAME);
        classname.addr = self.va(CLASSNAME_OFFSET);
        classname.size = classnames_size;
        classname.offset = CLASSNAME_OFFSET as u32;
        classname.flags = S_CSTRING_LITERALS;

        let mut catlist = Section64::default();
        catlist.set_names("__DATA", SECT_OBJC_CATLIST);
        catlist.addr = self.va(CATLIST_OFFSET);
        catlist.size = catlist_size;
        catlist.offset = CATLIST_OFFSET as u32;

        self.store(&mut seg);
        self.store(&mut classname);
        self.store(&mut catlist);
        let mut off = MachHeader64::SIZE;
        for bytes in [seg.as_bytes(), classname.as_bytes(), catlist.as_bytes()] {
            data[off..off + bytes.len()].copy_from_slice(bytes);
            off += bytes.len();
        }
    }

    fn write_commands_32(&self, data: &mut [u8], classnames_size: u32, catlist_size: u32) {
        let cmdsize = SegmentCommand::SIZE + 2 * Section::SIZE;
        let mut header = MachHeader {
            magic: MH_MAGIC,
            cputype: self.cputype,
            filetype: 0x2,
            ncmds: 1,
            sizeofcmds: cmdsize as u32,
            ..Default::default()
        };
        self.store(&mut header);
        data[..MachHeader::SIZE].copy_from_slice(header.as_bytes());

        let mut seg = SegmentCommand::default();
        seg.cmd = LC_SEGMENT;
        seg.cmdsize = cmdsize as u32;
        seg.set_name("__DATA");
        seg.vmaddr = self.vmbase as u32;
        seg.vmsize = self.segment_size() as u32;
        seg.fileoff = self.fileoff as u32;
        seg.filesize = self.segment_size() as u32;
        seg.nsects = 2;

        let mut classname = Section::default();
        classname.set_names("__TEXT", SECT_OBJC_CLASSNAME);
        classname.addr = self.va(CLASSNAME_OFFSET) as u32;
        classname.size = classnames_size;
        classname.offset = CLASSNAME_OFFSET as u32;
        classname.flags = S_CSTRING_LITERALS;

        let mut catlist = Section::default();
        catlist.set_names("__DATA", SECT_OBJC_CATLIST);
        catlist.addr = self.va(CATLIST_OFFSET) as u32;
        catlist.size = catlist_size;
        catlist.offset = CATLIST_OFFSET as u32;

        self.store(&mut seg);
        self.store(&mut classname);
        self.store(&mut catlist);
        let mut off = MachHeader::SIZE;
        for bytes in [seg.as_bytes(), classname.as_bytes(), catlist.as_bytes()] {
            data[off..off + bytes.len()].copy_from_slice(bytes);
            off += bytes.len();
        }
    }

    /// Converts a host-order structure to the slice's byte order.
    fn store<T: ByteSwap>(&self, value: &mut T) {
        if self.big_endian != cfg!(target_endian = "big") {
            value.swap_bytes();
        }
    }

    fn write_ptr(&self, data: &mut [u8], offset: usize, value: u64) {
        let bytes = match (self.is_64, self.big_endian) {
            (true, false) => value.to_le_bytes().to_vec(),
            (true, true) => value.to_be_bytes().to_vec(),
            (false, false) => (value as u32).to_le_bytes().to_vec(),
            (false, true) => (value as u32).to_be_bytes().to_vec(),
        };
        data[offset..offset + bytes.len()].copy_from_slice(&bytes);
    }
}

/// Builds a universal binary with each member aligned to 0x1000.
///
/// Returns the file bytes and the offset of each member.
pub fn build_universal(members: &[Vec<u8>]) -> (Vec<u8>, Vec<usize>) {
    const ALIGN: usize = 0x1000;
    let cputypes: Vec<u32> = members
        .iter()
        .map(|m| {
            let cputype = [m[4], m[5], m[6], m[7]];
            // Big-endian objects start with FE ED FA CE/CF.
            if m.starts_with(&[0xFE, 0xED, 0xFA]) {
                u32::from_be_bytes(cputype)
            } else {
                u32::from_le_bytes(cputype)
            }
        })
        .collect();

    let mut data = vec![0u8; ALIGN];
    data[..4].copy_from_slice(&FAT_MAGIC.to_be_bytes());
    data[4..8].copy_from_slice(&(members.len() as u32).to_be_bytes());

    let mut offsets = Vec::new();
    for (i, member) in members.iter().enumerate() {
        let offset = data.len();
        offsets.push(offset);

        let entry = 8 + i * 20;
        data[entry..entry + 4].copy_from_slice(&cputypes[i].to_be_bytes());
        data[entry + 4..entry + 8].copy_from_slice(&0u32.to_be_bytes());
        data[entry + 8..entry + 12].copy_from_slice(&(offset as u32).to_be_bytes());
        data[entry + 12..entry + 16].copy_from_slice(&(member.len() as u32).to_be_bytes());
        data[entry + 16..entry + 20].copy_from_slice(&12u32.to_be_bytes());

        data.extend_from_slice(member);
        let padded = data.len().next_multiple_of(ALIGN);
        data.resize(padded, 0);
    }

    (data, offsets)
}

/// Returns true if every byte of `name` is an ASCII letter or digit.
pub fn is_alphanumeric(name: &[u8]) -> bool {
    name.iter().all(u8::is_ascii_alphanumeric)
}
