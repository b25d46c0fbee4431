//! Class name table patcher.
//!
//! `__objc_classname` holds class names as NUL-terminated strings packed
//! back to back. Each name is rewritten in place; terminators and padding
//! are never touched.

use crate::macho::{MachOSlice, SectionInfo};
use crate::util::{display_name, memchr_null};

use super::{EntryKind, PatchContext};

/// Patches every non-excluded name in a class name section.
///
/// `contents` are the section's bytes from the source image. Returns the
/// number of names rewritten.
pub fn patch_class_names(
    ctx: &mut PatchContext<'_>,
    slice: &MachOSlice,
    section: &SectionInfo,
    contents: &[u8],
) -> usize {
    let section_base = slice.base_offset as u64 + section.offset;
    let mut patched = 0;
    let mut pos = 0;

    while pos < contents.len() {
        let len = memchr_null(&contents[pos..]);
        if len == 0 {
            pos += 1;
            continue;
        }

        let name = &contents[pos..pos + len];
        if ctx.config.is_excluded(name) {
            ctx.stats.classes_excluded += 1;
            ctx.info(format_args!(
                "{} Skipping excluded class: {}",
                EntryKind::Class,
                display_name(name)
            ));
        } else if ctx.patch_string(EntryKind::Class, section_base + pos as u64, name) {
            ctx.stats.classes_patched += 1;
            patched += 1;
        }

        pos += len + 1;
    }

    patched
}
