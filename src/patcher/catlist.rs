//! Category list patcher.
//!
//! `__objc_catlist` is an array of pointers to category records, stored in
//! the slice's byte order. The first pointer-sized field of a record points
//! at the category's name. Both hops
//! are read from the source image so that names already patched earlier in
//! the run can never corrupt the chain.

use tracing::debug;

use crate::image::SourceImage;
use crate::macho::{MachOSlice, SectionInfo};
use crate::util::read_ptr_at;

use super::{EntryKind, PatchContext};

/// A category name located through the pointer chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryName<'a> {
    /// Absolute file offset of the name
    pub offset: u64,
    /// The original name bytes, without terminator
    pub name: &'a [u8],
}

/// Follows `category_va` to its name string using only the source image.
///
/// Returns `None` if either address has no containing segment or points
/// outside the file.
pub fn resolve_category_name<'a>(
    source: &SourceImage<'a>,
    slice: &MachOSlice,
    category_va: u64,
) -> Option<CategoryName<'a>> {
    let base = slice.base_offset as u64;

    let category_offset = slice.addr_to_offset(category_va)?;
    let name_va = source.read_ptr(
        base.checked_add(category_offset)?,
        slice.pointer_size(),
        slice.big_endian,
    )?;

    let name_offset = base.checked_add(slice.addr_to_offset(name_va)?)?;
    let name = source.read_cstr(name_offset)?;

    Some(CategoryName {
        offset: name_offset,
        name,
    })
}

/// Patches the name of every category listed in a category list section.
///
/// `contents` are the section's bytes from the source image. Trailing bytes
/// that do not fill a whole pointer are ignored. Category names are not
/// checked against the exclusion set. Returns the number of names rewritten.
pub fn patch_category_list(
    ctx: &mut PatchContext<'_>,
    slice: &MachOSlice,
    section: &SectionInfo,
    contents: &[u8],
) -> usize {
    let ptr_size = slice.pointer_size();
    let source = ctx.source;
    let mut patched = 0;

    for (index, slot) in contents.chunks_exact(ptr_size).enumerate() {
        let Some(category_va) = read_ptr_at(slot, 0, ptr_size, slice.big_endian) else {
            continue;
        };

        let Some(category) = resolve_category_name(&source, slice, category_va) else {
            debug!(
                "{}[{}]: category {:#x} does not resolve to file contents",
                section.full_name(),
                index,
                category_va
            );
            ctx.stats.categories_unresolved += 1;
            continue;
        };

        if category.name.is_empty() {
            continue;
        }

        if ctx.patch_string(EntryKind::Category, category.offset, category.name) {
            ctx.stats.categories_patched += 1;
            patched += 1;
        }
    }

    patched
}
