//! Per-slice section dispatch.

use crate::macho::{MachOSlice, SECT_OBJC_CATLIST, SECT_OBJC_CLASSNAME};

use super::{patch_category_list, patch_class_names, PatchContext};

/// Patches the Objective-C sections of one architecture slice.
///
/// `slice_data` holds the bytes `slice` was parsed from. Sections are visited in load command order. A section whose name or
/// contents cannot be read is reported and skipped; the rest of the slice
/// is still processed. Sections other than the class name table and the
/// category list are ignored.
pub fn patch_slice(ctx: &mut PatchContext<'_>, slice: &MachOSlice, slice_data: &[u8]) {
    ctx.info(format_args!(
        "--- Patching architecture: {} (slice offset: {}, {} bytes) ---",
        slice.arch_name(),
        slice.base_offset,
        slice.size
    ));

    for section in &slice.sections {
        let name = match section.name() {
            Ok(name) => name,
            Err(e) => {
                ctx.warn(format_args!("Skipping section: {}", e));
                ctx.stats.sections_skipped += 1;
                continue;
            }
        };

        if name != SECT_OBJC_CLASSNAME && name != SECT_OBJC_CATLIST {
            continue;
        }

        let contents = match slice.section_data(slice_data, section) {
            Ok(contents) => contents,
            Err(e) => {
                ctx.warn(format_args!("Skipping section: {}", e));
                ctx.stats.sections_skipped += 1;
                continue;
            }
        };

        if name == SECT_OBJC_CLASSNAME {
            patch_class_names(ctx, slice, section, contents);
        } else {
            patch_category_list(ctx, slice, section, contents);
        }
    }

    ctx.stats.slices_processed += 1;
}
