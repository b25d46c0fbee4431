//! Mach-O constants used by the patcher.

// =============================================================================
// Magic Numbers
// =============================================================================

/// 64-bit Mach-O magic (little-endian)
pub const MH_MAGIC_64: u32 = 0xFEEDFACF;

/// 64-bit Mach-O magic (big-endian, needs byte swap)
pub const MH_CIGAM_64: u32 = 0xCFFAEDFE;

/// 32-bit Mach-O magic (little-endian)
pub const MH_MAGIC: u32 = 0xFEEDFACE;

/// 32-bit Mach-O magic (big-endian)
pub const MH_CIGAM: u32 = 0xCEFAEDFE;

/// Universal binary magic (stored big-endian)
pub const FAT_MAGIC: u32 = 0xCAFEBABE;

/// Universal binary magic with 64-bit offsets (stored big-endian)
pub const FAT_MAGIC_64: u32 = 0xCAFEBABF;

/// Java class files share `FAT_MAGIC`; real universal binaries never carry
/// this many architectures.
pub const FAT_MAX_ARCHS: u32 = 43;

// =============================================================================
// CPU Types
// =============================================================================

/// 64-bit ABI flag
pub const CPU_ARCH_ABI64: u32 = 0x0100_0000;
/// ILP32 on 64-bit hardware flag
pub const CPU_ARCH_ABI64_32: u32 = 0x0200_0000;

/// ARM
pub const CPU_TYPE_ARM: u32 = 12;
/// ARM64
pub const CPU_TYPE_ARM64: u32 = CPU_TYPE_ARM | CPU_ARCH_ABI64;
/// ARM64_32 (watchOS)
pub const CPU_TYPE_ARM64_32: u32 = CPU_TYPE_ARM | CPU_ARCH_ABI64_32;
/// x86
pub const CPU_TYPE_X86: u32 = 7;
/// x86_64
pub const CPU_TYPE_X86_64: u32 = CPU_TYPE_X86 | CPU_ARCH_ABI64;
/// PowerPC
pub const CPU_TYPE_POWERPC: u32 = 18;
/// PowerPC 64
pub const CPU_TYPE_POWERPC64: u32 = CPU_TYPE_POWERPC | CPU_ARCH_ABI64;

/// Mask for the subtype bits (upper byte holds capability flags)
pub const CPU_SUBTYPE_MASK: u32 = 0x00FF_FFFF;
/// ARM64e (pointer authentication)
pub const CPU_SUBTYPE_ARM64E: u32 = 2;

/// Returns a printable architecture name for a CPU type/subtype pair.
pub fn arch_name(cputype: u32, cpusubtype: u32) -> &'static str {
    match cputype {
        CPU_TYPE_ARM64 => {
            if cpusubtype & CPU_SUBTYPE_MASK == CPU_SUBTYPE_ARM64E {
                "arm64e"
            } else {
                "arm64"
            }
        }
        CPU_TYPE_ARM64_32 => "arm64_32",
        CPU_TYPE_X86_64 => "x86_64",
        CPU_TYPE_ARM => "arm",
        CPU_TYPE_X86 => "i386",
        CPU_TYPE_POWERPC => "ppc",
        CPU_TYPE_POWERPC64 => "ppc64",
        _ => "unknown",
    }
}

// =============================================================================
// Load Commands
// =============================================================================

/// 32-bit segment
pub const LC_SEGMENT: u32 = 0x1;
/// 64-bit segment
pub const LC_SEGMENT_64: u32 = 0x19;

// =============================================================================
// Section Types
// =============================================================================

/// Section type mask
pub const SECTION_TYPE: u32 = 0x0000_00FF;
/// Zero fill on demand section
pub const S_ZEROFILL: u32 = 0x1;
/// Section with only literal C strings
pub const S_CSTRING_LITERALS: u32 = 0x2;
/// Zero fill on demand section (> 4GB)
pub const S_GB_ZEROFILL: u32 = 0xC;
/// Thread local zerofill section
pub const S_THREAD_LOCAL_ZEROFILL: u32 = 0x12;

// =============================================================================
// Objective-C Sections
// =============================================================================

/// Packed NUL-terminated class name strings
pub const SECT_OBJC_CLASSNAME: &str = "__objc_classname";
/// Array of pointers to category records
pub const SECT_OBJC_CATLIST: &str = "__objc_catlist";
