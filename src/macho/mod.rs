//! Mach-O file format handling.
//!
//! This module provides the types needed to locate Objective-C metadata in
//! thin and universal Mach-O files: container detection, header and load
//! command parsing for 32-bit and 64-bit objects, and virtual address to
//! file offset translation.

mod constants;
mod context;
mod fat;
mod structs;

pub use constants::*;
pub use context::*;
pub use fat::*;
pub use structs::*;
