//! Compile-time kernel configuration.

use log::LevelFilter;

use crate::gdt::SegmentMode;

/// Number of 8-byte slots reserved for the kernel's GDT.
///
/// Five are taken by the flat segments; the rest leave room for a long-mode
/// TSS descriptor (two slots) and one spare entry.
pub const GDT_CAPACITY: usize = 8;

/// Flavour of the flat code/data descriptors installed at boot.
pub const SEGMENT_MODE: SegmentMode = SegmentMode::Long;

/// Most verbose level the kernel logger lets through.
pub const LOG_LEVEL: LevelFilter = if cfg!(debug_assertions) {
    LevelFilter::Debug
} else {
    LevelFilter::Info
};
