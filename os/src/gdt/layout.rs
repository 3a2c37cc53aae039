//! The flat segments every kernel table starts with.

use super::descriptor::{Descriptor, MAX_LIMIT};
use super::error::GdtResult;
use super::flags::{AccessFlags, GranularityFlags};
use super::selectors::{KERNEL_CODE_INDEX, KERNEL_DATA_INDEX, USER_CODE_INDEX, USER_DATA_INDEX};
use super::table::Gdt;

/// Which operating mode the flat descriptors are built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    /// 32-bit protected mode: every segment is a 4 GiB, 32-bit segment.
    Protected,
    /// 64-bit long mode: code segments carry the L bit, data segments keep the
    /// 32-bit flags (the CPU ignores base and limit for both).
    Long,
}

impl SegmentMode {
    const fn code_granularity(self) -> GranularityFlags {
        match self {
            SegmentMode::Protected => GranularityFlags::GRANULARITY.union(GranularityFlags::SIZE_32),
            SegmentMode::Long => GranularityFlags::GRANULARITY.union(GranularityFlags::LONG_MODE),
        }
    }

    const fn data_granularity(self) -> GranularityFlags {
        GranularityFlags::GRANULARITY.union(GranularityFlags::SIZE_32)
    }
}

const CODE: AccessFlags = AccessFlags::PRESENT
    .union(AccessFlags::SYSTEM)
    .union(AccessFlags::EXECUTABLE)
    .union(AccessFlags::READ_WRITE);

const DATA: AccessFlags = AccessFlags::PRESENT.union(AccessFlags::SYSTEM).union(AccessFlags::READ_WRITE);

impl Descriptor {
    /// Flat ring 0 code segment (access `0x9a`).
    pub const fn kernel_code(mode: SegmentMode) -> Self {
        Self::new(0, MAX_LIMIT, CODE.union(AccessFlags::RING0), mode.code_granularity())
    }

    /// Flat ring 0 data segment (access `0x92`).
    pub const fn kernel_data(mode: SegmentMode) -> Self {
        Self::new(0, MAX_LIMIT, DATA.union(AccessFlags::RING0), mode.data_granularity())
    }

    /// Flat ring 3 code segment (access `0xfa`).
    pub const fn user_code(mode: SegmentMode) -> Self {
        Self::new(0, MAX_LIMIT, CODE.union(AccessFlags::RING3), mode.code_granularity())
    }

    /// Flat ring 3 data segment (access `0xf2`).
    pub const fn user_data(mode: SegmentMode) -> Self {
        Self::new(0, MAX_LIMIT, DATA.union(AccessFlags::RING3), mode.data_granularity())
    }
}

/// Builds the kernel's table: null, kernel code, kernel data, user code and
/// user data, each at the index named by its published selector.
pub fn kernel_table<const N: usize>(mode: SegmentMode) -> GdtResult<Gdt<N>> {
    let mut gdt = Gdt::new();
    gdt.set(KERNEL_CODE_INDEX as usize, Descriptor::kernel_code(mode))?;
    gdt.set(KERNEL_DATA_INDEX as usize, Descriptor::kernel_data(mode))?;
    gdt.set(USER_CODE_INDEX as usize, Descriptor::user_code(mode))?;
    gdt.set(USER_DATA_INDEX as usize, Descriptor::user_data(mode))?;
    Ok(gdt)
}
