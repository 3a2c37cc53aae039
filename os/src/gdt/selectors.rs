//! Segment selectors published to the rest of the kernel.
//!
//! A selector is `index << 3 | table indicator | requested privilege level`.
//! Interrupt handling, task switching and the jump to user mode all depend on
//! these exact values, so the table layout is derived from them and not the
//! other way around.

use x86_64::structures::gdt::SegmentSelector;
use x86_64::PrivilegeLevel;

pub const NULL_INDEX: u16 = 0;
pub const KERNEL_CODE_INDEX: u16 = 1;
pub const KERNEL_DATA_INDEX: u16 = 2;
pub const USER_CODE_INDEX: u16 = 3;
pub const USER_DATA_INDEX: u16 = 4;

/// Kernel code segment, `0x08`.
pub const KERNEL_CODE_SELECTOR: SegmentSelector = SegmentSelector::new(KERNEL_CODE_INDEX, PrivilegeLevel::Ring0);
/// Kernel data segment, `0x10`.
pub const KERNEL_DATA_SELECTOR: SegmentSelector = SegmentSelector::new(KERNEL_DATA_INDEX, PrivilegeLevel::Ring0);
/// User code segment, `0x1b`.
pub const USER_CODE_SELECTOR: SegmentSelector = SegmentSelector::new(USER_CODE_INDEX, PrivilegeLevel::Ring3);
/// User data segment, `0x23`.
pub const USER_DATA_SELECTOR: SegmentSelector = SegmentSelector::new(USER_DATA_INDEX, PrivilegeLevel::Ring3);

/// Bit 2 of a selector picks the LDT instead of the GDT.
pub const TABLE_INDICATOR_LDT: u16 = 1 << 2;

/// Index into the descriptor table referenced by `selector`.
pub const fn table_index(selector: SegmentSelector) -> usize {
    (selector.0 >> 3) as usize
}

/// Whether `selector` refers to the GDT (as opposed to an LDT).
pub const fn is_gdt_selector(selector: SegmentSelector) -> bool {
    selector.0 & TABLE_INDICATOR_LDT == 0
}
