//! The privileged half of the GDT: `lgdt` and segment register reloads.

use x86_64::structures::gdt::SegmentSelector;
use x86_64::structures::DescriptorTablePointer;
use x86_64::VirtAddr;

/// Segment state as seen by the CPU after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSegments {
    /// Selector in CS
    pub code: SegmentSelector,
    /// Selector in DS (and SS, ES, FS, GS after a load)
    pub data: SegmentSelector,
    /// Base address held in GDTR
    pub table_base: VirtAddr,
    /// Limit held in GDTR
    pub table_limit: u16,
}

/// Issues the instructions that install a descriptor table.
///
/// The kernel uses [`Cpu`]; anything else (tests, an emulator) can stand in
/// for it since the table logic never touches the hardware directly.
pub trait SegmentLoader {
    /// Points GDTR at the table described by `pointer`.
    ///
    /// # Safety
    ///
    /// `pointer` must describe a valid table that stays where it is for as long
    /// as it is loaded.
    unsafe fn load_table(&mut self, pointer: &DescriptorTablePointer);

    /// Reloads CS with `code` and SS, DS, ES, FS and GS with `data`.
    ///
    /// # Safety
    ///
    /// Both selectors must reference valid descriptors of the loaded table. The
    /// CPU only reads descriptors when a selector is loaded, so without this
    /// step it keeps using the segments of the previous table.
    unsafe fn reload_segments(&mut self, code: SegmentSelector, data: SegmentSelector);

    /// Reads back CS, DS and GDTR.
    fn active(&self) -> ActiveSegments;
}

/// The current processor.
#[cfg(target_arch = "x86_64")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Cpu;

#[cfg(target_arch = "x86_64")]
impl SegmentLoader for Cpu {
    unsafe fn load_table(&mut self, pointer: &DescriptorTablePointer) {
        x86_64::instructions::tables::lgdt(pointer);
    }

    unsafe fn reload_segments(&mut self, code: SegmentSelector, data: SegmentSelector) {
        use x86_64::instructions::segmentation::{Segment, CS, DS, ES, FS, GS, SS};

        // CS cannot be written with `mov`; this goes through a far return.
        CS::set_reg(code);
        SS::set_reg(data);
        DS::set_reg(data);
        ES::set_reg(data);
        FS::set_reg(data);
        GS::set_reg(data);
    }

    fn active(&self) -> ActiveSegments {
        use x86_64::instructions::segmentation::{Segment, CS, DS};
        use x86_64::instructions::tables::sgdt;

        let gdtr = sgdt();
        ActiveSegments {
            code: CS::get_reg(),
            data: DS::get_reg(),
            table_base: gdtr.base,
            table_limit: gdtr.limit,
        }
    }
}
