//! Access and granularity flags of a segment descriptor.

use bitflags::bitflags;
use x86_64::PrivilegeLevel;

bitflags! {
    /// Bits of the access byte (bits 40..48 of a descriptor).
    #[repr(transparent)]
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u8 {
        /// The segment is present in memory. Loading a selector that points at a
        /// descriptor without this bit raises #NP.
        const PRESENT = 0x80;
        /// Descriptor privilege level 0 (kernel).
        const RING0 = 0x00;
        /// Descriptor privilege level 3 (user).
        const RING3 = 0x60;
        /// Descriptor type bit. Set for code and data segments, clear for system
        /// descriptors such as a TSS or an LDT.
        const SYSTEM = 0x10;
        /// Code segment when set, data segment otherwise.
        const EXECUTABLE = 0x08;
        /// Conforming for code segments, expand-down for data segments.
        const CONFORMING = 0x04;
        /// Readable for code segments, writable for data segments.
        const READ_WRITE = 0x02;
        /// Set by the CPU the first time the segment is loaded.
        const ACCESSED = 0x01;
    }
}

impl AccessFlags {
    /// Mask of the two descriptor privilege level bits.
    pub const DPL_MASK: u8 = 0x60;

    /// Returns the descriptor privilege level encoded in these flags.
    pub fn privilege_level(self) -> PrivilegeLevel {
        PrivilegeLevel::from_u16(((self.bits() & Self::DPL_MASK) >> 5) as u16)
    }
}

bitflags! {
    /// Flags stored in the upper nibble of the granularity byte (bits 52..56).
    ///
    /// The lower nibble of that byte belongs to the segment limit and is never
    /// represented here.
    #[repr(transparent)]
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GranularityFlags: u8 {
        /// The limit counts 4 KiB pages instead of bytes.
        const GRANULARITY = 0x80;
        /// 32-bit default operand size (the D/B bit).
        const SIZE_32 = 0x40;
        /// 64-bit code segment (the L bit). Must not be combined with `SIZE_32`
        /// on a code segment.
        const LONG_MODE = 0x20;
    }
}

impl GranularityFlags {
    /// Bits of the granularity byte that hold flags rather than limit bits.
    pub const FLAGS_MASK: u8 = 0xF0;
}
