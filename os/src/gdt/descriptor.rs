//! Encoding and decoding of 8-byte segment descriptors.
//!
//! Layout of a descriptor, least significant bit first:
//!
//! ```text
//!  0..16  limit bits 0..16
//! 16..32  base bits 0..16
//! 32..40  base bits 16..24
//! 40..48  access byte
//! 48..52  limit bits 16..20
//! 52..56  granularity flags
//! 56..64  base bits 24..32
//! ```
//!
//! The fields are assembled with shifts and masks on a `u64`. Nothing here
//! depends on how the compiler lays out structs.

use core::fmt;

use x86_64::PrivilegeLevel;

use super::error::{GdtError, GdtResult};
use super::flags::{AccessFlags, GranularityFlags};

/// Size of one descriptor in bytes.
pub const DESCRIPTOR_SIZE: usize = 8;

/// Largest value the 20-bit limit field can hold.
pub const MAX_LIMIT: u32 = 0xF_FFFF;

/// A single segment descriptor, exactly as the CPU reads it from memory.
#[repr(transparent)]
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor(u64);

impl Descriptor {
    /// The mandatory all-zero descriptor at index 0.
    pub const NULL: Descriptor = Descriptor(0);

    /// Encodes a descriptor.
    ///
    /// # Panics
    ///
    /// Panics if `limit` does not fit in 20 bits. Use [`Descriptor::try_new`] when
    /// the limit comes from somewhere that is not a constant.
    pub const fn new(base: u32, limit: u32, access: AccessFlags, granularity: GranularityFlags) -> Self {
        assert!(limit <= MAX_LIMIT, "segment limit does not fit in 20 bits");

        let mut raw = (limit & 0xFFFF) as u64;
        raw |= ((base & 0xFFFF) as u64) << 16;
        raw |= (((base >> 16) & 0xFF) as u64) << 32;
        raw |= (access.bits() as u64) << 40;
        raw |= (((limit >> 16) & 0xF) as u64) << 48;
        raw |= ((granularity.bits() & GranularityFlags::FLAGS_MASK) as u64) << 48;
        raw |= (((base >> 24) & 0xFF) as u64) << 56;
        Descriptor(raw)
    }

    /// Encodes a descriptor, rejecting a limit wider than 20 bits.
    pub const fn try_new(
        base: u32,
        limit: u32,
        access: AccessFlags,
        granularity: GranularityFlags,
    ) -> GdtResult<Self> {
        if limit > MAX_LIMIT {
            return Err(GdtError::LimitTooLarge { limit });
        }
        Ok(Self::new(base, limit, access, granularity))
    }

    /// Reinterprets a raw 64-bit value as a descriptor.
    pub const fn from_u64(raw: u64) -> Self {
        Descriptor(raw)
    }

    /// The raw 64-bit value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The descriptor as it appears in memory.
    pub const fn to_bytes(self) -> [u8; DESCRIPTOR_SIZE] {
        self.0.to_le_bytes()
    }

    /// Reads a descriptor from its in-memory representation.
    pub const fn from_bytes(bytes: [u8; DESCRIPTOR_SIZE]) -> Self {
        Descriptor(u64::from_le_bytes(bytes))
    }

    /// Limit bits 0..16.
    pub const fn limit_low(self) -> u16 {
        self.0 as u16
    }

    /// Base bits 0..16.
    pub const fn base_low(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Base bits 16..24.
    pub const fn base_middle(self) -> u8 {
        (self.0 >> 32) as u8
    }

    /// The raw access byte.
    pub const fn access_byte(self) -> u8 {
        (self.0 >> 40) as u8
    }

    /// The whole granularity byte: flags in the upper nibble, limit bits 16..20
    /// in the lower one.
    pub const fn granularity_byte(self) -> u8 {
        (self.0 >> 48) as u8
    }

    /// Base bits 24..32.
    pub const fn base_high(self) -> u8 {
        (self.0 >> 56) as u8
    }

    /// The 32-bit base address, reassembled from its three fields.
    pub const fn base(self) -> u32 {
        self.base_low() as u32 | (self.base_middle() as u32) << 16 | (self.base_high() as u32) << 24
    }

    /// The raw 20-bit limit, before granularity scaling.
    pub const fn limit(self) -> u32 {
        self.limit_low() as u32 | ((self.granularity_byte() & 0x0F) as u32) << 16
    }

    /// The access byte as flags.
    pub const fn access(self) -> AccessFlags {
        AccessFlags::from_bits_retain(self.access_byte())
    }

    /// The flag nibble of the granularity byte.
    pub const fn granularity(self) -> GranularityFlags {
        GranularityFlags::from_bits_retain(self.granularity_byte() & GranularityFlags::FLAGS_MASK)
    }

    /// Offset of the last addressable byte, with 4 KiB scaling applied.
    ///
    /// A flat segment (`limit = 0xFFFFF` with [`GranularityFlags::GRANULARITY`])
    /// yields `0xFFFF_FFFF`, i.e. the whole 4 GiB address space.
    pub const fn effective_limit(self) -> u64 {
        let limit = self.limit() as u64;
        if self.granularity().contains(GranularityFlags::GRANULARITY) {
            (limit << 12) | 0xFFF
        } else {
            limit
        }
    }

    /// All 64 bits clear.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// The present bit is set.
    pub const fn is_present(self) -> bool {
        self.access().contains(AccessFlags::PRESENT)
    }

    /// Present code segment.
    pub const fn is_code(self) -> bool {
        self.access().contains(AccessFlags::PRESENT.union(AccessFlags::SYSTEM).union(AccessFlags::EXECUTABLE))
    }

    /// Present, writable data segment.
    pub const fn is_data(self) -> bool {
        let access = self.access();
        access.contains(AccessFlags::PRESENT.union(AccessFlags::SYSTEM).union(AccessFlags::READ_WRITE))
            && !access.contains(AccessFlags::EXECUTABLE)
    }

    /// Descriptor privilege level.
    pub fn privilege_level(self) -> PrivilegeLevel {
        self.access().privilege_level()
    }
}

impl From<Descriptor> for u64 {
    fn from(value: Descriptor) -> Self {
        value.0
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("base", &format_args!("{:#x}", self.base()))
            .field("limit", &format_args!("{:#x}", self.limit()))
            .field("access", &self.access())
            .field("granularity", &self.granularity())
            .finish()
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
