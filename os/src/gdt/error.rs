//! Error types for descriptor table construction and loading.
//!
//! Every variant describes a problem that is caught before `lgdt` runs. Once
//! the table has been handed to the CPU, a bad entry shows up as a processor
//! fault and is handled (or not) by whatever exception handling exists.

use thiserror::Error;

/// Descriptor table errors with enough context to log something useful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GdtError {
    /// The segment limit does not fit into the 20-bit limit field.
    #[error("segment limit {limit:#x} does not fit in 20 bits")]
    LimitTooLarge {
        /// The rejected limit
        limit: u32,
    },

    /// The table does not start with an all-zero descriptor.
    #[error("descriptor table must start with the null descriptor")]
    MissingNullDescriptor,

    /// Index 0 may only ever hold the null descriptor.
    #[error("index 0 is reserved for the null descriptor")]
    NullSlotReserved,

    /// The index lies outside the table's fixed capacity.
    #[error("index {index} is outside the table capacity of {capacity}")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of slots in the table
        capacity: usize,
    },

    /// Every slot of the table is already in use.
    #[error("descriptor table is full ({capacity} entries)")]
    TableFull {
        /// Number of slots in the table
        capacity: usize,
    },

    /// Nothing but the null descriptor has been written yet.
    #[error("descriptor table holds no segments besides the null descriptor")]
    NotPopulated,

    /// The table base is not aligned to a descriptor boundary.
    #[error("descriptor table base {base:#x} is not aligned to 8 bytes")]
    Misaligned {
        /// Linear address of entry 0
        base: u64,
    },

    /// The selector indexes past the populated part of the table.
    #[error("selector {selector:#x} does not reference a populated entry")]
    SelectorOutOfBounds {
        /// The offending selector
        selector: u16,
    },

    /// The selector meant for CS does not reference a present code segment.
    #[error("selector {selector:#x} does not reference a present code segment")]
    NotCodeSegment {
        /// The offending selector
        selector: u16,
    },

    /// The selector meant for the data registers does not reference a present,
    /// writable data segment.
    #[error("selector {selector:#x} does not reference a present writable data segment")]
    NotDataSegment {
        /// The offending selector
        selector: u16,
    },

    /// The selector requests ring 3 but segment registers are reloaded at ring 0.
    #[error("selector {selector:#x} is not a ring 0 selector")]
    NotKernelSegment {
        /// The offending selector
        selector: u16,
    },

    /// A segment register does not hold the selector it was loaded with.
    #[error("{register} holds {found:#x}, expected {expected:#x}")]
    SelectorMismatch {
        /// Name of the register that was read back
        register: &'static str,
        /// Selector that was loaded
        expected: u16,
        /// Selector found in the register
        found: u16,
    },

    /// GDTR does not describe the table that was loaded.
    #[error("GDTR is {found_base:#x}/{found_limit:#x}, expected {expected_base:#x}/{expected_limit:#x}")]
    TablePointerMismatch {
        /// Base of the loaded table
        expected_base: u64,
        /// Limit of the loaded table
        expected_limit: u16,
        /// Base read back from GDTR
        found_base: u64,
        /// Limit read back from GDTR
        found_limit: u16,
    },
}

/// Convenience type alias for Results with GdtError
pub type GdtResult<T> = Result<T, GdtError>;
