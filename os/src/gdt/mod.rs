//! Global Descriptor Table (GDT) subsystem
//!
//! The GDT contains, in this order:
//! - the null descriptor
//! - kernel code segment (ring 0)
//! - kernel data segment (ring 0)
//! - user code segment (ring 3)
//! - user data segment (ring 3)
//!
//! Remaining capacity is left for a TSS descriptor.
//!
//! [`descriptor`] encodes single entries, [`table`] owns the array and the load
//! sequence, and [`loader`] is the only place that executes privileged
//! instructions.

pub mod descriptor;
pub mod error;
pub mod flags;
pub mod layout;
pub mod loader;
pub mod selectors;
pub mod table;
pub mod verify;

#[cfg(test)]
mod tests;

pub use descriptor::{Descriptor, DESCRIPTOR_SIZE, MAX_LIMIT};
pub use error::{GdtError, GdtResult};
pub use flags::{AccessFlags, GranularityFlags};
pub use layout::{kernel_table, SegmentMode};
#[cfg(target_arch = "x86_64")]
pub use loader::Cpu;
pub use loader::{ActiveSegments, SegmentLoader};
pub use selectors::{KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR, USER_CODE_SELECTOR, USER_DATA_SELECTOR};
pub use table::{Gdt, TableState};

/// Loads `table` with the kernel selectors and checks that the CPU picked it up.
///
/// Must run during early boot, before interrupts are enabled. Application
/// processors call it again with the same table.
pub fn init<L: SegmentLoader, const N: usize>(table: &'static Gdt<N>, loader: &mut L) -> GdtResult<ActiveSegments> {
    log::info!("loading GDT with {} of {} entries", table.len(), table.capacity());
    log::debug!("{table}");

    let active = table.load(loader, KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR)?;
    verify::verify(loader, &active)?;
    Ok(active)
}
