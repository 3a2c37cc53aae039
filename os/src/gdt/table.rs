//! The descriptor table itself and its load sequence.

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use x86_64::structures::gdt::SegmentSelector;
use x86_64::structures::DescriptorTablePointer;
use x86_64::{PrivilegeLevel, VirtAddr};

use super::descriptor::{Descriptor, DESCRIPTOR_SIZE};
use super::error::{GdtError, GdtResult};
use super::loader::{ActiveSegments, SegmentLoader};
use super::selectors::{is_gdt_selector, table_index, NULL_INDEX};
use crate::config::GDT_CAPACITY;

/// Where a table is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// Only the null descriptor is present.
    Uninitialized,
    /// Segments have been written but the table is not (or no longer) what the
    /// CPU has loaded.
    Populated,
    /// The table has been handed to the CPU and has not been modified since.
    Loaded,
}

/// A Global Descriptor Table with room for `N` descriptors.
///
/// Entry 0 is the null descriptor and can never be overwritten. The table
/// pointer only covers entries up to the highest one written, so unused
/// capacity is invisible to the CPU.
#[repr(C, align(8))]
pub struct Gdt<const N: usize = GDT_CAPACITY> {
    entries: [Descriptor; N],
    len: usize,
    loaded: AtomicBool,
}

impl<const N: usize> Gdt<N> {
    // GDTR holds a 16-bit limit, so a table tops out at 8192 entries.
    const VALID_CAPACITY: () = assert!(N >= 1 && N <= 8192, "GDT capacity must be between 1 and 8192");

    /// Creates a table holding only the null descriptor.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_CAPACITY;
        Gdt {
            entries: [Descriptor::NULL; N],
            len: 1,
            loaded: AtomicBool::new(false),
        }
    }

    /// Builds a table from a complete list of entries, null descriptor included.
    pub fn from_entries(entries: &[Descriptor]) -> GdtResult<Self> {
        match entries.first() {
            Some(first) if first.is_null() => {}
            _ => return Err(GdtError::MissingNullDescriptor),
        }
        if entries.len() > N {
            return Err(GdtError::TableFull { capacity: N });
        }

        let mut gdt = Self::new();
        gdt.entries[..entries.len()].copy_from_slice(entries);
        gdt.len = entries.len();
        Ok(gdt)
    }

    /// Appends `descriptor` after the last written entry and returns its index.
    pub fn push(&mut self, descriptor: Descriptor) -> GdtResult<u16> {
        if self.len >= N {
            return Err(GdtError::TableFull { capacity: N });
        }
        let index = self.len;
        self.set(index, descriptor)?;
        Ok(index as u16)
    }

    /// Writes `descriptor` at `index`.
    ///
    /// Writing past the current end grows the table; skipped slots stay null.
    pub fn set(&mut self, index: usize, descriptor: Descriptor) -> GdtResult<()> {
        if index == 0 {
            return Err(GdtError::NullSlotReserved);
        }
        if index >= N {
            return Err(GdtError::IndexOutOfRange { index, capacity: N });
        }

        self.entries[index] = descriptor;
        self.len = self.len.max(index + 1);
        *self.loaded.get_mut() = false;
        log::debug!("gdt[{index}] = {descriptor}");
        Ok(())
    }

    /// The descriptor at `index`, if it lies within the written entries.
    pub fn get(&self, index: usize) -> Option<Descriptor> {
        self.entries().get(index).copied()
    }

    /// The entries covered by the table pointer.
    pub fn entries(&self) -> &[Descriptor] {
        &self.entries[..self.len]
    }

    /// Number of entries covered by the table pointer, null descriptor included.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: the null descriptor is part of every table.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots the table can ever hold.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Current lifecycle state, see [`TableState`].
    pub fn state(&self) -> TableState {
        if self.loaded.load(Ordering::Acquire) {
            TableState::Loaded
        } else if self.len > 1 {
            TableState::Populated
        } else {
            TableState::Uninitialized
        }
    }

    /// The value to hand to `lgdt`: size of the written entries minus one, and
    /// the address of entry 0.
    pub fn pointer(&self) -> DescriptorTablePointer {
        DescriptorTablePointer {
            limit: (self.len * DESCRIPTOR_SIZE - 1) as u16,
            base: VirtAddr::from_ptr(self.entries.as_ptr()),
        }
    }

    /// Loads this table and switches CS to `code` and SS, DS, ES, FS and GS to
    /// `data`.
    ///
    /// Everything that can be checked in software is checked before the CPU is
    /// touched. Calling this again with an unchanged table (for instance on
    /// another core) leaves the selectors exactly as they were.
    pub fn load<L: SegmentLoader>(
        &'static self,
        loader: &mut L,
        code: SegmentSelector,
        data: SegmentSelector,
    ) -> GdtResult<ActiveSegments> {
        unsafe { self.load_unsafe(loader, code, data) }
    }

    /// Like [`Gdt::load`], without requiring a `'static` table.
    ///
    /// # Safety
    ///
    /// The table must not be moved, dropped or modified while the CPU still uses
    /// it, i.e. until another table has been loaded.
    pub unsafe fn load_unsafe<L: SegmentLoader>(
        &self,
        loader: &mut L,
        code: SegmentSelector,
        data: SegmentSelector,
    ) -> GdtResult<ActiveSegments> {
        if self.len <= 1 {
            return Err(GdtError::NotPopulated);
        }

        let pointer = self.pointer();
        let (table_base, table_limit) = (pointer.base, pointer.limit);
        if !table_base.is_aligned(DESCRIPTOR_SIZE as u64) {
            return Err(GdtError::Misaligned { base: table_base.as_u64() });
        }

        let code_descriptor = self.lookup(code)?;
        if !code_descriptor.is_code() || code_descriptor.privilege_level() != code.rpl() {
            return Err(GdtError::NotCodeSegment { selector: code.0 });
        }
        let data_descriptor = self.lookup(data)?;
        if !data_descriptor.is_data() || data_descriptor.privilege_level() != data.rpl() {
            return Err(GdtError::NotDataSegment { selector: data.0 });
        }
        // The load runs at ring 0; the CPU refuses ring 3 segments for CS and SS here.
        for selector in [code, data] {
            if selector.rpl() != PrivilegeLevel::Ring0 {
                return Err(GdtError::NotKernelSegment { selector: selector.0 });
            }
        }

        loader.load_table(&pointer);
        loader.reload_segments(code, data);
        self.loaded.store(true, Ordering::Release);

        log::info!(
            "GDT loaded at {:#x} (limit {:#x}), CS={:#x} DS={:#x}",
            table_base.as_u64(),
            table_limit,
            code.0,
            data.0
        );

        Ok(ActiveSegments { code, data, table_base, table_limit })
    }

    fn lookup(&self, selector: SegmentSelector) -> GdtResult<Descriptor> {
        let index = table_index(selector);
        if !is_gdt_selector(selector) || index == NULL_INDEX as usize {
            return Err(GdtError::SelectorOutOfBounds { selector: selector.0 });
        }
        self.get(index).ok_or(GdtError::SelectorOutOfBounds { selector: selector.0 })
    }
}

impl<const N: usize> Default for Gdt<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Display for Gdt<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Gdt ({}/{} entries, {:?}) [", self.len, N, self.state())?;
        for (index, entry) in self.entries().iter().enumerate() {
            writeln!(f, "  {index}: {entry}")?;
        }
        write!(f, "]")
    }
}

impl<const N: usize> fmt::Debug for Gdt<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gdt")
            .field("entries", &self.entries())
            .field("capacity", &N)
            .field("state", &self.state())
            .finish()
    }
}
