//! Table-level tests, run on the host against a recording loader.

use x86_64::structures::gdt::SegmentSelector;
use x86_64::structures::DescriptorTablePointer;
use x86_64::{PrivilegeLevel, VirtAddr};

use super::*;

/// Stands in for the CPU: remembers what was loaded and reports it back.
#[derive(Default)]
struct RecordingLoader {
    gdtr: Option<(VirtAddr, u16)>,
    code: Option<SegmentSelector>,
    data: Option<SegmentSelector>,
    table_loads: usize,
    segment_reloads: usize,
}

impl SegmentLoader for RecordingLoader {
    unsafe fn load_table(&mut self, pointer: &DescriptorTablePointer) {
        self.gdtr = Some((pointer.base, pointer.limit));
        self.table_loads += 1;
    }

    unsafe fn reload_segments(&mut self, code: SegmentSelector, data: SegmentSelector) {
        self.code = Some(code);
        self.data = Some(data);
        self.segment_reloads += 1;
    }

    fn active(&self) -> ActiveSegments {
        let (table_base, table_limit) = self.gdtr.unwrap_or((VirtAddr::zero(), 0));
        ActiveSegments {
            code: self.code.unwrap_or(SegmentSelector(0)),
            data: self.data.unwrap_or(SegmentSelector(0)),
            table_base,
            table_limit,
        }
    }
}

fn leak<const N: usize>(gdt: Gdt<N>) -> &'static Gdt<N> {
    Box::leak(Box::new(gdt))
}

fn populated() -> Gdt {
    kernel_table(SegmentMode::Long).unwrap()
}

#[test]
fn new_table_holds_only_the_null_descriptor() {
    let gdt: Gdt = Gdt::new();
    assert_eq!(gdt.len(), 1);
    assert_eq!(gdt.state(), TableState::Uninitialized);
    assert_eq!(gdt.entries(), &[Descriptor::NULL]);
    assert_eq!(gdt.capacity(), crate::config::GDT_CAPACITY);
}

#[test]
fn null_descriptor_survives_population() {
    let mut gdt = populated();
    gdt.push(Descriptor::user_data(SegmentMode::Long)).unwrap();

    assert_eq!(gdt.entries()[0].to_bytes(), [0; DESCRIPTOR_SIZE]);
    assert_eq!(
        gdt.set(0, Descriptor::kernel_code(SegmentMode::Long)),
        Err(GdtError::NullSlotReserved)
    );
    assert!(gdt.get(0).unwrap().is_null());
}

#[test]
fn pointer_limit_tracks_entry_count() {
    let mut gdt: Gdt<8> = Gdt::new();
    assert_eq!(gdt.pointer().limit, 7);

    for entries in 2..=8 {
        gdt.push(Descriptor::kernel_data(SegmentMode::Protected)).unwrap();
        assert_eq!(gdt.len(), entries);
        assert_eq!(gdt.pointer().limit as usize, entries * DESCRIPTOR_SIZE - 1);
    }
}

#[test]
fn kernel_table_pointer() {
    let gdt = populated();
    let pointer = gdt.pointer();
    let (base, limit) = (pointer.base, pointer.limit);

    assert_eq!(limit, 39);
    assert_eq!(base, VirtAddr::from_ptr(gdt.entries().as_ptr()));
    assert!(base.is_aligned(DESCRIPTOR_SIZE as u64));
}

#[test]
fn memory_layout_sizes() {
    assert_eq!(core::mem::size_of::<Descriptor>(), DESCRIPTOR_SIZE);
    // 16-bit limit followed by the 64-bit base, no padding.
    assert_eq!(core::mem::size_of::<DescriptorTablePointer>(), 10);
    assert_eq!(core::mem::size_of::<[Descriptor; 5]>(), 40);
}

#[test]
fn from_entries_requires_the_null_descriptor() {
    assert_eq!(Gdt::<8>::from_entries(&[]).unwrap_err(), GdtError::MissingNullDescriptor);

    let code = Descriptor::kernel_code(SegmentMode::Protected);
    assert_eq!(
        Gdt::<8>::from_entries(&[code]).unwrap_err(),
        GdtError::MissingNullDescriptor
    );

    let gdt = Gdt::<8>::from_entries(&[Descriptor::NULL, code]).unwrap();
    assert_eq!(gdt.len(), 2);
    assert_eq!(gdt.state(), TableState::Populated);
}

#[test]
fn from_entries_respects_capacity() {
    let entries = [Descriptor::NULL; 3];
    assert_eq!(
        Gdt::<2>::from_entries(&entries).unwrap_err(),
        GdtError::TableFull { capacity: 2 }
    );
}

#[test]
fn push_and_set_bounds() {
    let mut gdt: Gdt<3> = Gdt::new();
    assert_eq!(gdt.push(Descriptor::kernel_code(SegmentMode::Long)), Ok(1));
    assert_eq!(gdt.push(Descriptor::kernel_data(SegmentMode::Long)), Ok(2));
    assert_eq!(
        gdt.push(Descriptor::user_code(SegmentMode::Long)),
        Err(GdtError::TableFull { capacity: 3 })
    );
    assert_eq!(
        gdt.set(3, Descriptor::user_code(SegmentMode::Long)),
        Err(GdtError::IndexOutOfRange { index: 3, capacity: 3 })
    );
}

#[test]
fn set_past_the_end_leaves_null_gaps() {
    let mut gdt: Gdt<8> = Gdt::new();
    gdt.set(4, Descriptor::user_data(SegmentMode::Long)).unwrap();

    assert_eq!(gdt.len(), 5);
    assert!(gdt.entries()[1..4].iter().all(|entry| entry.is_null()));
    assert_eq!(gdt.pointer().limit, 39);
}

#[test]
fn loading_an_unpopulated_table_is_rejected() {
    let gdt = leak(Gdt::<8>::new());
    let mut loader = RecordingLoader::default();

    assert_eq!(
        gdt.load(&mut loader, KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR),
        Err(GdtError::NotPopulated)
    );
    assert_eq!(loader.table_loads, 0);
    assert_eq!(gdt.state(), TableState::Uninitialized);
}

#[test]
fn load_installs_table_and_selectors() {
    let gdt = leak(populated());
    let mut loader = RecordingLoader::default();
    assert_eq!(gdt.state(), TableState::Populated);

    let active = gdt.load(&mut loader, KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR).unwrap();

    assert_eq!(gdt.state(), TableState::Loaded);
    assert_eq!(active.code.0, 0x08);
    assert_eq!(active.data.0, 0x10);
    assert_eq!(active.table_limit, 39);
    assert_eq!(active.table_base, VirtAddr::from_ptr(gdt.entries().as_ptr()));
    assert_eq!(loader.active(), active);
}

#[test]
fn reloading_an_unchanged_table_is_idempotent() {
    let gdt = leak(populated());
    let mut loader = RecordingLoader::default();

    let first = gdt.load(&mut loader, KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR).unwrap();
    let after_first = loader.active();
    let second = gdt.load(&mut loader, KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR).unwrap();

    assert_eq!(first, second);
    assert_eq!(loader.active(), after_first);
    assert_eq!(loader.table_loads, 2);
    assert_eq!(gdt.state(), TableState::Loaded);
}

#[test]
fn writing_after_load_requires_a_reload() {
    let mut gdt = populated();
    let mut loader = RecordingLoader::default();

    unsafe { gdt.load_unsafe(&mut loader, KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR) }.unwrap();
    assert_eq!(gdt.state(), TableState::Loaded);

    gdt.push(Descriptor::kernel_data(SegmentMode::Long)).unwrap();
    assert_eq!(gdt.state(), TableState::Populated);

    unsafe { gdt.load_unsafe(&mut loader, KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR) }.unwrap();
    assert_eq!(gdt.state(), TableState::Loaded);
    assert_eq!(loader.active().table_limit, 47);
}

#[test]
fn load_rejects_selectors_of_the_wrong_kind() {
    let gdt = leak(populated());
    let mut loader = RecordingLoader::default();

    assert_eq!(
        gdt.load(&mut loader, KERNEL_DATA_SELECTOR, KERNEL_DATA_SELECTOR),
        Err(GdtError::NotCodeSegment { selector: 0x10 })
    );
    assert_eq!(
        gdt.load(&mut loader, KERNEL_CODE_SELECTOR, KERNEL_CODE_SELECTOR),
        Err(GdtError::NotDataSegment { selector: 0x08 })
    );
    // Kernel code segment requested at ring 3.
    assert_eq!(
        gdt.load(&mut loader, SegmentSelector::new(1, PrivilegeLevel::Ring3), KERNEL_DATA_SELECTOR),
        Err(GdtError::NotCodeSegment { selector: 0x0B })
    );
    assert_eq!(loader.table_loads, 0);
    assert_eq!(gdt.state(), TableState::Populated);
}

#[test]
fn load_rejects_user_selectors() {
    let gdt = leak(populated());
    let mut loader = RecordingLoader::default();

    assert_eq!(
        gdt.load(&mut loader, USER_CODE_SELECTOR, USER_DATA_SELECTOR),
        Err(GdtError::NotKernelSegment { selector: 0x1B })
    );
    assert_eq!(
        gdt.load(&mut loader, KERNEL_CODE_SELECTOR, USER_DATA_SELECTOR),
        Err(GdtError::NotKernelSegment { selector: 0x23 })
    );
    assert_eq!(loader.table_loads, 0);
    assert_eq!(loader.segment_reloads, 0);
    assert_eq!(gdt.state(), TableState::Populated);
}

#[test]
fn load_rejects_selectors_outside_the_table() {
    let gdt = leak(populated());
    let mut loader = RecordingLoader::default();

    let past_end = SegmentSelector::new(5, PrivilegeLevel::Ring0);
    assert_eq!(
        gdt.load(&mut loader, past_end, KERNEL_DATA_SELECTOR),
        Err(GdtError::SelectorOutOfBounds { selector: 0x28 })
    );
    assert_eq!(
        gdt.load(&mut loader, KERNEL_CODE_SELECTOR, SegmentSelector(0)),
        Err(GdtError::SelectorOutOfBounds { selector: 0 })
    );
    // Table indicator bit set: an LDT selector.
    assert_eq!(
        gdt.load(&mut loader, SegmentSelector(0x0C), KERNEL_DATA_SELECTOR),
        Err(GdtError::SelectorOutOfBounds { selector: 0x0C })
    );
}

#[test]
fn init_loads_kernel_selectors_and_verifies() {
    let gdt = leak(populated());
    let mut loader = RecordingLoader::default();

    let active = init(gdt, &mut loader).unwrap();

    assert_eq!(active.code, KERNEL_CODE_SELECTOR);
    assert_eq!(active.data, KERNEL_DATA_SELECTOR);
    assert_eq!(loader.segment_reloads, 1);
}

#[test]
fn verification_reports_mismatches() {
    let gdt = leak(populated());
    let mut loader = RecordingLoader::default();
    let expected = gdt.load(&mut loader, KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR).unwrap();

    let mut observed = expected;
    observed.code = USER_CODE_SELECTOR;
    assert_eq!(
        verify::check(&expected, &observed),
        Err(GdtError::SelectorMismatch { register: "CS", expected: 0x08, found: 0x1B })
    );

    let mut observed = expected;
    observed.data = USER_DATA_SELECTOR;
    assert_eq!(
        verify::check(&expected, &observed),
        Err(GdtError::SelectorMismatch { register: "DS", expected: 0x10, found: 0x23 })
    );

    let mut observed = expected;
    observed.table_limit = 7;
    assert!(matches!(
        verify::check(&expected, &observed),
        Err(GdtError::TablePointerMismatch { expected_limit: 39, found_limit: 7, .. })
    ));

    assert_eq!(verify::verify(&loader, &expected), Ok(()));
}

#[test]
fn table_is_shareable_between_cores() {
    fn assert_sync<T: Sync>() {}
    assert_sync::<Gdt>();
}

#[test]
fn display_lists_every_entry() {
    let gdt = populated();
    let rendered = gdt.to_string();

    assert!(rendered.contains("5/8 entries"));
    assert!(rendered.contains("1: 0x00af9a000000ffff"));
    assert!(rendered.contains("4: 0x00cff2000000ffff"));
}
