//! Read-back check run right after the kernel table is loaded.

use super::error::{GdtError, GdtResult};
use super::loader::{ActiveSegments, SegmentLoader};

/// Compares what was loaded against what the CPU reports.
pub fn check(expected: &ActiveSegments, observed: &ActiveSegments) -> GdtResult<()> {
    if observed.code != expected.code {
        return Err(GdtError::SelectorMismatch {
            register: "CS",
            expected: expected.code.0,
            found: observed.code.0,
        });
    }
    if observed.data != expected.data {
        return Err(GdtError::SelectorMismatch {
            register: "DS",
            expected: expected.data.0,
            found: observed.data.0,
        });
    }
    if observed.table_base != expected.table_base || observed.table_limit != expected.table_limit {
        return Err(GdtError::TablePointerMismatch {
            expected_base: expected.table_base.as_u64(),
            expected_limit: expected.table_limit,
            found_base: observed.table_base.as_u64(),
            found_limit: observed.table_limit,
        });
    }
    Ok(())
}

/// Reads the live segment state through `loader` and checks it.
pub fn verify<L: SegmentLoader>(loader: &L, expected: &ActiveSegments) -> GdtResult<()> {
    let observed = loader.active();
    log::debug!(
        "CS={:#x} DS={:#x} GDTR={:#x}/{:#x}",
        observed.code.0,
        observed.data.0,
        observed.table_base.as_u64(),
        observed.table_limit
    );
    check(expected, &observed)?;
    log::info!("GDT verification passed");
    Ok(())
}
