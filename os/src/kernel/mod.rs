use core::fmt;

use ringos::config;
use ringos::gdt::{self, ActiveSegments, Cpu, Gdt, GdtError};
use spin::Once;
use x86_64::instructions::interrupts;

/// Storage for the kernel's descriptor table. Written once, never moved.
static GDT: Once<Gdt> = Once::new();

pub enum KernelInitError {
    LoggerInitFailed,
    SegmentationFailed(GdtError),
}

impl fmt::Display for KernelInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggerInitFailed => write!(f, "a logger was already installed"),
            Self::SegmentationFailed(err) => write!(f, "GDT setup failed: {err}"),
        }
    }
}

impl From<GdtError> for KernelInitError {
    fn from(err: GdtError) -> Self {
        Self::SegmentationFailed(err)
    }
}

pub struct KernelState {
    pub segments: ActiveSegments,
}

pub fn early_init() -> Result<KernelState, KernelInitError> {
    // Nothing below may be interrupted while segment registers are in flux.
    interrupts::disable();

    crate::serial::init();
    crate::logger::init().map_err(|_| KernelInitError::LoggerInitFailed)?;
    log::info!("kernel running");

    let table = GDT.try_call_once(|| gdt::kernel_table(config::SEGMENT_MODE))?;
    let segments = gdt::init(table, &mut Cpu)?;

    log::info!(
        "segments ready: kernel CS={:#x} DS={:#x}, user CS={:#x} DS={:#x}",
        segments.code.0,
        segments.data.0,
        gdt::USER_CODE_SELECTOR.0,
        gdt::USER_DATA_SELECTOR.0
    );

    Ok(KernelState { segments })
}

pub fn kernel_loop(state: KernelState) -> ! {
    log::debug!("idle with CS={:#x}", state.segments.code.0);
    halt()
}

pub fn halt() -> ! {
    loop {
        x86_64::instructions::hlt();
    }
}
