#![no_std]
#![no_main]

mod kernel;
mod logger;
mod serial;

use core::panic::PanicInfo;

bootloader_api::entry_point!(kernel_main);

fn kernel_main(_boot_info: &'static mut bootloader_api::BootInfo) -> ! {
    match kernel::early_init() {
        Ok(state) => kernel::kernel_loop(state),
        Err(err) => {
            serial::write_fmt(format_args!("early init failed: {err}\n"));
            kernel::halt()
        }
    }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    serial::write_fmt(format_args!("\n=== KERNEL PANIC ===\n{info}\n"));
    kernel::halt()
}
