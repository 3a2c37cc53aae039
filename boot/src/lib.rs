//! Disk images wrapped around the `ringos` kernel by this crate's build script.
//!
//! Both paths are `None` when the kernel binary had not been built for the
//! bare-metal target at the time this crate was compiled.

/// Path of the BIOS disk image.
pub const BIOS_IMAGE: Option<&str> = option_env!("RINGOS_BIOS_IMAGE");

/// Path of the UEFI disk image.
pub const UEFI_IMAGE: Option<&str> = option_env!("RINGOS_UEFI_IMAGE");
