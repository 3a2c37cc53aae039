use std::path::{Path, PathBuf};

use bootloader::{BiosBoot, UefiBoot};

const KERNEL_NAME: &str = "ringos";
const KERNEL_TARGET: &str = "x86_64-unknown-none";

fn workspace_root() -> PathBuf {
    let manifest_dir = std::env::var_os("CARGO_MANIFEST_DIR").map(PathBuf::from).unwrap_or_default();
    manifest_dir.parent().map(Path::to_path_buf).unwrap_or(manifest_dir)
}

fn kernel_binary(root: &Path) -> PathBuf {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "debug".into());
    root.join("target").join(KERNEL_TARGET).join(profile).join(KERNEL_NAME)
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../os/src");

    let root = workspace_root();
    let kernel = kernel_binary(&root);
    println!("cargo:rerun-if-changed={}", kernel.display());

    // The kernel is built separately for the bare-metal target; without it there is
    // nothing to wrap, which is fine for host-side builds of the workspace.
    if !kernel.exists() {
        println!(
            "cargo:warning=kernel binary not found at {}; build it with `cargo build -p ringos --target {KERNEL_TARGET}`",
            kernel.display()
        );
        return;
    }

    let bios = root.join(format!("{KERNEL_NAME}-bios.img"));
    BiosBoot::new(&kernel)
        .create_disk_image(&bios)
        .expect("failed to create BIOS disk image");
    println!("cargo:rustc-env=RINGOS_BIOS_IMAGE={}", bios.display());

    let uefi = root.join(format!("{KERNEL_NAME}-uefi.img"));
    UefiBoot::new(&kernel)
        .create_disk_image(&uefi)
        .expect("failed to create UEFI disk image");
    println!("cargo:rustc-env=RINGOS_UEFI_IMAGE={}", uefi.display());
}
