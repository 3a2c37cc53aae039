//! Segmentation core of the `ringos` kernel.
//!
//! The library half of the crate holds everything that can be reasoned about
//! without touching the CPU: descriptor encoding, the table itself and the
//! selectors the rest of the kernel relies on. The single privileged step is
//! hidden behind [`gdt::SegmentLoader`], so all of it also builds and runs as
//! ordinary host code under `cargo test`.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod gdt;
