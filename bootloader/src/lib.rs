//! mboot - final-stage kernel stager
//!
//! Loads the FPGA bitstream and the Linux zImage from the boot SD card,
//! tags the kernel command line with the board's hardware address, builds
//! the ATAG list and jumps into the kernel.
//!
//! The pipeline in [`boot`] only talks to hardware through traits, so it runs
//! unchanged on the host under test. [`platform`] binds those traits to the
//! real board and exports the `mboot` C entry point.

#![no_std]
#![allow(clippy::new_without_default)]

extern crate alloc;

pub mod boot;
pub mod config;
pub mod error;
pub mod memory;

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod platform;

pub use config::{BootConfig, ConfigError};
pub use error::{Artifact, BootError};
pub use memory::{BootMemory, PhysWindow};
