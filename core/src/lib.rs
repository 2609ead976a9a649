//! mboot Core Library
//!
//! Storage and diagnostics plumbing for the mboot kernel stager:
//! a read-only FAT32 volume over any `gpt_disk_io::BlockIo` and the
//! `log` backend used on the board.
//!
//! Designed to be no_std compatible.

#![no_std]
#![allow(clippy::new_without_default)]
#![allow(clippy::manual_div_ceil)]

extern crate alloc;

pub mod fs;
pub mod logger;
