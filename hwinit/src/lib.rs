//! Hardware layer for the mboot kernel stager
//!
//! Everything that touches the ARM core or the board's peripherals lives
//! here, behind plain functions the pipeline crate wraps in its own traits.
//!
//! # Architecture
//!
//! ```text
//! board support package (C):
//!   - SD/MMC block reads
//!   - FPGA configuration port
//!   - SHA204 secure-identity chip
//!
//! this crate:
//!   - CP15 cache and MMU control (ARMv5/v7 encodings)
//!   - Kernel entry trampoline (r0 = 0, r1 = machine id, r2 = ATAGs)
//!   - Heap over a caller-supplied buffer
//!   - Polled debug UART output
//! ```
//!
//! # What This Crate Does NOT Do
//!
//! - Filesystem parsing (see `mboot-core`)
//! - Boot sequencing, ATAG layout, command line editing (see `mboot`)

#![no_std]

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod board;
pub mod cpu;
pub mod heap;
pub mod serial;

// ═══════════════════════════════════════════════════════════════════════════
// RE-EXPORTS
// ═══════════════════════════════════════════════════════════════════════════

pub use cpu::entry::Bootm;
pub use heap::{heap_stats, init_heap_with_buffer, is_heap_initialized, HeapAllocator};
