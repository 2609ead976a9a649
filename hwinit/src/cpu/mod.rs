//! ARM core control
//!
//! # Modules
//!
//! - `cp15` - System control coprocessor: caches, MMU, TLB
//! - `entry` - Kernel entry register setup and the final branch

pub mod cp15;
pub mod entry;
