//! CP15 system control coprocessor
//!
//! Cache, MMU and TLB maintenance in the order the Linux ARM boot protocol
//! expects at kernel entry: data cache clean, caches off, MMU off.
//!
//! The encodings used here (`c7, c14, 2` set/way clean+invalidate, `c7, c5, 0`
//! I-cache invalidate, `c8, c7, 0` TLB invalidate) are the ARMv5 forms, still
//! accepted by ARMv7-A cores.

/// SCTLR.M - MMU enable
pub const SCTLR_M: u32 = 1 << 0;
/// SCTLR.C - data cache enable
pub const SCTLR_C: u32 = 1 << 2;
/// SCTLR.I - instruction cache enable
pub const SCTLR_I: u32 = 1 << 12;

/// Data cache index (set) count covered by the set/way walk.
pub const DCACHE_INDICES: u32 = 64;
/// Data cache way count covered by the set/way walk.
pub const DCACHE_WAYS: u32 = 8;

const INDEX_SHIFT: u32 = 26;
const WAY_SHIFT: u32 = 5;

/// Operand for a clean+invalidate by set/way of one line.
#[inline]
pub const fn set_way_operand(index: u32, way: u32) -> u32 {
    (index << INDEX_SHIFT) | (way << WAY_SHIFT)
}

#[cfg(target_arch = "arm")]
mod ops {
    use super::{SCTLR_C, SCTLR_I, SCTLR_M};
    use core::arch::asm;

    #[inline]
    fn read_sctlr() -> u32 {
        let value: u32;
        unsafe {
            asm!("mrc p15, 0, {}, c1, c0, 0", out(reg) value, options(nomem, nostack, preserves_flags));
        }
        value
    }

    #[inline]
    unsafe fn write_sctlr(value: u32) {
        asm!("mcr p15, 0, {}, c1, c0, 0", in(reg) value, options(nostack, preserves_flags));
    }

    /// Clean and invalidate one D-cache line by set/way.
    ///
    /// # Safety
    /// Boot CPU only, interrupts masked.
    #[inline]
    pub unsafe fn clean_invalidate_dcache_setway(operand: u32) {
        asm!("mcr p15, 0, {}, c7, c14, 2", in(reg) operand, options(nostack, preserves_flags));
    }

    /// # Safety
    /// The data cache must already be clean.
    pub unsafe fn disable_dcache() {
        write_sctlr(read_sctlr() & !SCTLR_C);
    }

    /// # Safety
    /// Boot CPU only.
    pub unsafe fn disable_icache() {
        write_sctlr(read_sctlr() & !SCTLR_I);
    }

    /// # Safety
    /// Boot CPU only.
    pub unsafe fn invalidate_icache() {
        asm!("mcr p15, 0, {}, c7, c5, 0", in(reg) 0u32, options(nostack, preserves_flags));
    }

    /// # Safety
    /// Code and data in use must be identity mapped.
    pub unsafe fn disable_mmu() {
        write_sctlr(read_sctlr() & !SCTLR_M);
    }

    /// # Safety
    /// Boot CPU only.
    pub unsafe fn invalidate_tlb() {
        asm!("mcr p15, 0, {}, c8, c7, 0", in(reg) 0u32, options(nostack, preserves_flags));
    }
}

#[cfg(target_arch = "arm")]
pub use ops::*;
