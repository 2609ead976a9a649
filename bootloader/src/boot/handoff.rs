// Kernel boot handoff
//
// Cache and MMU teardown followed by the jump. Nothing here can fail: once
// teardown starts the only way out is the kernel entry point.

use log::info;
use mboot_hwinit::cpu::cp15::{set_way_operand, DCACHE_INDICES, DCACHE_WAYS};

/// CP15 maintenance operations needed before entering the kernel.
pub trait CacheControl {
    /// Clean and invalidate one D-cache line by set/way.
    fn clean_invalidate_dcache_line(&mut self, set_way: u32);
    fn disable_dcache(&mut self);
    fn disable_icache(&mut self);
    fn invalidate_icache(&mut self);
    fn disable_mmu(&mut self);
    fn invalidate_tlb(&mut self);
}

/// The boot transfer mechanism: two registers, then the jump.
pub trait BootTransfer {
    fn set_parameter_address(&mut self, addr: u32);
    fn set_machine_id(&mut self, id: u32);

    /// Jump to `entry`.
    ///
    /// # Safety
    /// `entry` must hold a bootable image and caches must be torn down.
    unsafe fn transfer(&mut self, entry: u32) -> !;
}

/// Where and how the kernel is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handoff {
    pub kernel_addr: u32,
    pub param_addr: u32,
    pub machine_id: u32,
}

/// Clean the whole D-cache, then turn caches and MMU off.
pub fn teardown<C: CacheControl>(cache: &mut C) {
    for index in 0..DCACHE_INDICES {
        for way in 0..DCACHE_WAYS {
            cache.clean_invalidate_dcache_line(set_way_operand(index, way));
        }
    }

    cache.disable_dcache();
    cache.disable_icache();
    cache.invalidate_icache();
    cache.disable_mmu();
    cache.invalidate_tlb();
}

/// Tear down caches and MMU, register the boot parameters and enter the
/// kernel.
///
/// # Safety
/// The kernel image and ATAG list must be staged at the addresses in
/// `handoff`.
pub unsafe fn dispatch<C, T>(cache: &mut C, transfer: &mut T, handoff: Handoff) -> !
where
    C: CacheControl,
    T: BootTransfer,
{
    info!(
        "starting kernel at {:#010x}, machine {}, ATAGs at {:#010x}",
        handoff.kernel_addr, handoff.machine_id, handoff.param_addr
    );

    teardown(cache);
    transfer.set_parameter_address(handoff.param_addr);
    transfer.set_machine_id(handoff.machine_id);
    transfer.transfer(handoff.kernel_addr)
}
