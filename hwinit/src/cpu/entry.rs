//! Kernel entry
//!
//! Holds the two values the kernel wants in registers and performs the final
//! branch. ARM Linux entry convention:
//!
//! | register | value                 |
//! |----------|-----------------------|
//! | r0       | 0                     |
//! | r1       | machine type id       |
//! | r2       | ATAG list address     |
//!
//! MMU and data cache must be off; see [`super::cp15`].

/// Register values staged for the jump into the kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bootm {
    param_addr: u32,
    machine_id: u32,
}

impl Bootm {
    pub const fn new() -> Self {
        Self {
            param_addr: 0,
            machine_id: 0,
        }
    }

    pub fn set_param_addr(&mut self, addr: u32) {
        self.param_addr = addr;
    }

    pub fn set_machine_id(&mut self, id: u32) {
        self.machine_id = id;
    }

    pub fn param_addr(&self) -> u32 {
        self.param_addr
    }

    pub fn machine_id(&self) -> u32 {
        self.machine_id
    }

    /// Branch to `entry` with the staged registers.
    ///
    /// # Safety
    /// `entry` must hold a kernel image, the ATAG list must be in place, and
    /// caches and MMU must already be torn down.
    #[cfg(target_arch = "arm")]
    pub unsafe fn run(&self, entry: u32) -> ! {
        core::arch::asm!(
            "bx {entry}",
            entry = in(reg) entry,
            in("r0") 0u32,
            in("r1") self.machine_id,
            in("r2") self.param_addr,
            options(noreturn, nostack),
        )
    }
}
