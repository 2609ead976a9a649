//! Serial debug output (DBGU @ 0xFFFF_F200)
//!
//! Minimal polled output for boot diagnostics.
//! No buffering, no interrupts, bounded waits.

/// Debug unit base address.
pub const DBGU_BASE: usize = 0xFFFF_F200;
const DBGU_SR: usize = 0x14;
const DBGU_THR: usize = 0x1C;
const SR_TXRDY: u32 = 1 << 1;

/// Polls before a byte is dropped.
const TX_SPINS: usize = 10_000;

/// Write byte to the debug unit. Bounded wait, drops the byte if the
/// transmitter never becomes ready.
#[inline]
pub fn putc(b: u8) {
    let sr = (DBGU_BASE + DBGU_SR) as *const u32;
    let thr = (DBGU_BASE + DBGU_THR) as *mut u32;
    // SAFETY: fixed MMIO registers of the debug unit, always mapped while
    // the MMU is off or identity mapped.
    unsafe {
        for _ in 0..TX_SPINS {
            if core::ptr::read_volatile(sr) & SR_TXRDY != 0 {
                core::ptr::write_volatile(thr, b as u32);
                return;
            }
            core::hint::spin_loop();
        }
    }
}

/// Write raw bytes; used as the logger sink.
pub fn write_bytes(bytes: &[u8]) {
    for &b in bytes {
        putc(b);
    }
}

/// Write string to the debug unit.
pub fn puts(s: &str) {
    write_bytes(s.as_bytes());
}
