//! Physical staging windows
//!
//! Each staging region is a byte slice tagged with the physical address it
//! lives at. All writes go through the slice, so every offset is bounds
//! checked; on the board the slice is built over the raw address, in tests
//! over a host buffer.

use crate::config::BootConfig;

/// A bounds-checked view of one physical memory range.
pub struct PhysWindow<'a> {
    base: u32,
    bytes: &'a mut [u8],
}

impl<'a> PhysWindow<'a> {
    /// Wrap `bytes` as the memory found at physical `base`.
    pub fn new(base: u32, bytes: &'a mut [u8]) -> Self {
        Self { base, bytes }
    }

    /// Window over raw physical memory.
    ///
    /// # Safety
    /// `[base, base + len)` must be RAM, identity mapped, and not used by
    /// anything else while the window lives.
    pub unsafe fn from_phys(base: u32, len: u32) -> Self {
        Self {
            base,
            bytes: core::slice::from_raw_parts_mut(base as usize as *mut u8, len as usize),
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &*self.bytes
    }

    /// `len` bytes starting `offset` bytes into the window.
    pub fn slice_mut(&mut self, offset: usize, len: usize) -> Option<&mut [u8]> {
        let end = offset.checked_add(len)?;
        self.bytes.get_mut(offset..end)
    }

    /// Store a little-endian word. `None` if it would leave the window.
    pub fn write_u32(&mut self, offset: usize, value: u32) -> Option<()> {
        self.slice_mut(offset, 4)?
            .copy_from_slice(&value.to_le_bytes());
        Some(())
    }

    pub fn read_u32(&self, offset: usize) -> Option<u32> {
        let end = offset.checked_add(4)?;
        let word = self.bytes.get(offset..end)?;
        Some(u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
    }

    /// Physical address of `offset`.
    pub fn addr_of(&self, offset: usize) -> u32 {
        self.base.wrapping_add(offset as u32)
    }

    pub fn zero(&mut self) {
        self.bytes.fill(0);
    }
}

/// The three staging regions, one per pipeline stage that writes memory.
pub struct BootMemory<'a> {
    pub logic: PhysWindow<'a>,
    pub params: PhysWindow<'a>,
    pub kernel: PhysWindow<'a>,
}

impl BootMemory<'static> {
    /// Windows over the board's physical staging regions.
    ///
    /// # Safety
    /// `config` must pass [`BootConfig::validate`], and its regions must be
    /// free RAM reachable at their physical addresses.
    pub unsafe fn from_config(config: &BootConfig) -> Self {
        Self {
            logic: PhysWindow::from_phys(config.logic_image_addr, config.logic_image_capacity),
            params: PhysWindow::from_phys(config.param_addr, config.param_region_len()),
            kernel: PhysWindow::from_phys(config.kernel_addr, config.kernel_capacity),
        }
    }
}
