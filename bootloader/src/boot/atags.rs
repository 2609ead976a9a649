// ARM Linux boot parameters (ATAG list)
// Reference: https://www.kernel.org/doc/html/latest/arch/arm/setup.html
//
// Layout written at the base of the param region, 32-bit LE words:
//
//   word  0..1   ATAG_CORE      (size 2, no payload)
//   word  2..5   ATAG_SERIAL    (size 4, serial low, serial high)
//   word  6..8   ATAG_REVISION  (size 3, board revision)
//   word  9..10  ATAG_CMDLINE   (size (4 + len + 5) >> 2)
//   word 11..    command line bytes
//
// There is no explicit ATAG_NONE: the region is zeroed before staging, so the
// word after the command line tag already reads as a zero-sized tag.

use crate::memory::PhysWindow;

pub const ATAG_NONE: u32 = 0x0000_0000;
pub const ATAG_CORE: u32 = 0x5441_0001;
pub const ATAG_SERIAL: u32 = 0x5441_0006;
pub const ATAG_REVISION: u32 = 0x5441_0007;
pub const ATAG_CMDLINE: u32 = 0x5441_0009;

/// Byte offset of the command line text: right after the ATAG_CMDLINE header.
pub const CMDLINE_DATA_OFFSET: usize = 11 * 4;

/// Size word of ATAG_CMDLINE for a command line of `cmdline_len` bytes.
pub const fn cmdline_tag_words(cmdline_len: usize) -> u32 {
    ((4 + cmdline_len + 5) >> 2) as u32
}

/// Everything the tag list carries besides the command line text itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootParams {
    pub serial_low: u32,
    pub serial_high: u32,
    pub revision: u32,
    pub cmdline_len: usize,
}

impl BootParams {
    /// The header words, in order.
    pub fn words(&self) -> [u32; 11] {
        [
            2,
            ATAG_CORE,
            4,
            ATAG_SERIAL,
            self.serial_low,
            self.serial_high,
            3,
            ATAG_REVISION,
            self.revision,
            cmdline_tag_words(self.cmdline_len),
            ATAG_CMDLINE,
        ]
    }

    /// Serialize the header words into `header`, which is the first
    /// [`CMDLINE_DATA_OFFSET`] bytes of the param region.
    pub fn write(&self, header: &mut [u8; CMDLINE_DATA_OFFSET]) {
        for (chunk, word) in header.chunks_exact_mut(4).zip(self.words()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
    }

    /// Write the header at the base of `params`. `None` if the window is
    /// shorter than the header.
    pub fn write_to(&self, params: &mut PhysWindow<'_>) -> Option<()> {
        let header = params.slice_mut(0, CMDLINE_DATA_OFFSET)?;
        self.write(header.try_into().ok()?);
        Some(())
    }
}
