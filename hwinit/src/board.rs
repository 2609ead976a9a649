//! Board support package bindings
//!
//! The SD/MMC controller, FPGA configuration port and SHA204 identity chip
//! are driven by the vendor BSP, linked in as C. This module wraps those
//! entry points; nothing above it calls the BSP directly.

use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};

const SECTOR_SIZE: usize = 512;

extern "C" {
    fn bsp_sd_init() -> i32;
    fn bsp_sd_sector_count() -> u32;
    fn bsp_sd_read(lba: u32, count: u32, dst: *mut u8) -> i32;
    fn bsp_fpga_configure(image: *const u8, len: u32) -> i32;
    fn bsp_sha204_read(zone: u8, address: u16, response: *mut u8) -> u8;
}

/// Non-zero status returned by a BSP call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BspError(pub i32);

impl core::fmt::Display for BspError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "BSP status {}", self.0)
    }
}

fn check(status: i32) -> Result<(), BspError> {
    match status {
        0 => Ok(()),
        code => Err(BspError(code)),
    }
}

/// The boot SD card as a read-only block device.
pub struct SdCard {
    sectors: u32,
}

impl SdCard {
    /// Bring up the card controller.
    pub fn init() -> Result<Self, BspError> {
        // SAFETY: plain BSP call, no arguments.
        unsafe {
            check(bsp_sd_init())?;
            Ok(Self {
                sectors: bsp_sd_sector_count(),
            })
        }
    }
}

impl BlockIo for SdCard {
    type Error = BspError;

    fn block_size(&self) -> BlockSize {
        BlockSize::BS_512
    }

    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        Ok(self.sectors as u64)
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
        if dst.len() % SECTOR_SIZE != 0 {
            return Err(BspError(-1));
        }
        let count = (dst.len() / SECTOR_SIZE) as u32;
        let lba = u32::try_from(start_lba.0).map_err(|_| BspError(-1))?;
        // SAFETY: dst is valid for count whole sectors.
        unsafe { check(bsp_sd_read(lba, count, dst.as_mut_ptr())) }
    }

    fn write_blocks(&mut self, _start_lba: Lba, _src: &[u8]) -> Result<(), Self::Error> {
        Err(BspError(-1))
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Push a configuration bitstream through the FPGA programming port.
pub fn fpga_configure(image: &[u8]) -> Result<(), BspError> {
    // SAFETY: the BSP only reads `len` bytes from `image`.
    unsafe { check(bsp_fpga_configure(image.as_ptr(), image.len() as u32)) }
}

/// One SHA204 Read command: four response bytes and the chip status.
pub fn sha204_read(zone: u8, address: u16) -> ([u8; 4], u8) {
    let mut response = [0u8; 4];
    // SAFETY: the BSP writes at most four bytes for a 4-byte read.
    let status = unsafe { bsp_sha204_read(zone, address, response.as_mut_ptr()) };
    (response, status)
}
