//! Common test utilities and mock block devices

pub mod builder;
#[allow(unused_imports)]
pub use builder::Fat32ImageBuilder;

use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};
use std::io;

pub const SECTOR: usize = 512;

/// In-memory block device for testing
#[derive(Debug, Clone)]
pub struct MemoryBlockDevice {
    pub data: Vec<u8>,
    /// Reads touching this LBA or anything after it fail.
    pub fail_from_lba: Option<u64>,
    pub reads: usize,
}

impl MemoryBlockDevice {
    /// Create a new memory block device from raw data
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            fail_from_lba: None,
            reads: 0,
        }
    }
}

impl BlockIo for MemoryBlockDevice {
    type Error = io::Error;

    fn block_size(&self) -> BlockSize {
        BlockSize::BS_512
    }

    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        Ok((self.data.len() / SECTOR) as u64)
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
        self.reads += 1;
        let last_lba = start_lba.0 + (dst.len() / SECTOR) as u64;
        if let Some(fail) = self.fail_from_lba {
            if last_lba > fail {
                return Err(io::Error::new(io::ErrorKind::Other, "injected read failure"));
            }
        }

        let offset = start_lba.0 as usize * SECTOR;
        if offset + dst.len() > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "read beyond end of device",
            ));
        }
        dst.copy_from_slice(&self.data[offset..offset + dst.len()]);
        Ok(())
    }

    fn write_blocks(&mut self, _start_lba: Lba, _src: &[u8]) -> Result<(), Self::Error> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(()) // No-op for in-memory device
    }
}
