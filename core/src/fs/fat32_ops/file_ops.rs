// FAT32 file read operations

use super::super::Fat32Error;
use super::context::Fat32Context;
use super::types::SECTOR_SIZE;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

/// Copy a file's data straight into `dst`, following its cluster chain.
///
/// Reads `min(file_size, dst.len())` bytes and returns how many were copied.
/// Whole sectors go directly into the destination; only a trailing partial
/// sector is bounced through a stack buffer.
pub fn read_file_into<B: BlockIo>(
    block_io: &mut B,
    partition_start: u64,
    ctx: &Fat32Context,
    first_cluster: u32,
    file_size: usize,
    dst: &mut [u8],
) -> Result<usize, Fat32Error> {
    let wanted = file_size.min(dst.len());
    if wanted == 0 {
        return Ok(0);
    }
    if !ctx.is_valid_cluster(first_cluster) {
        return Err(Fat32Error::CorruptChain);
    }

    let mut data_offset = 0;
    let mut current = first_cluster;
    let mut links = 0u32;

    loop {
        let sector = ctx.cluster_to_sector(current);
        for sec_offset in 0..ctx.sectors_per_cluster {
            let lba = Lba(partition_start + sector as u64 + sec_offset as u64);
            let remaining = wanted - data_offset;

            if remaining >= SECTOR_SIZE {
                block_io
                    .read_blocks(lba, &mut dst[data_offset..data_offset + SECTOR_SIZE])
                    .map_err(|_| Fat32Error::IoError)?;
                data_offset += SECTOR_SIZE;
            } else {
                let mut tail = [0u8; SECTOR_SIZE];
                block_io
                    .read_blocks(lba, &mut tail)
                    .map_err(|_| Fat32Error::IoError)?;
                dst[data_offset..wanted].copy_from_slice(&tail[..remaining]);
                data_offset = wanted;
            }

            if data_offset >= wanted {
                return Ok(data_offset);
            }
        }

        // Get next cluster from FAT
        links += 1;
        if links > ctx.cluster_count {
            return Err(Fat32Error::CorruptChain);
        }
        current = match ctx.next_cluster(block_io, partition_start, current)? {
            Some(next) => next,
            // Chain ended before the recorded size
            None => return Ok(data_offset),
        };
    }
}
