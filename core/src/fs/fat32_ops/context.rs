// FAT32 filesystem context and FAT operations

use super::super::Fat32Error;
use super::types::SECTOR_SIZE;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

const BOOT_SIGNATURE: u16 = 0xAA55;
const MBR_PARTITION_TABLE: usize = 0x1BE;
const MBR_ENTRY_SIZE: usize = 16;

/// Cluster values at or above this mark the end of a chain.
pub const END_OF_CHAIN: u32 = 0x0FFF_FFF8;
const BAD_CLUSTER: u32 = 0x0FFF_FFF7;
/// Highest data cluster count a FAT32 volume can address.
pub const MAX_CLUSTER_COUNT: u32 = 0x0FFF_FFF5;
const FAT_ENTRIES_PER_SECTOR: u32 = (SECTOR_SIZE / 4) as u32;

/// Where to look for the FAT32 boot sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    /// Superfloppy layout at LBA 0, else the first populated MBR entry.
    Auto,
    /// Volume starts at this LBA.
    Lba(u64),
}

/// FAT32 filesystem context
#[derive(Debug, Clone)]
pub struct Fat32Context {
    pub sectors_per_cluster: u32,
    pub reserved_sectors: u32,
    pub fat_size: u32,
    pub num_fats: u32,
    pub root_cluster: u32,
    pub data_start_sector: u32,
    /// Number of addressable data clusters (cluster numbers 2..cluster_count + 2).
    pub cluster_count: u32,
}

impl Fat32Context {
    pub fn from_boot_sector<B: BlockIo>(
        block_io: &mut B,
        partition_start: u64,
    ) -> Result<Self, Fat32Error> {
        let mut boot_sector = [0u8; SECTOR_SIZE];
        block_io
            .read_blocks(Lba(partition_start), &mut boot_sector)
            .map_err(|_| Fat32Error::IoError)?;

        Self::parse(&boot_sector)
    }

    /// Parse a BPB. Rejects anything a FAT32 reader cannot walk safely.
    pub fn parse(boot_sector: &[u8; SECTOR_SIZE]) -> Result<Self, Fat32Error> {
        if u16::from_le_bytes([boot_sector[0x1FE], boot_sector[0x1FF]]) != BOOT_SIGNATURE {
            return Err(Fat32Error::InvalidBootSector);
        }

        let bytes_per_sector = u16::from_le_bytes([boot_sector[0x0B], boot_sector[0x0C]]);
        let sectors_per_cluster = boot_sector[0x0D] as u32;
        let reserved_sectors = u16::from_le_bytes([boot_sector[0x0E], boot_sector[0x0F]]) as u32;
        let num_fats = boot_sector[0x10] as u32;
        let total_sectors_16 = u16::from_le_bytes([boot_sector[0x13], boot_sector[0x14]]) as u32;
        let total_sectors_32 = read_u32(boot_sector, 0x20);
        let fat_size = read_u32(boot_sector, 0x24);
        let root_cluster = read_u32(boot_sector, 0x2C);

        if bytes_per_sector as usize != SECTOR_SIZE
            || sectors_per_cluster == 0
            || !sectors_per_cluster.is_power_of_two()
            || reserved_sectors == 0
            || num_fats == 0
            || fat_size == 0
            || root_cluster < 2
        {
            return Err(Fat32Error::InvalidBootSector);
        }

        let total_sectors = if total_sectors_16 != 0 {
            total_sectors_16
        } else {
            total_sectors_32
        };

        let data_start_sector = num_fats
            .checked_mul(fat_size)
            .and_then(|fats| fats.checked_add(reserved_sectors))
            .ok_or(Fat32Error::InvalidBootSector)?;
        if total_sectors <= data_start_sector {
            return Err(Fat32Error::InvalidBootSector);
        }
        let cluster_count = (total_sectors - data_start_sector) / sectors_per_cluster;

        // Every cluster, plus the two reserved slots, needs a FAT entry
        let fat_entries = fat_size.saturating_mul(FAT_ENTRIES_PER_SECTOR);
        if cluster_count == 0
            || cluster_count > MAX_CLUSTER_COUNT
            || fat_entries < cluster_count + 2
        {
            return Err(Fat32Error::InvalidBootSector);
        }

        Ok(Self {
            sectors_per_cluster,
            reserved_sectors,
            fat_size,
            num_fats,
            root_cluster,
            data_start_sector,
            cluster_count,
        })
    }

    pub fn cluster_size(&self) -> usize {
        self.sectors_per_cluster as usize * SECTOR_SIZE
    }

    pub fn is_valid_cluster(&self, cluster: u32) -> bool {
        cluster >= 2 && cluster - 2 < self.cluster_count
    }

    pub fn cluster_to_sector(&self, cluster: u32) -> u32 {
        self.data_start_sector + ((cluster - 2) * self.sectors_per_cluster)
    }

    pub fn read_fat_entry<B: BlockIo>(
        &self,
        block_io: &mut B,
        partition_start: u64,
        cluster: u32,
    ) -> Result<u32, Fat32Error> {
        if !self.is_valid_cluster(cluster) {
            return Err(Fat32Error::CorruptChain);
        }
        let fat_offset = cluster * 4;
        let fat_sector = self.reserved_sectors + (fat_offset / SECTOR_SIZE as u32);
        let entry_offset = (fat_offset % SECTOR_SIZE as u32) as usize;

        let mut sector = [0u8; SECTOR_SIZE];
        block_io
            .read_blocks(Lba(partition_start + fat_sector as u64), &mut sector)
            .map_err(|_| Fat32Error::IoError)?;

        let entry = read_u32(&sector, entry_offset) & 0x0FFFFFFF; // FAT32 uses only 28 bits

        Ok(entry)
    }

    /// Follow one link of a chain. `Ok(None)` at end of chain.
    pub fn next_cluster<B: BlockIo>(
        &self,
        block_io: &mut B,
        partition_start: u64,
        cluster: u32,
    ) -> Result<Option<u32>, Fat32Error> {
        let next = self.read_fat_entry(block_io, partition_start, cluster)?;
        if next >= END_OF_CHAIN {
            Ok(None)
        } else if next == BAD_CLUSTER || !self.is_valid_cluster(next) {
            Err(Fat32Error::CorruptChain)
        } else {
            Ok(Some(next))
        }
    }
}

/// Find the LBA of the FAT32 boot sector.
pub fn locate_volume<B: BlockIo>(block_io: &mut B, partition: Partition) -> Result<u64, Fat32Error> {
    let start = match partition {
        Partition::Lba(lba) => return Ok(lba),
        Partition::Auto => 0,
    };

    let mut sector0 = [0u8; SECTOR_SIZE];
    block_io
        .read_blocks(Lba(start), &mut sector0)
        .map_err(|_| Fat32Error::IoError)?;

    if Fat32Context::parse(&sector0).is_ok() {
        return Ok(start);
    }

    if u16::from_le_bytes([sector0[0x1FE], sector0[0x1FF]]) != BOOT_SIGNATURE {
        return Err(Fat32Error::NoFilesystem);
    }

    // MBR: first entry with a non-empty type and a start LBA
    for i in 0..4 {
        let entry = MBR_PARTITION_TABLE + i * MBR_ENTRY_SIZE;
        let part_type = sector0[entry + 4];
        let lba_start = read_u32(&sector0, entry + 8);
        if part_type != 0 && lba_start != 0 {
            return Ok(lba_start as u64);
        }
    }

    Err(Fat32Error::NoFilesystem)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
