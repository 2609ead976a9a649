// FAT32 directory operations

use super::super::Fat32Error;
use super::context::Fat32Context;
use super::types::{is_short_name, sector_entries, DirEntry, SECTOR_SIZE};
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

use alloc::string::String;
use alloc::vec::Vec;

/// A directory entry as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    /// `NAME.EXT` as stored on the volume.
    pub name: String,
    pub is_dir: bool,
    pub size: u32,
    pub first_cluster: u32,
}

/// Read every visible entry of the directory starting at `cluster`.
pub fn read_directory<B: BlockIo>(
    block_io: &mut B,
    partition_start: u64,
    ctx: &Fat32Context,
    cluster: u32,
) -> Result<Vec<DirEntryInfo>, Fat32Error> {
    if !ctx.is_valid_cluster(cluster) {
        return Err(Fat32Error::CorruptChain);
    }

    let mut found = Vec::new();
    let mut current = cluster;
    let mut links = 0u32;

    loop {
        let sector = ctx.cluster_to_sector(current);
        for sec_offset in 0..ctx.sectors_per_cluster {
            let mut sector_data = [0u8; SECTOR_SIZE];
            block_io
                .read_blocks(
                    Lba(partition_start + sector as u64 + sec_offset as u64),
                    &mut sector_data,
                )
                .map_err(|_| Fat32Error::IoError)?;

            for entry in sector_entries(&sector_data) {
                if entry.is_end() {
                    return Ok(found);
                }
                if entry.is_free() || entry.is_hidden_from_listing() {
                    continue;
                }
                found.push(DirEntryInfo {
                    name: entry.display_name(),
                    is_dir: entry.is_directory(),
                    size: entry.file_size,
                    first_cluster: entry.first_cluster(),
                });
            }
        }

        links += 1;
        if links > ctx.cluster_count {
            return Err(Fat32Error::CorruptChain);
        }
        current = match ctx.next_cluster(block_io, partition_start, current)? {
            Some(next) => next,
            None => return Ok(found),
        };
    }
}

/// Resolve a `/`-separated path to its directory entry.
///
/// Returns `None` for the root directory itself, which has no entry.
pub fn resolve_path<B: BlockIo>(
    block_io: &mut B,
    partition_start: u64,
    ctx: &Fat32Context,
    path: &str,
) -> Result<Option<DirEntryInfo>, Fat32Error> {
    let mut current_cluster = ctx.root_cluster;
    let mut resolved = None;

    for part in path.split('/').filter(|p| !p.is_empty()) {
        if let Some(DirEntryInfo { is_dir: false, .. }) = resolved {
            return Err(Fat32Error::NotADirectory);
        }

        if !is_short_name(part) {
            return Err(Fat32Error::InvalidPath);
        }

        let mut probe = DirEntry::empty();
        probe.set_name(part);
        let wanted = probe.display_name();

        let entry = read_directory(block_io, partition_start, ctx, current_cluster)?
            .into_iter()
            .find(|e| e.name == wanted)
            .ok_or(Fat32Error::NotFound)?;

        current_cluster = entry.first_cluster;
        resolved = Some(entry);
    }

    Ok(resolved)
}
