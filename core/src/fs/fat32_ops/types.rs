// FAT32 directory entry types

use alloc::string::String;

pub const SECTOR_SIZE: usize = 512;
pub const DIR_ENTRY_SIZE: usize = 32;
pub const ENTRIES_PER_SECTOR: usize = SECTOR_SIZE / DIR_ENTRY_SIZE;

pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;
pub const ATTR_LONG_NAME: u8 = 0x0F;

/// First byte of a deleted entry.
pub const ENTRY_DELETED: u8 = 0xE5;
/// First byte of the end-of-directory marker.
pub const ENTRY_END: u8 = 0x00;

/// FAT32 directory entry (32 bytes)
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct DirEntry {
    pub name: [u8; 11], // 8.3 filename
    pub attr: u8,       // File attributes
    pub _reserved: u8,
    pub _create_time_tenth: u8,
    pub _create_time: u16,
    pub _create_date: u16,
    pub _access_date: u16,
    pub cluster_high: u16, // High word of first cluster
    pub _modify_time: u16,
    pub _modify_date: u16,
    pub cluster_low: u16, // Low word of first cluster
    pub file_size: u32,   // File size in bytes
}

const _: () = assert!(core::mem::size_of::<DirEntry>() == DIR_ENTRY_SIZE);

impl DirEntry {
    pub fn empty() -> Self {
        Self {
            name: [0; 11],
            attr: 0,
            _reserved: 0,
            _create_time_tenth: 0,
            _create_time: 0,
            _create_date: 0,
            _access_date: 0,
            cluster_high: 0,
            _modify_time: 0,
            _modify_date: 0,
            cluster_low: 0,
            file_size: 0,
        }
    }

    pub fn is_end(&self) -> bool {
        self.name[0] == ENTRY_END
    }

    pub fn is_free(&self) -> bool {
        self.name[0] == ENTRY_END || self.name[0] == ENTRY_DELETED
    }

    /// Entries a directory listing never reports: LFN fragments, the volume
    /// label, and the `.`/`..` links.
    pub fn is_hidden_from_listing(&self) -> bool {
        self.attr & ATTR_LONG_NAME == ATTR_LONG_NAME
            || self.attr & ATTR_VOLUME_ID != 0
            || self.name[0] == b'.'
    }

    pub fn is_directory(&self) -> bool {
        self.attr & ATTR_DIRECTORY != 0
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = encode_short_name(name);
    }

    /// Render the 8.3 name as `NAME.EXT` (no padding).
    pub fn display_name(&self) -> String {
        let name = self.name;
        let base = trim_padding(&name[..8]);
        let ext = trim_padding(&name[8..]);

        let mut out = String::with_capacity(12);
        out.extend(base.iter().map(|&b| b as char));
        if !ext.is_empty() {
            out.push('.');
            out.extend(ext.iter().map(|&b| b as char));
        }
        out
    }

    pub fn first_cluster(&self) -> u32 {
        ((self.cluster_high as u32) << 16) | (self.cluster_low as u32)
    }

    pub fn set_first_cluster(&mut self, cluster: u32) {
        self.cluster_high = (cluster >> 16) as u16;
        self.cluster_low = (cluster & 0xFFFF) as u16;
    }
}

/// View a sector as its 16 directory entries.
pub fn sector_entries(sector: &[u8; SECTOR_SIZE]) -> &[DirEntry] {
    // SAFETY: DirEntry is packed (align 1), 32 bytes, and valid for any bit pattern.
    unsafe { core::slice::from_raw_parts(sector.as_ptr() as *const DirEntry, ENTRIES_PER_SECTOR) }
}

/// True if `name` fits an 8.3 short name: 1-8 base characters, at most one
/// dot, 0-3 extension characters.
pub fn is_short_name(name: &str) -> bool {
    let (base, ext) = name.split_once('.').unwrap_or((name, ""));
    !base.is_empty()
        && base.len() <= 8
        && ext.len() <= 3
        && !ext.contains('.')
        && name.bytes().all(|b| b > 0x20 && b != b'/' && b != b'\\')
}

/// Convert to 8.3 format (simple, no LFN)
fn encode_short_name(name: &str) -> [u8; 11] {
    let mut out = [0x20; 11]; // Fill with spaces

    let (basename, ext) = match name.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => (base.as_bytes(), ext.as_bytes()),
        _ => (name.as_bytes(), &b""[..]),
    };

    let base_len = basename.len().min(8);
    out[..base_len].copy_from_slice(&basename[..base_len]);

    let ext_len = ext.len().min(3);
    out[8..8 + ext_len].copy_from_slice(&ext[..ext_len]);

    out.make_ascii_uppercase();
    out
}

fn trim_padding(field: &[u8]) -> &[u8] {
    let end = field.iter().rposition(|&b| b != 0x20).map_or(0, |i| i + 1);
    &field[..end]
}
