use crate::common::{MemoryBlockDevice, SECTOR};
use mboot_core::fs::fat32_ops::types::{ATTR_ARCHIVE, ATTR_DIRECTORY, ATTR_LONG_NAME, ATTR_VOLUME_ID};

const RESERVED_SECTORS: u32 = 32;
const END_OF_CHAIN: u32 = 0x0FFF_FFFF;

enum Node {
    File { name: String, data: Vec<u8> },
    Deleted { name: String },
    Dir { name: String, children: Vec<Node> },
}

/// Lays out a small single-FAT FAT32 volume in memory.
///
/// Cluster allocation is sequential: the root directory first, then every
/// node depth-first in insertion order.
pub struct Fat32ImageBuilder {
    total_sectors: u32,
    sectors_per_cluster: u32,
    mbr_start: Option<u32>,
    root: Vec<Node>,
    stack: Vec<(String, Vec<Node>)>,
}

#[allow(dead_code)]
impl Fat32ImageBuilder {
    pub fn new() -> Self {
        Self {
            total_sectors: 4096,
            sectors_per_cluster: 1,
            mbr_start: None,
            root: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub fn sectors_per_cluster(mut self, spc: u32) -> Self {
        self.sectors_per_cluster = spc;
        self
    }

    pub fn total_sectors(mut self, sectors: u32) -> Self {
        self.total_sectors = sectors;
        self
    }

    /// Put an MBR at LBA 0 and the volume at `start_lba`.
    pub fn with_mbr(mut self, start_lba: u32) -> Self {
        self.mbr_start = Some(start_lba);
        self
    }

    pub fn file(mut self, name: &str, data: &[u8]) -> Self {
        self.current().push(Node::File {
            name: name.to_string(),
            data: data.to_vec(),
        });
        self
    }

    pub fn deleted(mut self, name: &str) -> Self {
        self.current().push(Node::Deleted {
            name: name.to_string(),
        });
        self
    }

    /// Open a subdirectory; following nodes go inside it until `end_dir`.
    pub fn dir(mut self, name: &str) -> Self {
        self.stack.push((name.to_string(), Vec::new()));
        self
    }

    pub fn end_dir(mut self) -> Self {
        let (name, children) = self.stack.pop().expect("end_dir without dir");
        self.current().push(Node::Dir { name, children });
        self
    }

    fn current(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some((_, children)) => children,
            None => &mut self.root,
        }
    }

    pub fn cluster_size(&self) -> usize {
        self.sectors_per_cluster as usize * SECTOR
    }

    fn fat_size(&self) -> u32 {
        (self.total_sectors * 4 + SECTOR as u32 - 1) / SECTOR as u32
    }

    fn data_start(&self) -> u32 {
        RESERVED_SECTORS + self.fat_size()
    }

    fn volume_start(&self) -> usize {
        self.mbr_start.unwrap_or(0) as usize * SECTOR
    }

    /// Byte offset of the root directory (cluster 2) in the built image.
    pub fn root_dir_offset(&self) -> usize {
        self.volume_start() + self.data_start() as usize * SECTOR
    }

    /// Byte offset of the FAT slot for `cluster` in the built image.
    pub fn fat_entry_offset(&self, cluster: u32) -> usize {
        self.volume_start() + RESERVED_SECTORS as usize * SECTOR + cluster as usize * 4
    }

    pub fn build(mut self) -> MemoryBlockDevice {
        assert!(self.stack.is_empty(), "unclosed dir");

        let volume_start = self.volume_start();
        let mut image = vec![0u8; volume_start + self.total_sectors as usize * SECTOR];
        let root = std::mem::take(&mut self.root);

        let mut layout = Layout {
            image: &mut image,
            volume_start,
            data_start: self.data_start(),
            spc: self.sectors_per_cluster,
            next_cluster: 2,
            fat_offset: volume_start + RESERVED_SECTORS as usize * SECTOR,
        };

        layout.set_fat(0, 0x0FFF_FFF8);
        layout.set_fat(1, END_OF_CHAIN);
        let root_cluster = layout.write_directory(&root, None);
        assert_eq!(root_cluster, 2);

        self.write_boot_sector(&mut image[volume_start..volume_start + SECTOR]);
        if let Some(start) = self.mbr_start {
            write_mbr(&mut image[..SECTOR], start, self.total_sectors);
        }

        MemoryBlockDevice::new(image)
    }

    fn write_boot_sector(&self, bs: &mut [u8]) {
        bs[0..3].copy_from_slice(&[0xEB, 0x58, 0x90]);
        bs[3..11].copy_from_slice(b"MBOOTTST");
        bs[0x0B..0x0D].copy_from_slice(&(SECTOR as u16).to_le_bytes());
        bs[0x0D] = self.sectors_per_cluster as u8;
        bs[0x0E..0x10].copy_from_slice(&(RESERVED_SECTORS as u16).to_le_bytes());
        bs[0x10] = 1; // one FAT
        bs[0x15] = 0xF8;
        bs[0x1C..0x20].copy_from_slice(&self.mbr_start.unwrap_or(0).to_le_bytes());
        bs[0x20..0x24].copy_from_slice(&self.total_sectors.to_le_bytes());
        bs[0x24..0x28].copy_from_slice(&self.fat_size().to_le_bytes());
        bs[0x2C..0x30].copy_from_slice(&2u32.to_le_bytes());
        bs[0x42] = 0x29;
        bs[0x52..0x5A].copy_from_slice(b"FAT32   ");
        bs[0x1FE] = 0x55;
        bs[0x1FF] = 0xAA;
    }
}

fn write_mbr(mbr: &mut [u8], start: u32, sectors: u32) {
    let entry = 0x1BE;
    mbr[entry] = 0x80;
    mbr[entry + 4] = 0x0C; // FAT32 LBA
    mbr[entry + 8..entry + 12].copy_from_slice(&start.to_le_bytes());
    mbr[entry + 12..entry + 16].copy_from_slice(&sectors.to_le_bytes());
    mbr[0x1FE] = 0x55;
    mbr[0x1FF] = 0xAA;
}

struct Layout<'a> {
    image: &'a mut Vec<u8>,
    volume_start: usize,
    data_start: u32,
    spc: u32,
    next_cluster: u32,
    fat_offset: usize,
}

impl Layout<'_> {
    fn cluster_bytes(&self) -> usize {
        self.spc as usize * SECTOR
    }

    fn set_fat(&mut self, cluster: u32, value: u32) {
        let off = self.fat_offset + cluster as usize * 4;
        self.image[off..off + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn cluster_offset(&self, cluster: u32) -> usize {
        self.volume_start + (self.data_start + (cluster - 2) * self.spc) as usize * SECTOR
    }

    /// Allocate and chain enough clusters for `len` bytes; 0 for empty data.
    fn allocate(&mut self, len: usize) -> Vec<u32> {
        let count = (len + self.cluster_bytes() - 1) / self.cluster_bytes();
        let clusters: Vec<u32> = (0..count as u32).map(|i| self.next_cluster + i).collect();
        self.next_cluster += count as u32;
        for pair in clusters.windows(2) {
            self.set_fat(pair[0], pair[1]);
        }
        if let Some(&last) = clusters.last() {
            self.set_fat(last, END_OF_CHAIN);
        }
        clusters
    }

    fn write_data(&mut self, clusters: &[u32], data: &[u8]) {
        let step = self.cluster_bytes();
        for (i, chunk) in data.chunks(step).enumerate() {
            let off = self.cluster_offset(clusters[i]);
            self.image[off..off + chunk.len()].copy_from_slice(chunk);
        }
    }

    /// Returns the directory's first cluster.
    fn write_directory(&mut self, nodes: &[Node], parent: Option<u32>) -> u32 {
        let mut entries: Vec<[u8; 32]> = Vec::new();
        let is_root = parent.is_none();

        // Reserve our own clusters before children so the root lands on 2
        let own_len = (directory_entry_count(nodes, is_root) * 32).max(1);
        let own = self.allocate(own_len);
        let first = own[0];

        if let Some(parent) = parent {
            entries.push(raw_entry(b".          ", ATTR_DIRECTORY, first, 0));
            entries.push(raw_entry(b"..         ", ATTR_DIRECTORY, parent, 0));
        } else {
            entries.push(raw_entry(b"MBOOT TEST ", ATTR_VOLUME_ID, 0, 0));
        }

        for node in nodes {
            match node {
                Node::File { name, data } => {
                    let clusters = self.allocate(data.len());
                    self.write_data(&clusters, data);
                    let cluster = clusters.first().copied().unwrap_or(0);
                    entries.push(lfn_noise());
                    entries.push(raw_entry(&short_name(name), ATTR_ARCHIVE, cluster, data.len() as u32));
                }
                Node::Deleted { name } => {
                    let mut raw = short_name(name);
                    raw[0] = 0xE5;
                    entries.push(raw_entry(&raw, ATTR_ARCHIVE, 0, 0));
                }
                Node::Dir { name, children } => {
                    let cluster = self.write_directory(children, Some(if is_root { 0 } else { first }));
                    entries.push(raw_entry(&short_name(name), ATTR_DIRECTORY, cluster, 0));
                }
            }
        }

        let bytes: Vec<u8> = entries.concat();
        self.write_data(&own, &bytes);
        first
    }
}

fn directory_entry_count(nodes: &[Node], is_root: bool) -> usize {
    let fixed = if is_root { 1 } else { 2 };
    fixed
        + nodes
            .iter()
            .map(|n| match n {
                Node::File { .. } => 2,
                _ => 1,
            })
            .sum::<usize>()
}

fn raw_entry(name: &[u8; 11], attr: u8, cluster: u32, size: u32) -> [u8; 32] {
    let mut e = [0u8; 32];
    e[..11].copy_from_slice(name);
    e[11] = attr;
    e[20..22].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
    e[26..28].copy_from_slice(&(cluster as u16).to_le_bytes());
    e[28..32].copy_from_slice(&size.to_le_bytes());
    e
}

fn lfn_noise() -> [u8; 32] {
    let mut e = [0u8; 32];
    e[0] = 0x41;
    e[1..11].copy_from_slice(b"l\0o\0n\0g\0.\0");
    e[11] = ATTR_LONG_NAME;
    e
}

fn short_name(name: &str) -> [u8; 11] {
    let mut out = [b' '; 11];
    let (base, ext) = name.rsplit_once('.').unwrap_or((name, ""));
    for (i, b) in base.bytes().take(8).enumerate() {
        out[i] = b.to_ascii_uppercase();
    }
    for (i, b) in ext.bytes().take(3).enumerate() {
        out[8 + i] = b.to_ascii_uppercase();
    }
    out
}
