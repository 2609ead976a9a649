// FAT32 filesystem operations - read-only volume for staging boot artifacts

mod context;
mod directory;
mod file_ops;
pub mod types;

use super::Fat32Error;
use context::Fat32Context;
use gpt_disk_io::BlockIo;

use alloc::string::String;
use alloc::vec::{self, Vec};

pub use context::Partition;
pub use directory::DirEntryInfo;

/// Directories nested deeper than this are listed but not descended into.
pub const MAX_WALK_DEPTH: usize = 16;

/// An open regular file: where its data starts and how long it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHandle {
    first_cluster: u32,
    size: u32,
}

impl FileHandle {
    /// File length in bytes, as recorded in its directory entry.
    pub fn size(&self) -> usize {
        self.size as usize
    }
}

/// A mounted FAT32 volume.
pub struct Fat32Volume<B: BlockIo> {
    block_io: B,
    partition_start: u64,
    ctx: Fat32Context,
}

impl<B: BlockIo> Fat32Volume<B> {
    /// Locate and validate the boot sector, then keep the device for reads.
    pub fn mount(mut block_io: B, partition: Partition) -> Result<Self, Fat32Error> {
        let partition_start = context::locate_volume(&mut block_io, partition)?;
        let ctx = Fat32Context::from_boot_sector(&mut block_io, partition_start)?;

        Ok(Self {
            block_io,
            partition_start,
            ctx,
        })
    }

    /// LBA of the volume's boot sector on the underlying device.
    pub fn partition_start(&self) -> u64 {
        self.partition_start
    }

    /// Open a regular file by path.
    pub fn open(&mut self, path: &str) -> Result<FileHandle, Fat32Error> {
        let entry = directory::resolve_path(
            &mut self.block_io,
            self.partition_start,
            &self.ctx,
            path,
        )?
        .ok_or(Fat32Error::NotAFile)?;

        if entry.is_dir {
            return Err(Fat32Error::NotAFile);
        }

        Ok(FileHandle {
            first_cluster: entry.first_cluster,
            size: entry.size,
        })
    }

    /// Read file data into `dst`. Returns bytes copied: `min(size, dst.len())`
    /// unless the cluster chain is shorter than the recorded size.
    pub fn read(&mut self, file: &FileHandle, dst: &mut [u8]) -> Result<usize, Fat32Error> {
        file_ops::read_file_into(
            &mut self.block_io,
            self.partition_start,
            &self.ctx,
            file.first_cluster,
            file.size(),
            dst,
        )
    }

    /// List one directory.
    pub fn read_dir(&mut self, path: &str) -> Result<Vec<DirEntryInfo>, Fat32Error> {
        let cluster = self.directory_cluster(path)?;
        directory::read_directory(&mut self.block_io, self.partition_start, &self.ctx, cluster)
    }

    /// Depth-first traversal below `path`. Every call starts a fresh walk.
    pub fn walk(&mut self, path: &str) -> Result<Walk<'_, B>, Fat32Error> {
        let cluster = self.directory_cluster(path)?;
        let prefix = String::from(path.trim_end_matches('/'));

        Ok(Walk {
            volume: self,
            stack: Vec::new(),
            pending: Some((prefix, cluster)),
        })
    }

    fn directory_cluster(&mut self, path: &str) -> Result<u32, Fat32Error> {
        match directory::resolve_path(&mut self.block_io, self.partition_start, &self.ctx, path)? {
            None => Ok(self.ctx.root_cluster),
            Some(entry) if entry.is_dir => Ok(entry.first_cluster),
            Some(_) => Err(Fat32Error::NotADirectory),
        }
    }
}

/// One item produced by [`Walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Absolute path, `/`-separated.
    pub path: String,
    pub is_dir: bool,
    pub size: u32,
}

struct Frame {
    prefix: String,
    entries: vec::IntoIter<DirEntryInfo>,
}

/// Lazy depth-first (pre-order) listing of a directory tree.
///
/// A directory is read only when the walk reaches it, so an I/O error shows up
/// as an `Err` item at that point; the walk then carries on with siblings.
pub struct Walk<'a, B: BlockIo> {
    volume: &'a mut Fat32Volume<B>,
    stack: Vec<Frame>,
    pending: Option<(String, u32)>,
}

impl<B: BlockIo> Iterator for Walk<'_, B> {
    type Item = Result<WalkEntry, Fat32Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((prefix, cluster)) = self.pending.take() {
                if self.stack.len() < MAX_WALK_DEPTH {
                    let volume = &mut *self.volume;
                    match directory::read_directory(
                        &mut volume.block_io,
                        volume.partition_start,
                        &volume.ctx,
                        cluster,
                    ) {
                        Ok(entries) => self.stack.push(Frame {
                            prefix,
                            entries: entries.into_iter(),
                        }),
                        Err(e) => return Some(Err(e)),
                    }
                }
            }

            let frame = self.stack.last_mut()?;
            let entry = match frame.entries.next() {
                Some(entry) => entry,
                None => {
                    self.stack.pop();
                    continue;
                }
            };

            let mut path = String::with_capacity(frame.prefix.len() + 1 + entry.name.len());
            path.push_str(&frame.prefix);
            path.push('/');
            path.push_str(&entry.name);

            if entry.is_dir {
                self.pending = Some((path.clone(), entry.first_cluster));
            }

            return Some(Ok(WalkEntry {
                path,
                is_dir: entry.is_dir,
                size: entry.size,
            }));
        }
    }
}
