// Storage stager: mount the boot volume and copy files into staging regions

use gpt_disk_io::BlockIo;
use log::{debug, error, info, warn};
use mboot_core::fs::{Fat32Error, Fat32Volume, FileHandle, Partition, WalkEntry};
use mboot_core::log_done;

use crate::error::{Artifact, BootError};
use crate::memory::PhysWindow;

/// Read access to a mounted filesystem.
pub trait Volume {
    type File;

    fn open(&mut self, path: &str) -> Result<Self::File, Fat32Error>;

    /// Size in bytes recorded for `file`.
    fn file_size(&self, file: &Self::File) -> usize;

    /// Fill `dst` from the start of `file`; returns bytes copied.
    fn read(&mut self, file: &Self::File, dst: &mut [u8]) -> Result<usize, Fat32Error>;

    /// Depth-first listing from the root, one callback per entry or error.
    fn walk_root(&mut self, visit: &mut dyn FnMut(Result<WalkEntry, Fat32Error>));
}

impl<B: BlockIo> Volume for Fat32Volume<B> {
    type File = FileHandle;

    fn open(&mut self, path: &str) -> Result<FileHandle, Fat32Error> {
        Fat32Volume::open(self, path)
    }

    fn file_size(&self, file: &FileHandle) -> usize {
        file.size()
    }

    fn read(&mut self, file: &FileHandle, dst: &mut [u8]) -> Result<usize, Fat32Error> {
        Fat32Volume::read(self, file, dst)
    }

    fn walk_root(&mut self, visit: &mut dyn FnMut(Result<WalkEntry, Fat32Error>)) {
        match self.walk("/") {
            Ok(walk) => walk.for_each(visit),
            Err(e) => visit(Err(e)),
        }
    }
}

/// Storage that can be mounted once.
pub trait Medium {
    type Volume: Volume;

    fn mount(self, partition: Partition) -> Result<Self::Volume, Fat32Error>;
}

/// A block device holding a FAT32 volume.
pub struct BlockMedium<B>(pub B);

impl<B: BlockIo> Medium for BlockMedium<B> {
    type Volume = Fat32Volume<B>;

    fn mount(self, partition: Partition) -> Result<Fat32Volume<B>, Fat32Error> {
        Fat32Volume::mount(self.0, partition)
    }
}

/// Stage 1: copies boot files from the volume into memory.
pub struct StorageStager<V> {
    volume: V,
}

impl<V: Volume> StorageStager<V> {
    pub fn mount<M: Medium<Volume = V>>(medium: M, partition: Partition) -> Result<Self, BootError> {
        match medium.mount(partition) {
            Ok(volume) => {
                log_done!("boot volume mounted");
                Ok(Self { volume })
            }
            Err(e) => {
                error!("mount failed: {}", e);
                Err(BootError::MountFailure)
            }
        }
    }

    /// Open `path` and report its size.
    pub fn open_and_size(
        &mut self,
        artifact: Artifact,
        path: &str,
    ) -> Result<(V::File, usize), BootError> {
        match self.volume.open(path) {
            Ok(file) => {
                let size = self.volume.file_size(&file);
                Ok((file, size))
            }
            Err(e) => {
                error!("open {} ({}) failed: {}", path, artifact, e);
                Err(BootError::OpenFailure(artifact))
            }
        }
    }

    /// Read exactly `len` bytes of `file` into the front of `dest`.
    pub fn read_into(
        &mut self,
        artifact: Artifact,
        file: &V::File,
        len: usize,
        dest: &mut [u8],
    ) -> Result<usize, BootError> {
        let available = dest.len();
        let dest = match dest.get_mut(..len) {
            Some(dest) => dest,
            None => {
                error!("{}: {} bytes do not fit in {}", artifact, len, available);
                return Err(BootError::RegionOverflow(artifact));
            }
        };

        match self.volume.read(file, dest) {
            Ok(n) if n == len => Ok(n),
            Ok(n) => {
                error!("short read on {}: {} of {} bytes", artifact, n, len);
                Err(BootError::ReadFailure(artifact))
            }
            Err(e) => {
                error!("read {} failed: {}", artifact, e);
                Err(BootError::ReadFailure(artifact))
            }
        }
    }

    /// Open, size check and read one file into `window`, starting `offset`
    /// bytes in and using at most `capacity` bytes.
    pub fn stage(
        &mut self,
        artifact: Artifact,
        path: &str,
        window: &mut PhysWindow<'_>,
        offset: usize,
        capacity: usize,
    ) -> Result<usize, BootError> {
        let (file, size) = self.open_and_size(artifact, path)?;
        let addr = window.addr_of(offset);

        let dest = match window.slice_mut(offset, capacity) {
            Some(dest) if size <= capacity => dest,
            _ => {
                error!("{} is {} bytes, region at {:#010x} holds {}", path, size, addr, capacity);
                return Err(BootError::RegionOverflow(artifact));
            }
        };

        let n = self.read_into(artifact, &file, size, dest)?;
        log_done!("{} loaded: {} bytes at {:#010x}", path, n, addr);
        Ok(n)
    }

    /// Log the whole volume tree. Diagnostic only; errors are logged and
    /// otherwise ignored.
    pub fn log_tree(&mut self) {
        let mut entries = 0usize;
        self.volume.walk_root(&mut |item| match item {
            Ok(entry) if entry.is_dir => {
                entries += 1;
                info!("{}/", entry.path);
            }
            Ok(entry) => {
                entries += 1;
                debug!("{} ({} bytes)", entry.path, entry.size);
            }
            Err(e) => warn!("volume listing: {}", e),
        });
        info!("volume lists {} entries", entries);
    }
}
