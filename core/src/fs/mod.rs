// Filesystem operations

mod error;
pub mod fat32_ops;

pub use error::Fat32Error;
pub use fat32_ops::{DirEntryInfo, Fat32Volume, FileHandle, Partition, Walk, WalkEntry};
