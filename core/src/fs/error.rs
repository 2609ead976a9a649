//! Error types for FAT32 volume access

use core::fmt;

/// Errors raised while mounting or reading a FAT32 volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fat32Error {
    /// Block device read failed.
    IoError,
    /// Neither LBA 0 nor the first MBR partition holds a FAT32 volume.
    NoFilesystem,
    /// Boot sector present but its BPB is unusable.
    InvalidBootSector,
    /// Path component not found.
    NotFound,
    /// Path names a directory where a file was expected.
    NotAFile,
    /// Path walks through a regular file.
    NotADirectory,
    /// Empty or malformed path.
    InvalidPath,
    /// Cluster chain points outside the volume or loops.
    CorruptChain,
}

impl Fat32Error {
    /// Get a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            Self::IoError => "Block device I/O error",
            Self::NoFilesystem => "No FAT32 filesystem found",
            Self::InvalidBootSector => "Invalid FAT32 boot sector",
            Self::NotFound => "File or directory not found",
            Self::NotAFile => "Path is a directory",
            Self::NotADirectory => "Path component is not a directory",
            Self::InvalidPath => "Invalid path",
            Self::CorruptChain => "Corrupt cluster chain",
        }
    }
}

impl fmt::Display for Fat32Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
