//! Boot sequence errors

use core::fmt;

use crate::config::ConfigError;

/// The three files staged from the boot volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// FPGA configuration bitstream.
    LogicImage,
    /// Kernel command line text.
    CommandLine,
    /// Compressed kernel image.
    Kernel,
}

impl Artifact {
    pub fn description(&self) -> &'static str {
        match self {
            Self::LogicImage => "logic image",
            Self::CommandLine => "kernel command line",
            Self::Kernel => "kernel image",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Fatal failures. Any of these ends the boot attempt before handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    /// Board configuration rejected before anything was touched.
    InvalidConfig(ConfigError),
    /// Boot volume could not be mounted.
    MountFailure,
    /// File missing or not a regular file.
    OpenFailure(Artifact),
    /// I/O error or fewer bytes than the file size.
    ReadFailure(Artifact),
    /// File larger than its staging region.
    RegionOverflow(Artifact),
}

impl BootError {
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "invalid board configuration",
            Self::MountFailure => "boot volume mount failed",
            Self::OpenFailure(_) => "open failed",
            Self::ReadFailure(_) => "read failed",
            Self::RegionOverflow(_) => "does not fit its staging region",
        }
    }
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(e) => write!(f, "{}: {}", self.description(), e),
            Self::MountFailure => f.write_str(self.description()),
            Self::OpenFailure(a) | Self::ReadFailure(a) | Self::RegionOverflow(a) => {
                write!(f, "{} {}", a, self.description())
            }
        }
    }
}
