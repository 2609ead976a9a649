//! Board configuration
//!
//! Every physical address and file name the boot sequence uses comes from a
//! [`BootConfig`]. [`BootConfig::lophilo`] is the layout of the shipping board:
//!
//! ```text
//! 0x2000_0100  ATAG list, command line at +44     (param region)
//! 0x2000_8000  zImage                             (kernel region)
//! 0x2200_0000  FPGA bitstream, 4 MiB              (logic region)
//! ```

use core::fmt;

use mboot_core::fs::Partition;

use crate::boot::atags::CMDLINE_DATA_OFFSET;
use crate::boot::cmdline::HWADDR_CLAUSE_LEN;
use crate::error::Artifact;

/// Bytes kept zero after the longest possible command line so the ATAG
/// list is always terminated.
pub const PARAM_TAIL_RESERVE: u32 = 4;

/// Reasons [`BootConfig::validate`] rejects a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Command line does not start right after the ATAG_CMDLINE header.
    CmdlineOffset,
    /// Param region cannot hold the tags plus the hardware address clause.
    ParamRegionTooSmall,
    /// Two staging regions share bytes.
    RegionsOverlap,
    /// A region runs past the end of the 32-bit address space.
    AddressOverflow,
}

impl ConfigError {
    pub fn description(&self) -> &'static str {
        match self {
            Self::CmdlineOffset => "command line offset must follow the ATAG_CMDLINE header",
            Self::ParamRegionTooSmall => "parameter region too small",
            Self::RegionsOverlap => "staging regions overlap",
            Self::AddressOverflow => "region exceeds the address space",
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Fixed addresses, sizes and names for one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootConfig {
    /// Where the FPGA bitstream is staged.
    pub logic_image_addr: u32,
    pub logic_image_capacity: u32,
    /// ATAG list base. The region runs up to `kernel_addr`.
    pub param_addr: u32,
    /// Kernel load address and entry point.
    pub kernel_addr: u32,
    pub kernel_capacity: u32,
    /// Byte offset of the command line inside the param region.
    pub cmdline_offset: u32,
    /// ARM Linux machine type number.
    pub machine_id: u32,
    /// Value of ATAG_REVISION.
    pub board_revision: u32,
    pub logic_image_path: &'static str,
    pub cmdline_path: &'static str,
    pub kernel_path: &'static str,
    pub partition: Partition,
}

impl BootConfig {
    /// Lophilo board layout.
    pub const fn lophilo() -> Self {
        Self {
            logic_image_addr: 0x2200_0000,
            logic_image_capacity: 4 * 1024 * 1024,
            param_addr: 0x2000_0100,
            kernel_addr: 0x2000_8000,
            kernel_capacity: 0x0200_0000 - 0x8000,
            cmdline_offset: CMDLINE_DATA_OFFSET as u32,
            machine_id: 3373,
            board_revision: 1,
            logic_image_path: "grid.rbf",
            cmdline_path: "kcmd.txt",
            kernel_path: "zImage",
            partition: Partition::Auto,
        }
    }

    /// Size of the param region, tags and command line included.
    pub fn param_region_len(&self) -> u32 {
        self.kernel_addr.saturating_sub(self.param_addr)
    }

    /// Largest `kcmd.txt` that still leaves room for the hardware address
    /// clause and a zero terminator word.
    pub fn cmdline_file_capacity(&self) -> usize {
        (self.param_region_len() as usize)
            .saturating_sub(self.cmdline_offset as usize)
            .saturating_sub(PARAM_TAIL_RESERVE as usize)
            .saturating_sub(HWADDR_CLAUSE_LEN)
    }

    pub fn path(&self, artifact: Artifact) -> &'static str {
        match artifact {
            Artifact::LogicImage => self.logic_image_path,
            Artifact::CommandLine => self.cmdline_path,
            Artifact::Kernel => self.kernel_path,
        }
    }

    /// Check the layout is one the boot sequence can use safely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cmdline_offset as usize != CMDLINE_DATA_OFFSET {
            return Err(ConfigError::CmdlineOffset);
        }

        let minimum = self.cmdline_offset + PARAM_TAIL_RESERVE + HWADDR_CLAUSE_LEN as u32;
        if self.kernel_addr <= self.param_addr || self.param_region_len() < minimum {
            return Err(ConfigError::ParamRegionTooSmall);
        }

        let logic = span(self.logic_image_addr, self.logic_image_capacity)?;
        let params = span(self.param_addr, self.param_region_len())?;
        let kernel = span(self.kernel_addr, self.kernel_capacity)?;

        if overlaps(logic, params) || overlaps(logic, kernel) || overlaps(params, kernel) {
            return Err(ConfigError::RegionsOverlap);
        }
        Ok(())
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self::lophilo()
    }
}

fn span(base: u32, len: u32) -> Result<(u64, u64), ConfigError> {
    let end = base as u64 + len as u64;
    if end > 1u64 << 32 {
        return Err(ConfigError::AddressOverflow);
    }
    Ok((base as u64, end))
}

fn overlaps(a: (u64, u64), b: (u64, u64)) -> bool {
    a.0 < b.1 && b.0 < a.1
}
