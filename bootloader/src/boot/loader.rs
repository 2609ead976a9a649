// Boot orchestrator - runs the stages in order and hands off to the kernel
//
//   identity -> clear params -> mount -> list -> logic image -> FPGA
//            -> command line -> hwaddr -> kernel -> ATAGs -> handoff
//
// Any fatal error returns before teardown; memory already written is left
// as is.

use alloc::string::String;
use core::fmt;

use log::{error, info};
use mboot_core::log_done;

use super::atags::{BootParams, CMDLINE_DATA_OFFSET};
use super::cmdline::CommandLine;
use super::handoff::{dispatch, BootTransfer, CacheControl, Handoff};
use super::identity::{identify, Identity, IdentityDevice};
use super::stager::{Medium, StorageStager};
use crate::config::{BootConfig, PARAM_TAIL_RESERVE};
use crate::error::{Artifact, BootError};
use crate::memory::BootMemory;

/// The FPGA configuration port.
pub trait LogicDevice {
    type Error: fmt::Display;

    fn configure(&mut self, image: &[u8]) -> Result<(), Self::Error>;
}

/// Everything the boot sequence drives besides memory.
pub struct Board<M, I, L, C, T> {
    pub medium: M,
    pub identity: I,
    pub logic: L,
    pub cache: C,
    pub transfer: T,
}

/// Result of a successful staging pass, ready for [`PreparedBoot::launch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreparedBoot {
    pub identity: Identity,
    pub logic_image_len: usize,
    /// Final length, hardware address clause included.
    pub cmdline_len: usize,
    pub kernel_len: usize,
    pub handoff: Handoff,
}

impl PreparedBoot {
    /// Tear down caches and MMU and jump into the staged kernel.
    ///
    /// # Safety
    /// The staged memory must not have been touched since [`prepare`].
    pub unsafe fn launch<C: CacheControl, T: BootTransfer>(self, cache: &mut C, transfer: &mut T) -> ! {
        dispatch(cache, transfer, self.handoff)
    }
}

/// Run every stage up to, not including, the handoff.
pub fn prepare<M, I, L>(
    config: &BootConfig,
    memory: &mut BootMemory<'_>,
    medium: M,
    identity_device: &mut I,
    logic: &mut L,
) -> Result<PreparedBoot, BootError>
where
    M: Medium,
    I: IdentityDevice,
    L: LogicDevice,
{
    if let Err(e) = config.validate() {
        error!("board configuration rejected: {}", e);
        return Err(BootError::InvalidConfig(e));
    }

    let identity = identify(identity_device);

    // Zero params up to the kernel; this also terminates the ATAG list
    memory.params.zero();

    let mut stager = StorageStager::mount(medium, config.partition)?;
    stager.log_tree();

    let logic_image_len = stager.stage(
        Artifact::LogicImage,
        config.logic_image_path,
        &mut memory.logic,
        0,
        config.logic_image_capacity as usize,
    )?;
    match logic.configure(&memory.logic.as_slice()[..logic_image_len]) {
        Ok(()) => log_done!("FPGA configured"),
        Err(e) => error!("FPGA configuration failed: {}", e),
    }

    let staged_len = stager.stage(
        Artifact::CommandLine,
        config.cmdline_path,
        &mut memory.params,
        CMDLINE_DATA_OFFSET,
        config.cmdline_file_capacity(),
    )?;

    let cmdline_len = {
        let room = memory
            .params
            .len()
            .saturating_sub(CMDLINE_DATA_OFFSET + PARAM_TAIL_RESERVE as usize);
        let buf = memory
            .params
            .slice_mut(CMDLINE_DATA_OFFSET, room)
            .ok_or(BootError::RegionOverflow(Artifact::CommandLine))?;
        let mut cmdline = CommandLine::new(buf, staged_len);
        cmdline
            .append_hwaddr(&identity)
            .map_err(|_| BootError::RegionOverflow(Artifact::CommandLine))?;
        info!("kernel command line: {}", String::from_utf8_lossy(cmdline.as_bytes()));
        cmdline.len()
    };

    let kernel_len = stager.stage(
        Artifact::Kernel,
        config.kernel_path,
        &mut memory.kernel,
        0,
        config.kernel_capacity as usize,
    )?;

    let params = BootParams {
        serial_low: identity.low(),
        serial_high: identity.high(),
        revision: config.board_revision,
        cmdline_len,
    };
    params
        .write_to(&mut memory.params)
        .ok_or(BootError::RegionOverflow(Artifact::CommandLine))?;
    log_done!("ATAGs written at {:#010x}", memory.params.base());

    Ok(PreparedBoot {
        identity,
        logic_image_len,
        cmdline_len,
        kernel_len,
        handoff: Handoff {
            kernel_addr: memory.kernel.base(),
            param_addr: memory.params.base(),
            machine_id: config.machine_id,
        },
    })
}

/// Stage everything and boot. Returns only if a fatal error stopped the
/// sequence before handoff.
///
/// # Safety
/// `memory` must describe the real staging regions: on success the CPU
/// jumps into `memory.kernel`.
pub unsafe fn run<M, I, L, C, T>(
    config: &BootConfig,
    mut memory: BootMemory<'_>,
    board: Board<M, I, L, C, T>,
) -> BootError
where
    M: Medium,
    I: IdentityDevice,
    L: LogicDevice,
    C: CacheControl,
    T: BootTransfer,
{
    let Board {
        medium,
        identity: mut identity_device,
        mut logic,
        mut cache,
        mut transfer,
    } = board;

    match prepare(config, &mut memory, medium, &mut identity_device, &mut logic) {
        Ok(prepared) => prepared.launch(&mut cache, &mut transfer),
        Err(e) => {
            error!("boot aborted: {}", e);
            e
        }
    }
}
