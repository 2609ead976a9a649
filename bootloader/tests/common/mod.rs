//! Recording test doubles for the boot pipeline
//!
//! Every double appends to a shared [`Trace`] so tests can check the exact
//! order in which the pipeline touched the hardware.

#![allow(dead_code)]

#[path = "../../../core/tests/common/mod.rs"]
mod fat_image;
pub use fat_image::{Fat32ImageBuilder, MemoryBlockDevice, SECTOR};

use std::cell::RefCell;
use std::rc::Rc;

use mboot::boot::{
    BootTransfer, CacheControl, IdentityDevice, LogicDevice, Medium, RegisterRead, Volume,
};
use mboot::boot::identity::STATUS_COMPLETE;
use mboot::{BootConfig, BootMemory, PhysWindow};
use mboot_core::fs::{Fat32Error, Partition, WalkEntry};

/// Message the transfer double panics with.
pub const TRANSFER_PANIC: &str = "transferred to kernel";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    IdentityRead { zone: u8, offset: u16 },
    Mount,
    Walk,
    Open(String),
    Read(String),
    Configure(usize),
    CacheLine(u32),
    DisableDcache,
    DisableIcache,
    InvalidateIcache,
    DisableMmu,
    InvalidateTlb,
    SetParameterAddress(u32),
    SetMachineId(u32),
    Transfer(u32),
}

impl Event {
    pub fn is_cache_op(&self) -> bool {
        matches!(
            self,
            Event::CacheLine(_)
                | Event::DisableDcache
                | Event::DisableIcache
                | Event::InvalidateIcache
                | Event::DisableMmu
                | Event::InvalidateTlb
        )
    }
}

#[derive(Clone, Default)]
pub struct Trace(Rc<RefCell<Vec<Event>>>);

impl Trace {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn any(&self, f: impl Fn(&Event) -> bool) -> bool {
        self.0.borrow().iter().any(f)
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == event)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// STORAGE
// ═══════════════════════════════════════════════════════════════════════════

/// Flat in-memory volume; names compare case-insensitively like FAT 8.3.
pub struct MemoryVolume {
    files: Vec<(String, Vec<u8>)>,
    trace: Trace,
    /// Reads of this file return an I/O error.
    pub fail_read: Option<String>,
    /// Reads of this file stop halfway.
    pub short_read: Option<String>,
}

impl MemoryVolume {
    fn name(&self, file: usize) -> String {
        self.files[file].0.clone()
    }
}

impl Volume for MemoryVolume {
    type File = usize;

    fn open(&mut self, path: &str) -> Result<usize, Fat32Error> {
        let path = path.trim_start_matches('/');
        self.trace.push(Event::Open(path.to_string()));
        self.files
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(path))
            .ok_or(Fat32Error::NotFound)
    }

    fn file_size(&self, file: &usize) -> usize {
        self.files[*file].1.len()
    }

    fn read(&mut self, file: &usize, dst: &mut [u8]) -> Result<usize, Fat32Error> {
        let name = self.name(*file);
        self.trace.push(Event::Read(name.clone()));
        if self.fail_read.as_deref() == Some(name.as_str()) {
            return Err(Fat32Error::IoError);
        }

        let data = &self.files[*file].1;
        let mut n = data.len().min(dst.len());
        if self.short_read.as_deref() == Some(name.as_str()) {
            n /= 2;
        }
        dst[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }

    fn walk_root(&mut self, visit: &mut dyn FnMut(Result<WalkEntry, Fat32Error>)) {
        self.trace.push(Event::Walk);
        for (name, data) in &self.files {
            visit(Ok(WalkEntry {
                path: format!("/{}", name.to_ascii_uppercase()),
                is_dir: false,
                size: data.len() as u32,
            }));
        }
        // Listing problems must never stop the boot
        visit(Err(Fat32Error::CorruptChain));
    }
}

/// Card that mounts into a [`MemoryVolume`], or fails to mount.
pub struct MockMedium {
    pub files: Vec<(String, Vec<u8>)>,
    pub mountable: bool,
    pub fail_read: Option<String>,
    pub short_read: Option<String>,
    pub trace: Trace,
    pub partition_seen: Rc<RefCell<Option<Partition>>>,
}

impl MockMedium {
    pub fn new(trace: &Trace) -> Self {
        Self {
            files: Vec::new(),
            mountable: true,
            fail_read: None,
            short_read: None,
            trace: trace.clone(),
            partition_seen: Rc::new(RefCell::new(None)),
        }
    }

    pub fn with_file(mut self, name: &str, data: &[u8]) -> Self {
        self.files.push((name.to_string(), data.to_vec()));
        self
    }

    /// grid.rbf, kcmd.txt and zImage with recognizable contents.
    pub fn boot_card(trace: &Trace) -> Self {
        Self::new(trace)
            .with_file("grid.rbf", &logic_image())
            .with_file("kcmd.txt", CMDLINE)
            .with_file("zImage", &kernel_image())
    }
}

impl Medium for MockMedium {
    type Volume = MemoryVolume;

    fn mount(self, partition: Partition) -> Result<MemoryVolume, Fat32Error> {
        self.trace.push(Event::Mount);
        *self.partition_seen.borrow_mut() = Some(partition);
        if !self.mountable {
            return Err(Fat32Error::NoFilesystem);
        }
        Ok(MemoryVolume {
            files: self.files,
            trace: self.trace,
            fail_read: self.fail_read,
            short_read: self.short_read,
        })
    }
}

pub const CMDLINE: &[u8] = b"console=ttyS0\n";

pub fn logic_image() -> Vec<u8> {
    (0..3000u32).map(|i| (i % 251) as u8).collect()
}

pub fn kernel_image() -> Vec<u8> {
    (0..5000u32).map(|i| (i % 239) as u8 ^ 0x5A).collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// IDENTITY / FPGA
// ═══════════════════════════════════════════════════════════════════════════

/// SHA204 double. Word 0 upper half and word 2 carry the serial.
pub struct MockChip {
    pub words: [[u8; 4]; 3],
    pub status: [u8; 3],
    trace: Trace,
}

impl MockChip {
    pub fn new(trace: &Trace) -> Self {
        Self {
            words: [[0x01, 0x23, 0x11, 0x22], [0; 4], [0x33, 0x44, 0x55, 0x66]],
            status: [STATUS_COMPLETE; 3],
            trace: trace.clone(),
        }
    }

    pub fn failing_at(trace: &Trace, offset: u16) -> Self {
        let mut chip = Self::new(trace);
        chip.status[offset as usize] = 0x0F;
        chip
    }
}

impl IdentityDevice for MockChip {
    fn read_register(&mut self, zone: u8, offset: u16) -> RegisterRead {
        self.trace.push(Event::IdentityRead { zone, offset });
        RegisterRead {
            data: self.words[offset as usize],
            status: self.status[offset as usize],
        }
    }
}

pub struct MockFpga {
    pub fail: bool,
    pub received: Rc<RefCell<Vec<u8>>>,
    trace: Trace,
}

impl MockFpga {
    pub fn new(trace: &Trace) -> Self {
        Self {
            fail: false,
            received: Rc::new(RefCell::new(Vec::new())),
            trace: trace.clone(),
        }
    }
}

impl LogicDevice for MockFpga {
    type Error = &'static str;

    fn configure(&mut self, image: &[u8]) -> Result<(), &'static str> {
        self.trace.push(Event::Configure(image.len()));
        *self.received.borrow_mut() = image.to_vec();
        if self.fail {
            Err("CONF_DONE never asserted")
        } else {
            Ok(())
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CPU
// ═══════════════════════════════════════════════════════════════════════════

pub struct MockCache(pub Trace);

impl CacheControl for MockCache {
    fn clean_invalidate_dcache_line(&mut self, set_way: u32) {
        self.0.push(Event::CacheLine(set_way));
    }
    fn disable_dcache(&mut self) {
        self.0.push(Event::DisableDcache);
    }
    fn disable_icache(&mut self) {
        self.0.push(Event::DisableIcache);
    }
    fn invalidate_icache(&mut self) {
        self.0.push(Event::InvalidateIcache);
    }
    fn disable_mmu(&mut self) {
        self.0.push(Event::DisableMmu);
    }
    fn invalidate_tlb(&mut self) {
        self.0.push(Event::InvalidateTlb);
    }
}

/// Records the registers, then panics instead of jumping.
pub struct MockTransfer(pub Trace);

impl BootTransfer for MockTransfer {
    fn set_parameter_address(&mut self, addr: u32) {
        self.0.push(Event::SetParameterAddress(addr));
    }

    fn set_machine_id(&mut self, id: u32) {
        self.0.push(Event::SetMachineId(id));
    }

    unsafe fn transfer(&mut self, entry: u32) -> ! {
        self.0.push(Event::Transfer(entry));
        panic!("{} at {:#010x}", TRANSFER_PANIC, entry);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// MEMORY
// ═══════════════════════════════════════════════════════════════════════════

/// Lophilo addresses with capacities small enough for host buffers.
pub fn test_config() -> BootConfig {
    BootConfig {
        logic_image_capacity: 16 * 1024,
        kernel_capacity: 64 * 1024,
        ..BootConfig::lophilo()
    }
}

/// Host buffers standing in for the three staging regions.
pub struct Regions {
    pub logic: Vec<u8>,
    pub params: Vec<u8>,
    pub kernel: Vec<u8>,
}

impl Regions {
    /// Filled with a poison byte so untouched memory is visible.
    pub fn new(config: &BootConfig) -> Self {
        Self {
            logic: vec![0xCC; config.logic_image_capacity as usize],
            params: vec![0xCC; config.param_region_len() as usize],
            kernel: vec![0xCC; config.kernel_capacity as usize],
        }
    }

    pub fn memory(&mut self, config: &BootConfig) -> BootMemory<'_> {
        BootMemory {
            logic: PhysWindow::new(config.logic_image_addr, &mut self.logic),
            params: PhysWindow::new(config.param_addr, &mut self.params),
            kernel: PhysWindow::new(config.kernel_addr, &mut self.kernel),
        }
    }

    /// Param region word `index`.
    pub fn param_word(&self, index: usize) -> u32 {
        let at = index * 4;
        u32::from_le_bytes([
            self.params[at],
            self.params[at + 1],
            self.params[at + 2],
            self.params[at + 3],
        ])
    }
}
