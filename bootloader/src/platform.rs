//! Board entry point.
//!
//! Binds the pipeline traits to the real hardware and exports `mboot()`,
//! which the board's first-stage code calls once DRAM and clocks are up.
//!
//! # Architecture
//!
//! ```text
//! first-stage loader (C)
//!     │
//!     └── mboot() ──────────────────────────────────────────┐
//!                                                           │
//!         ┌─────────────────────────────────────────────────┘
//!         ▼
//!         ├── logger -> DBGU
//!         ├── heap over a static buffer
//!         │
//!         └── boot::run()
//!             ├── SHA204   -> Sha204Chip
//!             ├── SD card  -> SdMedium
//!             ├── FPGA     -> FpgaPort
//!             ├── CP15     -> Cp15
//!             └── bx zImage (never returns)
//! ```
//!
//! `mboot()` returns to its caller only when the boot sequence aborted.

use core::fmt::{self, Write};
use core::panic::PanicInfo;

use log::{error, LevelFilter};
use mboot_core::fs::{Fat32Error, Fat32Volume, Partition};
use mboot_core::logger;
use mboot_hwinit::board::{self, BspError, SdCard};
use mboot_hwinit::cpu::cp15;
use mboot_hwinit::{heap, serial, Bootm, HeapAllocator};

use crate::boot::{run, Board, BootTransfer, CacheControl, IdentityDevice, LogicDevice, Medium, RegisterRead};
use crate::config::BootConfig;
use crate::memory::BootMemory;

const HEAP_SIZE: usize = 256 * 1024;

#[global_allocator]
static ALLOCATOR: HeapAllocator = HeapAllocator::new();

static mut HEAP_SPACE: [u8; HEAP_SIZE] = [0; HEAP_SIZE];

// ═══════════════════════════════════════════════════════════════════════════
// HARDWARE BINDINGS
// ═══════════════════════════════════════════════════════════════════════════

/// SD card, brought up on mount.
struct SdMedium;

impl Medium for SdMedium {
    type Volume = Fat32Volume<SdCard>;

    fn mount(self, partition: Partition) -> Result<Self::Volume, Fat32Error> {
        let card = SdCard::init().map_err(|e| {
            error!("SD card init failed: {}", e);
            Fat32Error::IoError
        })?;
        Fat32Volume::mount(card, partition)
    }
}

struct Sha204Chip;

impl IdentityDevice for Sha204Chip {
    fn read_register(&mut self, zone: u8, offset: u16) -> RegisterRead {
        let (data, status) = board::sha204_read(zone, offset);
        RegisterRead { data, status }
    }
}

struct FpgaPort;

impl LogicDevice for FpgaPort {
    type Error = BspError;

    fn configure(&mut self, image: &[u8]) -> Result<(), BspError> {
        board::fpga_configure(image)
    }
}

struct Cp15;

impl CacheControl for Cp15 {
    fn clean_invalidate_dcache_line(&mut self, set_way: u32) {
        unsafe { cp15::clean_invalidate_dcache_setway(set_way) }
    }

    fn disable_dcache(&mut self) {
        unsafe { cp15::disable_dcache() }
    }

    fn disable_icache(&mut self) {
        unsafe { cp15::disable_icache() }
    }

    fn invalidate_icache(&mut self) {
        unsafe { cp15::invalidate_icache() }
    }

    fn disable_mmu(&mut self) {
        unsafe { cp15::disable_mmu() }
    }

    fn invalidate_tlb(&mut self) {
        unsafe { cp15::invalidate_tlb() }
    }
}

impl BootTransfer for Bootm {
    fn set_parameter_address(&mut self, addr: u32) {
        self.set_param_addr(addr);
    }

    fn set_machine_id(&mut self, id: u32) {
        Bootm::set_machine_id(self, id);
    }

    unsafe fn transfer(&mut self, entry: u32) -> ! {
        self.run(entry)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ENTRY
// ═══════════════════════════════════════════════════════════════════════════

/// Stage the FPGA image and kernel from SD and boot Linux.
#[no_mangle]
pub extern "C" fn mboot() {
    // A second init only happens if the caller retries; keep the first logger
    let _ = logger::init(serial::write_bytes, LevelFilter::Debug);

    if !heap::is_heap_initialized() {
        // SAFETY: HEAP_SPACE is used for nothing else.
        let space = unsafe { core::ptr::addr_of_mut!(HEAP_SPACE) as *mut u8 };
        if let Err(e) = unsafe { heap::init_heap_with_buffer(space, HEAP_SIZE) } {
            error!("heap init failed: {}", e);
            return;
        }
    }

    let config = BootConfig::lophilo();

    let board = Board {
        medium: SdMedium,
        identity: Sha204Chip,
        logic: FpgaPort,
        cache: Cp15,
        transfer: Bootm::new(),
    };

    // SAFETY: the Lophilo layout is disjoint free DRAM on this board,
    // identity mapped while the MMU is still on. `run` validates it before
    // touching any region.
    unsafe {
        let memory = BootMemory::from_config(&config);
        run(&config, memory, board);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PANIC
// ═══════════════════════════════════════════════════════════════════════════

struct Dbgu;

impl Write for Dbgu {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        serial::puts(s);
        Ok(())
    }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    // Straight to the UART; the logger may be what panicked
    let _ = write!(Dbgu, "\r\n[PANIC] {}\r\n", info);
    serial::puts("[PANIC] last log lines:\r\n");
    logger::for_each_recent(serial::write_bytes);
    loop {
        core::hint::spin_loop();
    }
}
