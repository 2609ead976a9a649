//! Heap Allocator - Global Allocator over a fixed buffer
//!
//! Provides `#[global_allocator]` support using `linked_list_allocator` for
//! heap management. The board has no memory map to negotiate with, so the
//! heap is a single region handed over once at startup and never grows.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    GlobalAlloc trait                     │
//! │                   (alloc/dealloc/etc)                    │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                    HeapAllocator                         │
//! │              (linked_list_allocator::Heap)               │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │              static buffer in .bss                       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! #[global_allocator]
//! static ALLOCATOR: mboot_hwinit::heap::HeapAllocator =
//!     mboot_hwinit::heap::HeapAllocator::new();
//!
//! unsafe {
//!     mboot_hwinit::heap::init_heap_with_buffer(HEAP.as_mut_ptr(), HEAP.len())?;
//! }
//! ```

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicBool, Ordering};
use spin::Mutex;

/// Smallest buffer worth turning into a heap.
pub const MIN_HEAP_SIZE: usize = 4096;

// ═══════════════════════════════════════════════════════════════════════════
// HEAP STATE
// ═══════════════════════════════════════════════════════════════════════════

struct HeapState {
    heap: linked_list_allocator::Heap,
    base: usize,
    size: usize,
}

// SAFETY: the heap only hands out pointers into its own region and is only
// touched under the mutex.
unsafe impl Send for HeapState {}

static HEAP: Mutex<Option<HeapState>> = Mutex::new(None);

/// Fast path check, set once the region is installed.
static HEAP_INITIALIZED: AtomicBool = AtomicBool::new(false);

// ═══════════════════════════════════════════════════════════════════════════
// HEAP ALLOCATOR
// ═══════════════════════════════════════════════════════════════════════════

/// Global heap allocator.
///
/// This is the type you use with `#[global_allocator]`.
pub struct HeapAllocator;

impl HeapAllocator {
    /// Create new (uninitialized) heap allocator.
    pub const fn new() -> Self {
        Self
    }
}

impl Default for HeapAllocator {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl GlobalAlloc for HeapAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if !HEAP_INITIALIZED.load(Ordering::Acquire) {
            return ptr::null_mut();
        }

        let mut guard = HEAP.lock();
        match guard.as_mut() {
            Some(state) => state
                .heap
                .allocate_first_fit(layout)
                .map_or(ptr::null_mut(), |p| p.as_ptr()),
            None => ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if ptr.is_null() || !HEAP_INITIALIZED.load(Ordering::Acquire) {
            return;
        }

        let mut guard = HEAP.lock();
        if let Some(state) = guard.as_mut() {
            if let Some(nn) = NonNull::new(ptr) {
                state.heap.deallocate(nn, layout);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// INITIALIZATION
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize heap with a pre-allocated buffer.
///
/// # Safety
/// - Buffer must be valid for `size` bytes and not used for anything else
/// - Must be called before the first allocation
pub unsafe fn init_heap_with_buffer(buffer: *mut u8, size: usize) -> Result<(), &'static str> {
    if HEAP_INITIALIZED.load(Ordering::Acquire) {
        return Err("heap already initialized");
    }

    if buffer.is_null() || size < MIN_HEAP_SIZE {
        return Err("invalid buffer");
    }

    let mut guard = HEAP.lock();
    let mut heap = linked_list_allocator::Heap::empty();
    heap.init(buffer, size);

    *guard = Some(HeapState {
        heap,
        base: buffer as usize,
        size,
    });
    HEAP_INITIALIZED.store(true, Ordering::Release);
    drop(guard);

    log::debug!(target: "mboot::heap", "heap at {:#010x}, {} bytes", buffer as usize, size);
    Ok(())
}

/// Check if heap is initialized.
pub fn is_heap_initialized() -> bool {
    HEAP_INITIALIZED.load(Ordering::Acquire)
}

/// Heap statistics: `(base, size, used, free)`.
pub fn heap_stats() -> Option<(usize, usize, usize, usize)> {
    let guard = HEAP.lock();
    guard
        .as_ref()
        .map(|state| (state.base, state.size, state.heap.used(), state.heap.free()))
}
