// Global logging backend for mboot
//
// Implements `log::Log`: every record is formatted into a fixed line buffer,
// pushed to the registered byte sink (the debug UART on the board) and kept
// in a small ring of recent lines.

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicUsize, Ordering};

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::{Mutex, Once};

/// Target used for "stage finished" records.
pub const DONE_TARGET: &str = "mboot::done";

const MAX_LINE_LEN: usize = 160;
const RECENT_LINES: usize = 16;

/// Where formatted lines go. Must not log.
pub type Sink = fn(&[u8]);

/// Log a completion message.
#[macro_export]
macro_rules! log_done {
    ($($arg:tt)+) => {
        ::log::info!(target: $crate::logger::DONE_TARGET, $($arg)+)
    };
}

#[derive(Clone, Copy)]
struct Line {
    bytes: [u8; MAX_LINE_LEN],
    len: usize,
}

impl Line {
    const EMPTY: Self = Self {
        bytes: [0; MAX_LINE_LEN],
        len: 0,
    };

    fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl Write for Line {
    // Clips at MAX_LINE_LEN, never fails
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = MAX_LINE_LEN - self.len;
        let take = s.len().min(room);
        self.bytes[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

struct Ring {
    lines: [Line; RECENT_LINES],
    next: usize,
    filled: usize,
}

impl Ring {
    const fn new() -> Self {
        Self {
            lines: [Line::EMPTY; RECENT_LINES],
            next: 0,
            filled: 0,
        }
    }

    fn push(&mut self, line: &Line) {
        self.lines[self.next] = *line;
        self.next = (self.next + 1) % RECENT_LINES;
        self.filled = (self.filled + 1).min(RECENT_LINES);
    }
}

/// The board logger. One static instance, installed by [`init`].
pub struct BootLogger {
    sink: Once<Sink>,
    level: AtomicUsize,
    counts: [AtomicUsize; 5],
    recent: Mutex<Ring>,
}

static LOGGER: BootLogger = BootLogger::new();

impl BootLogger {
    const fn new() -> Self {
        Self {
            sink: Once::new(),
            level: AtomicUsize::new(LevelFilter::Info as usize),
            counts: [
                AtomicUsize::new(0),
                AtomicUsize::new(0),
                AtomicUsize::new(0),
                AtomicUsize::new(0),
                AtomicUsize::new(0),
            ],
            recent: Mutex::new(Ring::new()),
        }
    }

    fn max_level(&self) -> usize {
        self.level.load(Ordering::Relaxed)
    }
}

impl Log for BootLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() as usize <= self.max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        self.counts[record.level() as usize - 1].fetch_add(1, Ordering::Relaxed);

        let mut line = Line::EMPTY;
        let tag = if record.target() == DONE_TARGET {
            "DONE"
        } else {
            record.level().as_str()
        };
        let _ = write!(line, "[{tag} {}] {}", record.target(), record.args());
        // Keep room for the line ending even when the message was clipped
        line.len = line.len.min(MAX_LINE_LEN - 2);
        let _ = line.write_str("\r\n");

        if let Some(sink) = self.sink.get() {
            sink(line.as_bytes());
        }
        self.recent.lock().push(&line);
    }

    fn flush(&self) {}
}

/// Install the logger with `sink` as its output. Later calls fail.
pub fn init(sink: Sink, level: LevelFilter) -> Result<(), SetLoggerError> {
    LOGGER.sink.call_once(|| sink);
    LOGGER.level.store(level as usize, Ordering::Relaxed);
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// Number of records logged at `level` since boot.
pub fn count(level: Level) -> usize {
    LOGGER.counts[level as usize - 1].load(Ordering::Relaxed)
}

/// Total records logged since boot.
pub fn log_count() -> usize {
    LOGGER
        .counts
        .iter()
        .map(|c| c.load(Ordering::Relaxed))
        .sum()
}

/// Visit the most recent lines, oldest first, line endings included.
///
/// Safe to call from a panic handler: if the panic interrupted a log call
/// the ring is left alone and `false` is returned.
pub fn for_each_recent(mut f: impl FnMut(&[u8])) -> bool {
    let ring = match LOGGER.recent.try_lock() {
        Some(ring) => ring,
        None => return false,
    };
    let start = (ring.next + RECENT_LINES - ring.filled) % RECENT_LINES;
    for i in 0..ring.filled {
        f(ring.lines[(start + i) % RECENT_LINES].as_bytes());
    }
    true
}
