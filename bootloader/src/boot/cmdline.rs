// Kernel command line composition
//
// The staged kcmd.txt text gets the board's Ethernet address appended as
// " hwaddr=XX:XX:XX:XX:XX:XX", built from identity bytes 7, 6, 3, 2, 1, 0.

use super::identity::Identity;

const HWADDR_PREFIX: &[u8] = b" hwaddr=";
/// Identity bytes forming the six address octets, in output order.
const HWADDR_SLOTS: [usize; 6] = [7, 6, 3, 2, 1, 0];

/// Length of the appended clause.
pub const HWADDR_CLAUSE_LEN: usize = HWADDR_PREFIX.len() + HWADDR_SLOTS.len() * 3 - 1;

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// `" hwaddr=XX:XX:XX:XX:XX:XX"` for `identity`.
pub fn hwaddr_clause(identity: &Identity) -> [u8; HWADDR_CLAUSE_LEN] {
    let bytes = identity.bytes();
    let mut clause = [b':'; HWADDR_CLAUSE_LEN];
    clause[..HWADDR_PREFIX.len()].copy_from_slice(HWADDR_PREFIX);

    for (i, &slot) in HWADDR_SLOTS.iter().enumerate() {
        let at = HWADDR_PREFIX.len() + i * 3;
        clause[at] = HEX_UPPER[(bytes[slot] >> 4) as usize];
        clause[at + 1] = HEX_UPPER[(bytes[slot] & 0xF) as usize];
    }
    clause
}

/// Not enough room left in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLineFull;

/// Staged command line text with a tracked logical length.
pub struct CommandLine<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> CommandLine<'a> {
    /// `buf[..len]` holds the staged text; the rest is room to grow.
    pub fn new(buf: &'a mut [u8], len: usize) -> Self {
        let len = len.min(buf.len());
        Self { buf, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Copy `bytes` right after the current text.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), CommandLineFull> {
        let end = self.len + bytes.len();
        if end > self.buf.len() {
            return Err(CommandLineFull);
        }
        self.buf[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    /// Append the hardware address clause. Each call appends another one.
    pub fn append_hwaddr(&mut self, identity: &Identity) -> Result<(), CommandLineFull> {
        self.append(&hwaddr_clause(identity))
    }
}
