// Hardware identity from the SHA204 secure-identity chip
//
// The chip's configuration zone carries a unique serial. Two 4-byte reads
// give six serial bytes; the last two identity bytes are fixed.

use core::fmt;

use log::{error, info};

/// SHA204 configuration zone.
pub const ZONE_CONFIG: u8 = 0;
/// Status byte the chip reports for a completed command.
pub const STATUS_COMPLETE: u8 = 0x00;

/// Fixed identity bytes in slots 6 and 7.
pub const IDENTITY_TAIL: [u8; 2] = [0x68, 0xEA];

/// Reads in order: (word offset, response range, identity slots).
const READS: [(u16, usize, usize, usize); 2] = [
    // serial bytes 2..6 from the whole first word
    (2, 0, 2, 4),
    // serial bytes 0..2 from the upper half of word 0
    (0, 2, 0, 2),
];

/// One Read command's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterRead {
    pub data: [u8; 4],
    pub status: u8,
}

/// The secure-identity device, reduced to the one command the stager uses.
pub trait IdentityDevice {
    fn read_register(&mut self, zone: u8, offset: u16) -> RegisterRead;
}

/// A read did not complete. Never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    ReadIncomplete { offset: u16, status: u8 },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadIncomplete { offset, status } => {
                write!(f, "read at word {} returned status {:#04x}", offset, status)
            }
        }
    }
}

/// The 8-byte per-unit hardware identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Identity {
    bytes: [u8; 8],
    valid: bool,
}

impl Identity {
    /// All-zero identity used when the chip cannot be read.
    pub const UNKNOWN: Self = Self {
        bytes: [0; 8],
        valid: false,
    };

    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self { bytes, valid: true }
    }

    pub fn bytes(&self) -> [u8; 8] {
        self.bytes
    }

    /// False for [`Identity::UNKNOWN`].
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Bytes 0..4, little-endian. First word of ATAG_SERIAL.
    pub fn low(&self) -> u32 {
        u32::from_le_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]])
    }

    /// Bytes 4..8, little-endian. Second word of ATAG_SERIAL.
    pub fn high(&self) -> u32 {
        u32::from_le_bytes([self.bytes[4], self.bytes[5], self.bytes[6], self.bytes[7]])
    }
}

/// Most significant byte first: `EA:68:b5:b4:b3:b2:b1:b0`.
impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.bytes.iter().rev().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

/// Read the identity, failing on the first incomplete read.
pub fn read_identity<D: IdentityDevice>(device: &mut D) -> Result<Identity, IdentityError> {
    let mut bytes = [0u8; 8];
    bytes[6..].copy_from_slice(&IDENTITY_TAIL);

    for (offset, from, slot, len) in READS {
        let read = device.read_register(ZONE_CONFIG, offset);
        if read.status != STATUS_COMPLETE {
            return Err(IdentityError::ReadIncomplete {
                offset,
                status: read.status,
            });
        }
        bytes[slot..slot + len].copy_from_slice(&read.data[from..from + len]);
    }

    Ok(Identity::from_bytes(bytes))
}

/// Read and log the identity. A failed read yields [`Identity::UNKNOWN`].
pub fn identify<D: IdentityDevice>(device: &mut D) -> Identity {
    match read_identity(device) {
        Ok(identity) => {
            info!("ATAG_SERIAL/Hardware UUID: {}", identity);
            identity
        }
        Err(e) => {
            error!("hardware identity unavailable, using zero: {}", e);
            Identity::UNKNOWN
        }
    }
}
