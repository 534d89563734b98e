//! Error types for spimux-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

use crate::device::DeviceId;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Registry errors
    /// Every slot of the device pool is already in use
    PoolExhausted,
    /// Handle does not name a device created on this bus
    UnknownDevice(DeviceId),

    // Configuration errors
    /// Word width outside 8..=16 bits
    InvalidBits(u8),
    /// Channel number outside 0..=3
    InvalidChannel(u8),
    /// Requested clock speed is zero or below the slowest divisor
    InvalidSpeed(u32),
    /// Pin name could not be parsed
    InvalidPin,
    /// SPI mode number outside 0..=3
    InvalidMode(u8),
    /// Chip family name not recognised
    UnknownVariant,

    // Transfer errors
    /// Controller never reported the word as received
    Timeout {
        /// Device whose transfer was in progress
        device: DeviceId,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolExhausted => write!(f, "SPI device pool exhausted"),
            Self::UnknownDevice(id) => write!(f, "unknown SPI device {}", id),
            Self::InvalidBits(bits) => {
                write!(f, "invalid word width {} (expected 8..=16 bits)", bits)
            }
            Self::InvalidChannel(ch) => write!(f, "invalid SPI channel {} (expected 0..=3)", ch),
            Self::InvalidSpeed(hz) => write!(f, "unreachable SPI clock speed {} Hz", hz),
            Self::InvalidPin => write!(f, "invalid pin name"),
            Self::InvalidMode(mode) => write!(f, "invalid SPI mode {} (expected 0..=3)", mode),
            Self::UnknownVariant => write!(f, "unknown controller variant"),
            Self::Timeout { device } => write!(f, "SPI transfer timed out on device {}", device),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
