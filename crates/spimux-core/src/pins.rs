//! PIO pin descriptors
//!
//! AT91 PIO lines are addressed as a port plus a 32-bit mask, matching the
//! set/clear register layout of the PIO controller. A [`Pins`] value may name
//! several lines of one port, although chip selects normally use one.

use core::fmt;
use core::str::FromStr;

use crate::error::Error;

/// PIO port (controller instance)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Port {
    /// PIOA
    A,
    /// PIOB
    B,
    /// PIOC
    C,
}

impl Port {
    /// Index of the port (A = 0)
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
        }
    }

    const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
        }
    }
}

/// Peripheral function a PIO line can be multiplexed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum PeripheralFunction {
    /// Peripheral A
    A,
    /// Peripheral B
    B,
}

/// One or more PIO lines of a single port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "std",
    serde(try_from = "std::string::String", into = "std::string::String")
)]
pub struct Pins {
    /// Port the lines belong to
    pub port: Port,
    /// Bit mask of lines within the port
    pub mask: u32,
}

impl Pins {
    /// A single line `port`, bit `bit` (0..=31)
    pub const fn new(port: Port, bit: u8) -> Self {
        Self {
            port,
            mask: 1 << (bit & 0x1f),
        }
    }

    /// Several lines of one port
    pub const fn from_mask(port: Port, mask: u32) -> Self {
        Self { port, mask }
    }

    /// Combine with other lines of the same port
    pub const fn with(self, other: Pins) -> Self {
        Self {
            port: self.port,
            mask: self.mask | other.mask,
        }
    }

    /// True when no line is selected
    pub const fn is_empty(&self) -> bool {
        self.mask == 0
    }
}

impl fmt::Display for Pins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mask.count_ones() == 1 {
            write!(f, "P{}{}", self.port.letter(), self.mask.trailing_zeros())
        } else {
            write!(f, "P{}[{:#010x}]", self.port.letter(), self.mask)
        }
    }
}

impl FromStr for Pins {
    type Err = Error;

    /// Parse names such as `PA10` or `pb2`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() < 3 || !bytes[0].eq_ignore_ascii_case(&b'P') {
            return Err(Error::InvalidPin);
        }

        let port = match bytes[1].to_ascii_uppercase() {
            b'A' => Port::A,
            b'B' => Port::B,
            b'C' => Port::C,
            _ => return Err(Error::InvalidPin),
        };

        let bit: u8 = s[2..].parse().map_err(|_| Error::InvalidPin)?;
        if bit > 31 {
            return Err(Error::InvalidPin);
        }

        Ok(Pins::new(port, bit))
    }
}

#[cfg(feature = "std")]
impl TryFrom<std::string::String> for Pins {
    type Error = Error;

    fn try_from(s: std::string::String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(feature = "std")]
impl From<Pins> for std::string::String {
    fn from(pins: Pins) -> Self {
        use std::string::ToString;
        pins.to_string()
    }
}
