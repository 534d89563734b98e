//! Hardware variants
//!
//! Each supported chip family is described by a static [`ControllerProfile`]:
//! the SPI peripheral id used for clock gating, the bus pins and the table of
//! pins wired to each channel's NPCS output. Selecting a family is a matter of
//! picking the profile, there is no per-family code.

use core::fmt;
use core::str::FromStr;

use crate::device::Channel;
use crate::device::Channel as C;
use crate::error::Error;
use crate::pins::PeripheralFunction::{A as FA, B as FB};
use crate::pins::{PeripheralFunction, Pins, Port};

/// A pin that can carry a channel's automatic chip select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsRoute {
    /// Channel whose NPCS signal is available on the pin
    pub channel: Channel,
    /// The pin
    pub pin: Pins,
    /// Peripheral function selecting NPCS on that pin
    pub function: PeripheralFunction,
}

impl CsRoute {
    const fn new(channel: Channel, port: Port, bit: u8, function: PeripheralFunction) -> Self {
        Self {
            channel,
            pin: Pins::new(port, bit),
            function,
        }
    }
}

/// Static description of one SPI controller
#[derive(Debug)]
pub struct ControllerProfile {
    /// Human readable name
    pub name: &'static str,
    /// Peripheral id for clock gating
    pub peripheral_id: u8,
    /// MISO pin
    pub miso: Pins,
    /// MOSI pin
    pub mosi: Pins,
    /// SPCK pin
    pub spck: Pins,
    /// Peripheral function of the bus pins
    pub bus_function: PeripheralFunction,
    /// Pins that can carry automatic chip select
    pub cs_routes: &'static [CsRoute],
}

impl ControllerProfile {
    /// MISO, MOSI and SPCK together
    pub const fn bus_pins(&self) -> Pins {
        self.miso.with(self.mosi).with(self.spck)
    }
}

// AT91SAM7S: MISO PA12(A), MOSI PA13(A), SPCK PA14(A)
const SAM7S_CS_ROUTES: &[CsRoute] = &[
    CsRoute::new(C::CH0, Port::A, 11, FA),
    CsRoute::new(C::CH1, Port::A, 9, FB),
    CsRoute::new(C::CH1, Port::A, 31, FA),
    CsRoute::new(C::CH2, Port::A, 10, FB),
    CsRoute::new(C::CH2, Port::A, 30, FB),
    CsRoute::new(C::CH3, Port::A, 3, FB),
    CsRoute::new(C::CH3, Port::A, 5, FB),
    CsRoute::new(C::CH3, Port::A, 22, FB),
];

// SAM4S adds NPCS1 on PB14 and NPCS2 on PB2 (100 pin parts)
const SAM4S_CS_ROUTES: &[CsRoute] = &[
    CsRoute::new(C::CH0, Port::A, 11, FA),
    CsRoute::new(C::CH1, Port::A, 9, FB),
    CsRoute::new(C::CH1, Port::A, 31, FA),
    CsRoute::new(C::CH1, Port::B, 14, FA),
    CsRoute::new(C::CH2, Port::A, 10, FB),
    CsRoute::new(C::CH2, Port::A, 30, FB),
    CsRoute::new(C::CH2, Port::B, 2, FB),
    CsRoute::new(C::CH3, Port::A, 3, FB),
    CsRoute::new(C::CH3, Port::A, 5, FB),
    CsRoute::new(C::CH3, Port::A, 22, FB),
];

/// AT91SAM7S SPI controller
pub static SAM7S: ControllerProfile = ControllerProfile {
    name: "AT91SAM7S",
    peripheral_id: 5,
    miso: Pins::new(Port::A, 12),
    mosi: Pins::new(Port::A, 13),
    spck: Pins::new(Port::A, 14),
    bus_function: PeripheralFunction::A,
    cs_routes: SAM7S_CS_ROUTES,
};

/// SAM4S SPI controller
pub static SAM4S: ControllerProfile = ControllerProfile {
    name: "SAM4S",
    peripheral_id: 21,
    miso: Pins::new(Port::A, 12),
    mosi: Pins::new(Port::A, 13),
    spck: Pins::new(Port::A, 14),
    bus_function: PeripheralFunction::A,
    cs_routes: SAM4S_CS_ROUTES,
};

/// Chip family tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum Variant {
    /// AT91SAM7S (ARM7TDMI)
    #[default]
    Sam7s,
    /// SAM4S (Cortex-M4)
    Sam4s,
}

impl Variant {
    /// Every supported variant
    pub const ALL: &'static [Variant] = &[Variant::Sam7s, Variant::Sam4s];

    /// Controller description for this variant
    pub fn profile(self) -> &'static ControllerProfile {
        match self {
            Self::Sam7s => &SAM7S,
            Self::Sam4s => &SAM4S,
        }
    }

    /// Short lowercase name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sam7s => "sam7s",
            Self::Sam4s => "sam4s",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .iter()
            .copied()
            .find(|v| v.name().eq_ignore_ascii_case(s))
            .ok_or(Error::UnknownVariant)
    }
}
