//! Chip-select capability resolution
//!
//! Only a few pins are electrically wired to a channel's NPCS output. For
//! those, the controller can drive chip select itself; for anything else the
//! driver bit-bangs the pin. Resolution is a lookup in the variant's route
//! table, done once when a device is created.
//!
//! A pin that is not in the table silently falls back to [`Capability::Gpio`].
//! This is never reported as an error.

use crate::device::Channel;
use crate::hal::Pio;
use crate::pins::{PeripheralFunction, Pins};
use crate::variant::ControllerProfile;

/// How a device's chip select is driven
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Capability {
    /// Controller drives NPCS through the given peripheral function
    Automatic(PeripheralFunction),
    /// Driver bit-bangs a PIO output
    #[default]
    Gpio,
}

/// Look up whether `pins` can carry `channel`'s automatic chip select
pub fn resolve(profile: &ControllerProfile, channel: Channel, pins: Option<Pins>) -> Capability {
    let Some(pins) = pins else {
        return Capability::Gpio;
    };

    profile
        .cs_routes
        .iter()
        .find(|route| route.channel == channel && route.pin == pins)
        .map_or(Capability::Gpio, |route| {
            Capability::Automatic(route.function)
        })
}

/// Hand a resolved chip-select pin to the controller
///
/// Does nothing for [`Capability::Gpio`].
pub fn route<P: Pio + ?Sized>(pio: &mut P, pins: Pins, capability: Capability) {
    if let Capability::Automatic(function) = capability {
        pio.configure_peripheral(pins, function);
    }
}

/// Take a chip-select pin back from the controller as a plain output
pub fn unroute<P: Pio + ?Sized>(pio: &mut P, pins: Pins, high: bool) {
    pio.configure_output(pins, high);
}
