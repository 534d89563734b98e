//! Chip-select resolution command

use spimux_core::resolver::resolve;
use spimux_core::{Capability, Channel, Pins, Variant};

use crate::error::Result;

/// Print how `cs` would be driven on `channel`
pub fn run(variant: Variant, channel: u8, cs: &str) -> Result<()> {
    let channel = Channel::try_from(channel)?;
    let pins: Pins = cs.parse()?;

    match resolve(variant.profile(), channel, Some(pins)) {
        Capability::Automatic(function) => println!(
            "{} on {} channel {}: automatic (NPCS{} via peripheral {:?})",
            pins, variant, channel, channel, function
        ),
        Capability::Gpio => println!(
            "{} on {} channel {}: bit-banged GPIO (not wired to NPCS{})",
            pins, variant, channel, channel
        ),
    }

    Ok(())
}
