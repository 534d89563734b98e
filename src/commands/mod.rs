//! CLI command implementations
//!
//! Every command that moves data builds an [`spimux_core::SpiBus`] on a
//! [`spimux_sim::SimController`] and reports what the simulated hardware saw.

mod list;
pub mod resolve;
pub mod script;
pub mod xfer;

pub use list::list_variants;

use spimux_core::{DeviceId, Pins, SpiBus};
use spimux_sim::{Event, SimController};

use crate::error::Result;
use crate::options::DeviceOptions;

/// Bus type used by the commands
pub type SimBus = SpiBus<SimController, 32>;

/// Create a device from parsed options, applying the settings that need a
/// live bus
pub fn create_device(bus: &mut SimBus, opts: &DeviceOptions) -> Result<DeviceId> {
    let id = bus.create(&opts.config)?;

    if let Some(hz) = opts.speed_hz {
        let achieved = bus.set_speed(id, hz)?;
        log::info!("Device {}: SPI clock {} Hz (requested {} Hz)", id, achieved, hz);
    }
    if !opts.cs_auto {
        bus.set_cs_auto(id, false)?;
    }

    Ok(id)
}

/// Print what happened on a chip-select pin since the last event clear
pub fn print_cs_trace(sim: &SimController, cs: Option<Pins>) {
    let Some(cs) = cs else {
        println!("  chip select: none");
        return;
    };

    let trace: String = sim
        .events()
        .iter()
        .filter_map(|e| match *e {
            Event::Low(pins) if pins == cs => Some('\\'),
            Event::High(pins) if pins == cs => Some('/'),
            Event::Word { .. } => Some('w'),
            _ => None,
        })
        .collect();

    println!(
        "  chip select {}: {} asserts, {} negates  {}",
        cs,
        sim.lows(cs),
        sim.highs(cs),
        trace
    );
}
