//! Single transfer command

use spimux_core::{BusConfig, SpiBus, Variant, Words};
use spimux_sim::{Responder, SimController};

use super::{create_device, print_cs_trace, SimBus};
use crate::cli::ResponderKind;
use crate::error::Result;
use crate::options::{format_hex, parse_hex, parse_options, split_options};

impl From<ResponderKind> for Responder {
    fn from(kind: ResponderKind) -> Self {
        match kind {
            ResponderKind::Loopback => Responder::Loopback,
            ResponderKind::Ones => Responder::Constant(u16::MAX),
            ResponderKind::Zeros => Responder::Constant(0),
        }
    }
}

/// Create one device and clock `hex` through it
pub fn run(
    variant: Variant,
    device: &str,
    hex: &str,
    terminate: bool,
    responder: ResponderKind,
) -> Result<()> {
    let opts = parse_options(&split_options(device))?;
    let tx = parse_hex(hex)?;

    let sim = SimController::with_responder(responder.into());
    let mut bus: SimBus = SpiBus::new(sim, BusConfig::for_variant(variant));
    let id = create_device(&mut bus, &opts)?;

    let dev = bus.device(id)?;
    println!(
        "Device {} on {} channel {}: {} bit words, {:?}, {:?}, chip select {:?}",
        id,
        variant,
        dev.channel(),
        dev.bits(),
        dev.mode(),
        dev.cs_mode(),
        dev.capability()
    );

    bus.hardware_mut().clear_events();
    let mut rx = vec![0u8; tx.len()];
    let n = bus.transfer(id, Words::Duplex(&tx, &mut rx), terminate)?;

    let cs = bus.device(id)?.cs();
    let sim = bus.hardware();
    println!("  tx: {}", format_hex(&tx[..n]));
    println!("  rx: {}", format_hex(&rx[..n]));
    println!("  register writes: {}", sim.register_writes());
    print_cs_trace(sim, cs);

    Ok(())
}
