//! Bus file command
//!
//! Runs the devices and transfers described in a TOML file:
//!
//! ```toml
//! [bus]
//! variant = "sam7s"
//! poll = { spins = 10000 }
//!
//! [[device]]
//! name = "flash"
//! channel = 0
//! cs = "PA11"
//! cs_mode = "frame"
//! speed_khz = 12000
//!
//! [[transfer]]
//! device = "flash"
//! tx = "9f 00 00 00"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use spimux_core::{BusConfig, DeviceConfig, PollBound, SpiBus, Variant, Words};
use spimux_sim::SimController;

use super::{create_device, print_cs_trace, SimBus};
use crate::error::{CliError, Result};
use crate::options::{format_hex, parse_hex, DeviceOptions};

/// Bus file structure
#[derive(Debug, Deserialize)]
struct BusFile {
    #[serde(default)]
    bus: BusSection,
    #[serde(default, rename = "device")]
    devices: Vec<DeviceEntry>,
    #[serde(default, rename = "transfer")]
    transfers: Vec<TransferEntry>,
}

/// Bus-wide settings
#[derive(Debug, Default, Deserialize)]
struct BusSection {
    #[serde(default)]
    variant: Variant,
    mck_hz: Option<u32>,
    #[serde(default)]
    poll: PollBound,
}

/// Device definition
#[derive(Debug, Deserialize)]
struct DeviceEntry {
    name: String,
    #[serde(flatten)]
    config: DeviceConfig,
    speed_khz: Option<u32>,
    #[serde(default = "default_cs_auto")]
    cs_auto: bool,
}

fn default_cs_auto() -> bool {
    true
}

/// Transfer definition
#[derive(Debug, Deserialize)]
struct TransferEntry {
    device: String,
    tx: String,
    #[serde(default = "default_terminate")]
    terminate: bool,
}

fn default_terminate() -> bool {
    true
}

impl BusSection {
    fn config(&self) -> BusConfig {
        let config = BusConfig::for_variant(self.variant).with_poll(self.poll);
        match self.mck_hz {
            Some(mck_hz) => config.with_mck_hz(mck_hz),
            None => config,
        }
    }
}

impl DeviceEntry {
    fn options(&self) -> Result<DeviceOptions> {
        let speed_hz = self
            .speed_khz
            .map(|khz| {
                khz.checked_mul(1000).ok_or_else(|| {
                    CliError::option("speed_khz", &khz.to_string(), "too fast")
                })
            })
            .transpose()?;

        Ok(DeviceOptions {
            config: self.config,
            speed_hz,
            cs_auto: self.cs_auto,
        })
    }
}

fn parse_bus_file(content: &str) -> Result<BusFile> {
    Ok(toml::from_str(content)?)
}

/// Load and run a bus file
pub fn run(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path).map_err(|source| CliError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let file = parse_bus_file(&content)?;

    let config = file.bus.config();
    log::info!(
        "Bus: {} ({} Hz MCK, poll {:?})",
        config.variant.profile().name,
        config.mck_hz,
        config.poll
    );

    let mut bus: SimBus = SpiBus::new(SimController::new(), config);
    let mut names = HashMap::new();

    for entry in &file.devices {
        let id = create_device(&mut bus, &entry.options()?)?;
        let dev = bus.device(id)?;
        println!(
            "{:<10} {} channel {} cs {} {:?}",
            entry.name,
            id,
            dev.channel(),
            dev.cs().map_or_else(|| "none".to_string(), |pins| pins.to_string()),
            dev.capability()
        );
        names.insert(entry.name.as_str(), id);
    }

    for transfer in &file.transfers {
        let id = *names
            .get(transfer.device.as_str())
            .ok_or_else(|| CliError::UnknownDevice(transfer.device.clone()))?;
        let tx = parse_hex(&transfer.tx)?;
        let mut rx = vec![0u8; tx.len()];

        bus.hardware_mut().clear_events();
        let n = bus.transfer(id, Words::Duplex(&tx, &mut rx), transfer.terminate)?;

        println!();
        println!(
            "{} ({}){}",
            transfer.device,
            id,
            if transfer.terminate { "" } else { " [frame open]" }
        );
        println!("  tx: {}", format_hex(&tx[..n]));
        println!("  rx: {}", format_hex(&rx[..n]));
        println!("  register writes: {}", bus.hardware().register_writes());
        print_cs_trace(bus.hardware(), bus.device(id)?.cs());
    }

    for id in names.into_values() {
        bus.shutdown(id)?;
    }
    log::debug!("Controller powered after shutdown: {}", bus.is_powered());

    Ok(())
}
