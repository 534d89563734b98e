//! spimux-core - SPI master device multiplexing for AT91 controllers
//!
//! The AT91 SPI controller has four chip-select channels (CSR0..CSR3), each
//! with its own clock mode, word width and timing. This crate lets any number
//! of logical devices (up to a compile-time capacity) share those channels.
//!
//! A device whose chip-select pin is wired to one of the channel's NPCS
//! outputs gets automatic chip select driven by the controller. Any other pin
//! is bit-banged as a plain PIO output. Channel registers are only rewritten
//! when a different device (or a modified one) starts a transfer.
//!
//! The crate is `no_std`. Hardware is reached through three small traits in
//! [`hal`]: register access, PIO pin control and peripheral clock control.
//!
//! # Features
//!
//! - `std` - Enable standard library support and `serde` derives on the
//!   configuration types
//!
//! # Example
//!
//! ```ignore
//! use spimux_core::{BusConfig, CsMode, DeviceConfig, SpiBus, Words};
//!
//! let mut bus: SpiBus<_, 8> = SpiBus::new(hardware, BusConfig::sam7s());
//! let adc = bus.create(&DeviceConfig::new(2).with_cs("PA10".parse()?))?;
//!
//! let mut rx = [0u8; 2];
//! bus.transfer(adc, Words::Duplex(&[0x55, 0xAA], &mut rx), true)?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod cache;
pub mod device;
pub mod engine;
pub mod error;
pub mod hal;
pub mod lifecycle;
pub mod mmio;
pub mod pins;
pub mod regs;
pub mod registry;
pub mod resolver;
pub mod variant;

pub use bus::{BusConfig, SpiBus};
pub use device::{Channel, CsMode, CsState, DeviceConfig, DeviceId, LogicalDevice, SpiMode};
pub use engine::{PollBound, Words};
pub use error::{Error, Result};
pub use hal::{Hardware, Pio, PowerManager, SpiRegisters};
pub use pins::{PeripheralFunction, Pins, Port};
pub use resolver::Capability;
pub use variant::{ControllerProfile, Variant};
