//! spimux-sim - Simulated AT91 SPI controller for testing
//!
//! [`SimController`] implements every hardware trait the bus needs. The SPI
//! side models the registers the driver touches: CR commands, MR, the four
//! CSRs, and a TDR/RDR pair whose RDRF flag is set as soon as a word is
//! written. What comes back on MISO is decided by a [`Responder`].
//!
//! Everything observable is recorded as an [`Event`] so tests can count chip
//! select edges, register writes and power transitions.

use std::collections::VecDeque;

use spimux_core::regs::{Control, Csr, Mr, Reg, Status};
use spimux_core::{Channel, PeripheralFunction, Pins, Pio, Port, PowerManager, SpiRegisters};

/// Source of the words clocked in on MISO
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Responder {
    /// MISO wired to MOSI
    #[default]
    Loopback,
    /// Every word reads as the same value
    Constant(u16),
    /// Words returned in order, all ones once exhausted
    Script(VecDeque<u16>),
}

impl Responder {
    fn respond(&mut self, tx: u16) -> u16 {
        match self {
            Self::Loopback => tx,
            Self::Constant(word) => *word,
            Self::Script(words) => words.pop_front().unwrap_or(u16::MAX),
        }
    }
}

/// Something the driver did to the simulated hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Register write (CR writes are reported as [`Event::Command`] too)
    RegWrite {
        /// Register written
        reg: Reg,
        /// Value written
        value: u32,
    },
    /// CR command
    Command(Control),
    /// Word clocked through the controller
    Word {
        /// Channel selected by MR.PCS at the time, if any
        channel: Option<Channel>,
        /// Word sent
        tx: u16,
        /// Word received
        rx: u16,
    },
    /// Pins made plain outputs
    Output {
        /// Pins
        pins: Pins,
        /// Initial level
        high: bool,
    },
    /// Pins made plain inputs
    Input(Pins),
    /// Pins handed to a peripheral
    Peripheral {
        /// Pins
        pins: Pins,
        /// Peripheral function
        function: PeripheralFunction,
    },
    /// Pull-ups disabled
    PullupDisabled(Pins),
    /// Pins driven high
    High(Pins),
    /// Pins driven low
    Low(Pins),
    /// Peripheral clock enabled
    ClockEnabled(u8),
    /// Peripheral clock disabled
    ClockDisabled(u8),
}

/// Line configuration of one PIO port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PortState {
    /// Lines owned by the PIO (as opposed to a peripheral)
    pio: u32,
    /// Lines driven as outputs
    output: u32,
    /// Output latch
    level: u32,
    /// Lines muxed to peripheral B (A otherwise)
    function_b: u32,
    /// Lines with the pull-up disabled
    no_pullup: u32,
}

/// Simulated SPI controller, PIO and PMC
#[derive(Debug, Default)]
pub struct SimController {
    responder: Responder,
    stuck: bool,

    enabled: bool,
    mr: u32,
    csr: [u32; Channel::COUNT],
    rdr: u32,
    rdrf: bool,

    ports: [PortState; 3],
    clocks: u64,

    events: Vec<Event>,
    register_writes: usize,
    status_reads: usize,
}

impl SimController {
    /// Controller with a loopback bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller answering through `responder`
    pub fn with_responder(responder: Responder) -> Self {
        Self {
            responder,
            ..Self::default()
        }
    }

    /// Replace the responder
    pub fn set_responder(&mut self, responder: Responder) {
        self.responder = responder;
    }

    /// Stop completing words: RDRF and TDRE never set while stuck
    pub fn set_stuck(&mut self, stuck: bool) {
        self.stuck = stuck;
    }

    /// Everything recorded so far
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Forget recorded events and counters
    pub fn clear_events(&mut self) {
        self.events.clear();
        self.register_writes = 0;
        self.status_reads = 0;
    }

    /// Number of recorded events matching `f`
    pub fn count(&self, f: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| f(e)).count()
    }

    /// SPI register writes since the last clear
    pub fn register_writes(&self) -> usize {
        self.register_writes
    }

    /// SR reads since the last clear
    pub fn status_reads(&self) -> usize {
        self.status_reads
    }

    /// Words clocked since the last clear, as (tx, rx)
    pub fn words(&self) -> Vec<(u16, u16)> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                Event::Word { tx, rx, .. } => Some((tx, rx)),
                _ => None,
            })
            .collect()
    }

    /// Number of times `pins` were driven low
    pub fn lows(&self, pins: Pins) -> usize {
        self.count(|e| *e == Event::Low(pins))
    }

    /// Number of times `pins` were driven high
    pub fn highs(&self, pins: Pins) -> usize {
        self.count(|e| *e == Event::High(pins))
    }

    /// Controller enabled (SPIEN issued since the last SPIDIS/SWRST)
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Peripheral clock `id` running
    pub fn clock_enabled(&self, id: u8) -> bool {
        self.clocks & (1 << (id & 63)) != 0
    }

    /// Mode register
    pub fn mr(&self) -> Mr {
        Mr(self.mr)
    }

    /// Chip select register of `channel`
    pub fn csr(&self, channel: Channel) -> Csr {
        Csr(self.csr[channel.index()])
    }

    /// True when every line of `pins` is a PIO output
    pub fn is_output(&self, pins: Pins) -> bool {
        let port = self.port(pins.port);
        port.pio & port.output & pins.mask == pins.mask
    }

    /// Peripheral function of `pins`, if the PIO has handed them off
    pub fn function(&self, pins: Pins) -> Option<PeripheralFunction> {
        let port = self.port(pins.port);
        if port.pio & pins.mask != 0 {
            None
        } else if port.function_b & pins.mask == pins.mask {
            Some(PeripheralFunction::B)
        } else {
            Some(PeripheralFunction::A)
        }
    }

    /// True when the pull-ups of every line of `pins` are off
    pub fn pullup_disabled(&self, pins: Pins) -> bool {
        self.port(pins.port).no_pullup & pins.mask == pins.mask
    }

    fn port(&self, port: Port) -> &PortState {
        &self.ports[port.index()]
    }

    fn port_mut(&mut self, port: Port) -> &mut PortState {
        &mut self.ports[port.index()]
    }

    fn command(&mut self, cmd: Control) {
        self.events.push(Event::Command(cmd));

        if cmd.contains(Control::SWRST) {
            self.enabled = false;
            self.mr = 0;
            self.csr = [0; Channel::COUNT];
            self.rdr = 0;
            self.rdrf = false;
        }
        if cmd.contains(Control::SPIDIS) {
            self.enabled = false;
        } else if cmd.contains(Control::SPIEN) {
            self.enabled = true;
        }
    }

    fn clock(&mut self, tx: u16) {
        let channel = Mr(self.mr).selected_channel();

        if !self.enabled {
            log::warn!("sim: word {:#06x} written while the controller is disabled", tx);
            return;
        }

        let mask = match channel {
            Some(ch) => u16::MAX >> (16 - Csr(self.csr[ch.index()]).bits().clamp(8, 16)),
            None => u16::MAX,
        };
        let tx = tx & mask;
        let rx = self.responder.respond(tx) & mask;

        self.events.push(Event::Word { channel, tx, rx });
        self.rdr = u32::from(rx);
        self.rdrf = true;
    }
}

impl SpiRegisters for SimController {
    fn read(&mut self, reg: Reg) -> u32 {
        match reg {
            Reg::Cr | Reg::Tdr => 0,
            Reg::Mr => self.mr,
            Reg::Csr(ch) => self.csr[ch.index()],
            Reg::Rdr => {
                self.rdrf = false;
                self.rdr
            }
            Reg::Sr => {
                self.status_reads += 1;
                let mut status = Status::empty();
                if self.enabled {
                    status |= Status::SPIENS;
                }
                if !self.stuck {
                    status |= Status::TDRE | Status::TXEMPTY;
                    if self.rdrf {
                        status |= Status::RDRF;
                    }
                }
                status.bits()
            }
        }
    }

    fn write(&mut self, reg: Reg, value: u32) {
        self.register_writes += 1;
        self.events.push(Event::RegWrite { reg, value });

        match reg {
            Reg::Cr => self.command(Control::from_bits_truncate(value)),
            Reg::Mr => self.mr = value,
            Reg::Csr(ch) => self.csr[ch.index()] = value,
            Reg::Tdr => {
                if !self.stuck {
                    self.clock(value as u16);
                }
            }
            Reg::Rdr | Reg::Sr => {
                log::warn!("sim: write to read-only register {:?}", reg);
            }
        }
    }
}

impl Pio for SimController {
    fn configure_output(&mut self, pins: Pins, high: bool) {
        self.events.push(Event::Output { pins, high });
        let port = self.port_mut(pins.port);
        if high {
            port.level |= pins.mask;
        } else {
            port.level &= !pins.mask;
        }
        port.output |= pins.mask;
        port.pio |= pins.mask;
    }

    fn configure_input(&mut self, pins: Pins) {
        self.events.push(Event::Input(pins));
        let port = self.port_mut(pins.port);
        port.output &= !pins.mask;
        port.pio |= pins.mask;
    }

    fn configure_peripheral(&mut self, pins: Pins, function: PeripheralFunction) {
        self.events.push(Event::Peripheral { pins, function });
        let port = self.port_mut(pins.port);
        match function {
            PeripheralFunction::A => port.function_b &= !pins.mask,
            PeripheralFunction::B => port.function_b |= pins.mask,
        }
        port.pio &= !pins.mask;
    }

    fn disable_pullup(&mut self, pins: Pins) {
        self.events.push(Event::PullupDisabled(pins));
        self.port_mut(pins.port).no_pullup |= pins.mask;
    }

    fn set_high(&mut self, pins: Pins) {
        self.events.push(Event::High(pins));
        self.port_mut(pins.port).level |= pins.mask;
    }

    fn set_low(&mut self, pins: Pins) {
        self.events.push(Event::Low(pins));
        self.port_mut(pins.port).level &= !pins.mask;
    }

    fn is_high(&self, pins: Pins) -> bool {
        self.port(pins.port).level & pins.mask == pins.mask
    }
}

impl PowerManager for SimController {
    fn enable_peripheral_clock(&mut self, id: u8) {
        self.events.push(Event::ClockEnabled(id));
        self.clocks |= 1 << (id & 63);
    }

    fn disable_peripheral_clock(&mut self, id: u8) {
        self.events.push(Event::ClockDisabled(id));
        self.clocks &= !(1 << (id & 63));
    }
}

#[cfg(test)]
mod tests;
