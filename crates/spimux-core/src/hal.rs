//! Hardware traits
//!
//! The driver never touches memory directly. It reaches the controller
//! through three narrow traits:
//!
//! - [`SpiRegisters`] - read/write the SPI controller registers
//! - [`Pio`] - configure and drive PIO lines (bit-banged chip selects and
//!   routing bus pins to their peripheral function)
//! - [`PowerManager`] - gate peripheral clocks
//!
//! A type implementing all three is a [`Hardware`]. Real parts use the
//! memory-mapped implementations in [`crate::mmio`]; tests use the simulator
//! crate.

use crate::pins::{PeripheralFunction, Pins};
use crate::regs::Reg;

/// Access to the SPI controller register block
pub trait SpiRegisters {
    /// Read a register
    ///
    /// Takes `&mut self` because reads have side effects (reading RDR clears
    /// RDRF).
    fn read(&mut self, reg: Reg) -> u32;

    /// Write a register
    fn write(&mut self, reg: Reg, value: u32);
}

/// PIO line control
pub trait Pio {
    /// Make `pins` plain outputs, initially high or low
    fn configure_output(&mut self, pins: Pins, high: bool);

    /// Make `pins` plain inputs
    fn configure_input(&mut self, pins: Pins);

    /// Hand `pins` to a peripheral function
    fn configure_peripheral(&mut self, pins: Pins, function: PeripheralFunction);

    /// Disable the internal pull-ups of `pins`
    fn disable_pullup(&mut self, pins: Pins);

    /// Drive `pins` high
    fn set_high(&mut self, pins: Pins);

    /// Drive `pins` low
    fn set_low(&mut self, pins: Pins);

    /// True when every line of `pins` reads high
    fn is_high(&self, pins: Pins) -> bool;
}

/// Peripheral clock gating
pub trait PowerManager {
    /// Enable the clock of peripheral `id`
    fn enable_peripheral_clock(&mut self, id: u8);

    /// Disable the clock of peripheral `id`
    fn disable_peripheral_clock(&mut self, id: u8);
}

/// Everything the bus needs from the platform
pub trait Hardware: SpiRegisters + Pio + PowerManager {}

impl<T: SpiRegisters + Pio + PowerManager> Hardware for T {}

impl<T: SpiRegisters + ?Sized> SpiRegisters for &mut T {
    fn read(&mut self, reg: Reg) -> u32 {
        (**self).read(reg)
    }

    fn write(&mut self, reg: Reg, value: u32) {
        (**self).write(reg, value)
    }
}

impl<T: Pio + ?Sized> Pio for &mut T {
    fn configure_output(&mut self, pins: Pins, high: bool) {
        (**self).configure_output(pins, high)
    }

    fn configure_input(&mut self, pins: Pins) {
        (**self).configure_input(pins)
    }

    fn configure_peripheral(&mut self, pins: Pins, function: PeripheralFunction) {
        (**self).configure_peripheral(pins, function)
    }

    fn disable_pullup(&mut self, pins: Pins) {
        (**self).disable_pullup(pins)
    }

    fn set_high(&mut self, pins: Pins) {
        (**self).set_high(pins)
    }

    fn set_low(&mut self, pins: Pins) {
        (**self).set_low(pins)
    }

    fn is_high(&self, pins: Pins) -> bool {
        (**self).is_high(pins)
    }
}

impl<T: PowerManager + ?Sized> PowerManager for &mut T {
    fn enable_peripheral_clock(&mut self, id: u8) {
        (**self).enable_peripheral_clock(id)
    }

    fn disable_peripheral_clock(&mut self, id: u8) {
        (**self).disable_peripheral_clock(id)
    }
}
