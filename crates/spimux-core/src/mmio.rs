//! Memory-mapped hardware access
//!
//! Implementations of the [`crate::hal`] traits on top of the peripheral
//! register blocks of real AT91 parts. Each block is a raw base pointer; all
//! accesses are 32-bit volatile reads and writes.
//!
//! # Register Layout
//!
//! | Block | SAM7S      | SAM4S      |
//! |-------|------------|------------|
//! | SPI   | 0xFFFE0000 | 0x40008000 |
//! | PIOA  | 0xFFFFF400 | 0x400E0E00 |
//! | PIOB  | -          | 0x400E1000 |
//! | PIOC  | -          | 0x400E1200 |
//! | PMC   | 0xFFFFFC00 | 0x400E0400 |

use crate::hal::{Pio, PowerManager, SpiRegisters};
use crate::pins::{PeripheralFunction, Pins, Port};
use crate::regs::Reg;

// PIO register offsets
const PIO_PER: usize = 0x00;
const PIO_PDR: usize = 0x04;
const PIO_OER: usize = 0x10;
const PIO_ODR: usize = 0x14;
const PIO_SODR: usize = 0x30;
const PIO_CODR: usize = 0x34;
const PIO_PDSR: usize = 0x3C;
const PIO_PUDR: usize = 0x60;
/// SAM7: ASR, SAM4: ABCDSR1
const PIO_ASR_ABCDSR1: usize = 0x70;
/// SAM7: BSR, SAM4: ABCDSR2
const PIO_BSR_ABCDSR2: usize = 0x74;

// PMC register offsets
const PMC_PCER: usize = 0x10;
const PMC_PCDR: usize = 0x14;

/// Raw 32-bit register block
#[derive(Debug)]
struct RegisterBlock {
    base: *mut u32,
}

impl RegisterBlock {
    /// # Safety
    ///
    /// `base` must point to a register block that stays mapped for the
    /// lifetime of the value and is not accessed through any other handle.
    unsafe fn new(base: usize) -> Self {
        Self {
            base: base as *mut u32,
        }
    }

    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        debug_assert!(offset & 3 == 0, "unaligned register read");
        // SAFETY: validity of the block is the constructor's contract
        unsafe { core::ptr::read_volatile(self.base.add(offset / 4)) }
    }

    #[inline]
    fn write32(&mut self, offset: usize, value: u32) {
        debug_assert!(offset & 3 == 0, "unaligned register write");
        // SAFETY: validity of the block is the constructor's contract
        unsafe { core::ptr::write_volatile(self.base.add(offset / 4), value) }
    }
}

/// SPI controller register block
#[derive(Debug)]
pub struct MmioSpi {
    block: RegisterBlock,
}

impl MmioSpi {
    /// Controller at `base`
    ///
    /// # Safety
    ///
    /// `base` must be the address of an SPI controller register block that
    /// nothing else accesses while this value exists.
    pub unsafe fn new(base: usize) -> Self {
        Self {
            block: unsafe { RegisterBlock::new(base) },
        }
    }
}

impl SpiRegisters for MmioSpi {
    fn read(&mut self, reg: Reg) -> u32 {
        self.block.read32(reg.offset())
    }

    fn write(&mut self, reg: Reg, value: u32) {
        self.block.write32(reg.offset(), value)
    }
}

/// How a PIO controller selects peripheral functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PioFlavor {
    /// Write-only ASR/BSR select registers (SAM7)
    Sam7,
    /// Read-write ABCDSR pair, two bits per line (SAM4)
    Sam4,
}

/// PIO controllers of one part
#[derive(Debug)]
pub struct MmioPio {
    flavor: PioFlavor,
    ports: [Option<RegisterBlock>; 3],
}

impl MmioPio {
    /// PIO controllers at the given bases, indexed by [`Port`]
    ///
    /// # Safety
    ///
    /// Every `Some` base must be the address of a PIO register block that
    /// nothing else accesses while this value exists.
    pub unsafe fn new(flavor: PioFlavor, bases: [Option<usize>; 3]) -> Self {
        Self {
            flavor,
            ports: bases.map(|base| base.map(|base| unsafe { RegisterBlock::new(base) })),
        }
    }

    fn port(&self, port: Port) -> Option<&RegisterBlock> {
        self.ports[port.index()].as_ref()
    }

    fn port_mut(&mut self, port: Port) -> Option<&mut RegisterBlock> {
        let block = self.ports[port.index()].as_mut();
        if block.is_none() {
            log::warn!("pio: port {:?} is not present on this part", port);
        }
        block
    }

    fn write(&mut self, pins: Pins, offset: usize) {
        if let Some(block) = self.port_mut(pins.port) {
            block.write32(offset, pins.mask);
        }
    }
}

impl Pio for MmioPio {
    fn configure_output(&mut self, pins: Pins, high: bool) {
        // Latch the level before enabling the driver to avoid a glitch
        self.write(pins, if high { PIO_SODR } else { PIO_CODR });
        self.write(pins, PIO_OER);
        self.write(pins, PIO_PER);
    }

    fn configure_input(&mut self, pins: Pins) {
        self.write(pins, PIO_ODR);
        self.write(pins, PIO_PER);
    }

    fn configure_peripheral(&mut self, pins: Pins, function: PeripheralFunction) {
        let flavor = self.flavor;
        let Some(block) = self.port_mut(pins.port) else {
            return;
        };

        match flavor {
            PioFlavor::Sam7 => {
                let select = match function {
                    PeripheralFunction::A => PIO_ASR_ABCDSR1,
                    PeripheralFunction::B => PIO_BSR_ABCDSR2,
                };
                block.write32(select, pins.mask);
            }
            PioFlavor::Sam4 => {
                // A = 00, B = 01 (ABCDSR2:ABCDSR1)
                let sr1 = block.read32(PIO_ASR_ABCDSR1);
                let sr1 = match function {
                    PeripheralFunction::A => sr1 & !pins.mask,
                    PeripheralFunction::B => sr1 | pins.mask,
                };
                block.write32(PIO_ASR_ABCDSR1, sr1);
                let sr2 = block.read32(PIO_BSR_ABCDSR2);
                block.write32(PIO_BSR_ABCDSR2, sr2 & !pins.mask);
            }
        }

        block.write32(PIO_PDR, pins.mask);
    }

    fn disable_pullup(&mut self, pins: Pins) {
        self.write(pins, PIO_PUDR);
    }

    fn set_high(&mut self, pins: Pins) {
        self.write(pins, PIO_SODR);
    }

    fn set_low(&mut self, pins: Pins) {
        self.write(pins, PIO_CODR);
    }

    fn is_high(&self, pins: Pins) -> bool {
        self.port(pins.port)
            .is_some_and(|block| block.read32(PIO_PDSR) & pins.mask == pins.mask)
    }
}

/// Power management controller
#[derive(Debug)]
pub struct MmioPmc {
    block: RegisterBlock,
}

impl MmioPmc {
    /// PMC at `base`
    ///
    /// # Safety
    ///
    /// `base` must be the address of the PMC register block. Only the
    /// peripheral clock enable/disable registers are written, and those are
    /// write-one-to-act, so other users of the PMC are not disturbed.
    pub unsafe fn new(base: usize) -> Self {
        Self {
            block: unsafe { RegisterBlock::new(base) },
        }
    }
}

impl PowerManager for MmioPmc {
    fn enable_peripheral_clock(&mut self, id: u8) {
        self.block.write32(PMC_PCER, 1 << (id & 31));
    }

    fn disable_peripheral_clock(&mut self, id: u8) {
        self.block.write32(PMC_PCDR, 1 << (id & 31));
    }
}

/// Complete memory-mapped hardware for one part
#[derive(Debug)]
pub struct At91Hardware {
    /// SPI controller
    pub spi: MmioSpi,
    /// PIO controllers
    pub pio: MmioPio,
    /// Power management controller
    pub pmc: MmioPmc,
}

impl At91Hardware {
    /// AT91SAM7S peripherals at their fixed addresses
    ///
    /// # Safety
    ///
    /// Must run on an AT91SAM7S, and the SPI and PIOA blocks must not be used
    /// through any other handle.
    pub unsafe fn sam7s() -> Self {
        unsafe {
            Self {
                spi: MmioSpi::new(0xFFFE_0000),
                pio: MmioPio::new(PioFlavor::Sam7, [Some(0xFFFF_F400), None, None]),
                pmc: MmioPmc::new(0xFFFF_FC00),
            }
        }
    }

    /// SAM4S peripherals at their fixed addresses
    ///
    /// # Safety
    ///
    /// Must run on a SAM4S, and the SPI and PIO blocks must not be used
    /// through any other handle.
    pub unsafe fn sam4s() -> Self {
        unsafe {
            Self {
                spi: MmioSpi::new(0x4000_8000),
                pio: MmioPio::new(
                    PioFlavor::Sam4,
                    [Some(0x400E_0E00), Some(0x400E_1000), Some(0x400E_1200)],
                ),
                pmc: MmioPmc::new(0x400E_0400),
            }
        }
    }
}

impl SpiRegisters for At91Hardware {
    fn read(&mut self, reg: Reg) -> u32 {
        self.spi.read(reg)
    }

    fn write(&mut self, reg: Reg, value: u32) {
        self.spi.write(reg, value)
    }
}

impl Pio for At91Hardware {
    fn configure_output(&mut self, pins: Pins, high: bool) {
        self.pio.configure_output(pins, high)
    }

    fn configure_input(&mut self, pins: Pins) {
        self.pio.configure_input(pins)
    }

    fn configure_peripheral(&mut self, pins: Pins, function: PeripheralFunction) {
        self.pio.configure_peripheral(pins, function)
    }

    fn disable_pullup(&mut self, pins: Pins) {
        self.pio.disable_pullup(pins)
    }

    fn set_high(&mut self, pins: Pins) {
        self.pio.set_high(pins)
    }

    fn set_low(&mut self, pins: Pins) {
        self.pio.set_low(pins)
    }

    fn is_high(&self, pins: Pins) -> bool {
        self.pio.is_high(pins)
    }
}

impl PowerManager for At91Hardware {
    fn enable_peripheral_clock(&mut self, id: u8) {
        self.pmc.enable_peripheral_clock(id)
    }

    fn disable_peripheral_clock(&mut self, id: u8) {
        self.pmc.disable_peripheral_clock(id)
    }
}
