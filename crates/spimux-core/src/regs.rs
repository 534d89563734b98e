//! AT91 SPI controller register definitions
//!
//! Register offsets, single-bit flags and typed accessors for the multi-bit
//! fields of MR and CSR. All insert/extract logic for a register lives on its
//! shadow type so callers never shift or mask by hand.
//!
//! # Register Layout
//!
//! | Offset | Name | Access |
//! |--------|------|--------|
//! | 0x00   | CR   | W      |
//! | 0x04   | MR   | RW     |
//! | 0x08   | RDR  | R      |
//! | 0x0C   | TDR  | W      |
//! | 0x10   | SR   | R      |
//! | 0x30   | CSR0..CSR3 | RW |

use bitflags::bitflags;

use crate::device::{Channel, SpiMode};

/// SPI controller register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    /// Control register
    Cr,
    /// Mode register
    Mr,
    /// Receive data register
    Rdr,
    /// Transmit data register
    Tdr,
    /// Status register
    Sr,
    /// Chip select register of a channel
    Csr(Channel),
}

impl Reg {
    /// Byte offset from the controller base address
    pub const fn offset(self) -> usize {
        match self {
            Self::Cr => 0x00,
            Self::Mr => 0x04,
            Self::Rdr => 0x08,
            Self::Tdr => 0x0C,
            Self::Sr => 0x10,
            Self::Csr(ch) => 0x30 + 4 * ch.index(),
        }
    }
}

bitflags! {
    /// Control register (CR) commands
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Control: u32 {
        /// Enable the controller
        const SPIEN = 1 << 0;
        /// Disable the controller
        const SPIDIS = 1 << 1;
        /// Software reset (leaves the controller in slave mode)
        const SWRST = 1 << 7;
        /// Release chip select after the next transfer completes
        const LASTXFER = 1 << 24;
    }
}

bitflags! {
    /// Mode register (MR) single-bit settings
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModeFlags: u32 {
        /// Master mode
        const MSTR = 1 << 0;
        /// Variable peripheral select
        const PS = 1 << 1;
        /// Chip select decode (4-to-16 external decoder)
        const PCSDEC = 1 << 2;
        /// Mode fault detection disabled
        const MODFDIS = 1 << 4;
        /// Local loopback
        const LLB = 1 << 7;
    }
}

bitflags! {
    /// Status register (SR) bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u32 {
        /// Receive data register full
        const RDRF = 1 << 0;
        /// Transmit data register empty
        const TDRE = 1 << 1;
        /// Mode fault
        const MODF = 1 << 2;
        /// Overrun
        const OVRES = 1 << 3;
        /// Chip select rise detected
        const NSSR = 1 << 8;
        /// Transmission registers empty
        const TXEMPTY = 1 << 9;
        /// Controller enabled
        const SPIENS = 1 << 16;
    }
}

/// Insert `value` into bits `lo..=hi` of `reg`
const fn insert(reg: u32, lo: u32, hi: u32, value: u32) -> u32 {
    let mask = (u32::MAX >> (31 - (hi - lo))) << lo;
    (reg & !mask) | ((value << lo) & mask)
}

/// Extract bits `lo..=hi` of `reg`
const fn extract(reg: u32, lo: u32, hi: u32) -> u32 {
    (reg >> lo) & (u32::MAX >> (31 - (hi - lo)))
}

/// Mode register shadow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mr(pub u32);

impl Mr {
    /// PCS value that selects no chip select at all
    pub const PCS_NONE: u8 = 0x0f;

    /// Master mode with mode fault detection disabled, fixed peripheral
    /// select, no chip select decoding
    pub const fn master() -> Self {
        Self(ModeFlags::MSTR.bits() | ModeFlags::MODFDIS.bits())
    }

    /// Single-bit settings
    pub const fn flags(self) -> ModeFlags {
        ModeFlags::from_bits_truncate(self.0)
    }

    /// Replace the single-bit settings, keeping multi-bit fields
    pub const fn with_flags(self, flags: ModeFlags) -> Self {
        Self((self.0 & !ModeFlags::all().bits()) | flags.bits())
    }

    /// PCS field (bits 16..=19)
    pub const fn pcs(self) -> u8 {
        extract(self.0, 16, 19) as u8
    }

    /// Set the PCS field (bits 16..=19)
    pub const fn with_pcs(self, pcs: u8) -> Self {
        Self(insert(self.0, 16, 19, pcs as u32))
    }

    /// Fixed peripheral select of `channel`
    ///
    /// PCS is one-cold without decoding: NPCSn is driven when bit n is the
    /// lowest zero bit.
    pub const fn with_fixed_channel(self, channel: Channel) -> Self {
        let flags = self.flags().difference(ModeFlags::PS);
        self.with_flags(flags).with_pcs(!(1u8 << channel.index()) & 0x0f)
    }

    /// Fixed peripheral select with every chip select released
    pub const fn with_no_channel(self) -> Self {
        let flags = self.flags().difference(ModeFlags::PS);
        self.with_flags(flags).with_pcs(Self::PCS_NONE)
    }

    /// Channel selected by PCS in fixed mode, if any
    pub const fn selected_channel(self) -> Option<Channel> {
        let pcs = self.pcs();
        if pcs & 0b0001 == 0 {
            Some(Channel::CH0)
        } else if pcs & 0b0010 == 0 {
            Some(Channel::CH1)
        } else if pcs & 0b0100 == 0 {
            Some(Channel::CH2)
        } else if pcs & 0b1000 == 0 {
            Some(Channel::CH3)
        } else {
            None
        }
    }
}

/// Chip select register shadow
///
/// | Bits   | Field | Meaning |
/// |--------|-------|---------|
/// | 0      | CPOL  | Clock idles high |
/// | 1      | NCPHA | Data captured on leading edge |
/// | 3      | CSAAT | Chip select stays active after transfer |
/// | 4..=7  | BITS  | Word width minus 8 |
/// | 8..=15 | SCBR  | Serial clock divisor |
/// | 16..=23| DLYBS | Delay before SPCK, in MCK cycles |
/// | 24..=31| DLYBCT| Delay between transfers, in 32 MCK cycles |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Csr(pub u32);

impl Csr {
    const CPOL: u32 = 1 << 0;
    const NCPHA: u32 = 1 << 1;
    const CSAAT: u32 = 1 << 3;

    /// Chip select active after transfer
    pub const fn csaat(self) -> bool {
        self.0 & Self::CSAAT != 0
    }

    /// Set or clear CSAAT
    pub const fn with_csaat(self, hold: bool) -> Self {
        if hold {
            Self(self.0 | Self::CSAAT)
        } else {
            Self(self.0 & !Self::CSAAT)
        }
    }

    /// Clock mode programmed in CPOL/NCPHA
    ///
    /// NCPHA is the inverse of the usual CPHA bit.
    pub const fn mode(self) -> SpiMode {
        match (self.0 & Self::CPOL != 0, self.0 & Self::NCPHA != 0) {
            (false, true) => SpiMode::Mode0,
            (false, false) => SpiMode::Mode1,
            (true, true) => SpiMode::Mode2,
            (true, false) => SpiMode::Mode3,
        }
    }

    /// Program CPOL/NCPHA for `mode`
    pub const fn with_mode(self, mode: SpiMode) -> Self {
        let mut v = self.0 & !(Self::CPOL | Self::NCPHA);
        if mode.cpol() {
            v |= Self::CPOL;
        }
        if !mode.cpha() {
            v |= Self::NCPHA;
        }
        Self(v)
    }

    /// Word width in bits
    pub const fn bits(self) -> u8 {
        extract(self.0, 4, 7) as u8 + 8
    }

    /// Set word width (8..=16)
    pub const fn with_bits(self, bits: u8) -> Self {
        Self(insert(self.0, 4, 7, bits.saturating_sub(8) as u32))
    }

    /// Serial clock divisor
    pub const fn divisor(self) -> u8 {
        extract(self.0, 8, 15) as u8
    }

    /// Set the serial clock divisor
    pub const fn with_divisor(self, divisor: u8) -> Self {
        Self(insert(self.0, 8, 15, divisor as u32))
    }

    /// Delay before SPCK in MCK cycles
    pub const fn dlybs(self) -> u8 {
        extract(self.0, 16, 23) as u8
    }

    /// Set delay before SPCK
    pub const fn with_dlybs(self, delay: u8) -> Self {
        Self(insert(self.0, 16, 23, delay as u32))
    }

    /// Delay between consecutive transfers in units of 32 MCK cycles
    pub const fn dlybct(self) -> u8 {
        extract(self.0, 24, 31) as u8
    }

    /// Set delay between consecutive transfers
    pub const fn with_dlybct(self, delay: u8) -> Self {
        Self(insert(self.0, 24, 31, delay as u32))
    }
}
