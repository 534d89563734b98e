//! Logical SPI devices
//!
//! A [`LogicalDevice`] holds everything needed to project one device's
//! settings onto a shared channel: clock mode, word width, divisor, delays,
//! framing and the chip-select pin with its resolved capability.

use core::fmt;

use crate::error::{Error, Result};
use crate::hal::Pio;
use crate::pins::Pins;
use crate::resolver::Capability;

/// Divisor used when a configuration leaves it unspecified
pub const DEFAULT_DIVISOR: u8 = 128;

/// Hardware chip-select channel (CSR0..CSR3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(try_from = "u8", into = "u8"))]
pub struct Channel(u8);

impl Channel {
    /// Channel 0 (NPCS0)
    pub const CH0: Channel = Channel(0);
    /// Channel 1 (NPCS1)
    pub const CH1: Channel = Channel(1);
    /// Channel 2 (NPCS2)
    pub const CH2: Channel = Channel(2);
    /// Channel 3 (NPCS3)
    pub const CH3: Channel = Channel(3);

    /// Number of channels per controller
    pub const COUNT: usize = 4;

    /// Channel number `n`, if it exists
    pub const fn new(n: u8) -> Option<Self> {
        if (n as usize) < Self::COUNT {
            Some(Channel(n))
        } else {
            None
        }
    }

    /// Channel index (0..=3)
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for Channel {
    type Error = Error;

    fn try_from(n: u8) -> Result<Self> {
        Channel::new(n).ok_or(Error::InvalidChannel(n))
    }
}

impl From<Channel> for u8 {
    fn from(ch: Channel) -> u8 {
        ch.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Clock polarity/phase combination
///
/// | Mode | CPOL | CPHA | Clock idle | Sampled on |
/// |------|------|------|------------|------------|
/// | 0    | 0    | 0    | low        | rising     |
/// | 1    | 0    | 1    | low        | falling    |
/// | 2    | 1    | 0    | high       | falling    |
/// | 3    | 1    | 1    | high       | rising     |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(try_from = "u8", into = "u8"))]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    #[default]
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl SpiMode {
    /// Clock idles high
    pub const fn cpol(self) -> bool {
        matches!(self, Self::Mode2 | Self::Mode3)
    }

    /// Data captured on the trailing clock edge
    pub const fn cpha(self) -> bool {
        matches!(self, Self::Mode1 | Self::Mode3)
    }
}

impl TryFrom<u8> for SpiMode {
    type Error = Error;

    fn try_from(n: u8) -> Result<Self> {
        match n {
            0 => Ok(Self::Mode0),
            1 => Ok(Self::Mode1),
            2 => Ok(Self::Mode2),
            3 => Ok(Self::Mode3),
            _ => Err(Error::InvalidMode(n)),
        }
    }
}

impl From<SpiMode> for u8 {
    fn from(mode: SpiMode) -> u8 {
        mode as u8
    }
}

/// Chip-select framing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "kebab-case"))]
pub enum CsMode {
    /// Chip select pulses around every word
    #[default]
    Toggle,
    /// Chip select held across all words of a transfer
    Frame,
    /// Chip select never driven
    AlwaysHigh,
}

/// Electrical state of a bit-banged chip-select pin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CsState {
    /// Pin high, device not selected
    #[default]
    Negated,
    /// Pin low, device selected
    Asserted,
    /// Pin driven low while the controller is powered down
    Parked,
}

/// Handle to a device in a bus registry
///
/// Handles are slot indices. They are never reused, since devices are never
/// destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub(crate) u8);

impl DeviceId {
    /// Slot index in the registry
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Settings supplied when a device is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct DeviceConfig {
    /// Hardware channel
    pub channel: Channel,
    /// Chip-select pin, `None` for a device without one
    pub cs: Option<Pins>,
    /// Serial clock divisor, 0 for the default
    pub divisor: u8,
    /// Word width (8..=16)
    pub bits: u8,
    /// Clock mode
    pub mode: SpiMode,
    /// Chip-select framing
    pub cs_mode: CsMode,
    /// Delay from chip select assertion to first clock edge, in MCK cycles
    pub cs_assert_delay: u16,
    /// Delay between consecutive words, in MCK cycles
    pub cs_negate_delay: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            channel: Channel::CH0,
            cs: None,
            divisor: 0,
            bits: 8,
            mode: SpiMode::Mode0,
            cs_mode: CsMode::Toggle,
            cs_assert_delay: 0,
            cs_negate_delay: 0,
        }
    }
}

impl DeviceConfig {
    /// Configuration on `channel` with default settings
    ///
    /// `channel` must be 0..=3. Use [`Channel::try_from`] with
    /// [`DeviceConfig::with_channel`] for numbers from outside the program.
    pub fn new(channel: u8) -> Self {
        debug_assert!(channel < 4, "SPI channel {} out of range", channel);
        Self {
            channel: Channel(channel & 0x03),
            ..Default::default()
        }
    }

    /// Set the channel
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    /// Set the chip-select pin
    pub fn with_cs(mut self, cs: Pins) -> Self {
        self.cs = Some(cs);
        self
    }

    /// Set the clock divisor
    pub fn with_divisor(mut self, divisor: u8) -> Self {
        self.divisor = divisor;
        self
    }

    /// Set the word width
    pub fn with_bits(mut self, bits: u8) -> Self {
        self.bits = bits;
        self
    }

    /// Set the clock mode
    pub fn with_mode(mut self, mode: SpiMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the chip-select framing
    pub fn with_cs_mode(mut self, cs_mode: CsMode) -> Self {
        self.cs_mode = cs_mode;
        self
    }

    /// Set the delay before the first clock edge
    pub fn with_cs_assert_delay(mut self, delay: u16) -> Self {
        self.cs_assert_delay = delay;
        self
    }

    /// Set the delay between consecutive words
    pub fn with_cs_negate_delay(mut self, delay: u16) -> Self {
        self.cs_negate_delay = delay;
        self
    }

    /// Check ranges that the register fields cannot represent
    pub fn validate(&self) -> Result<()> {
        check_bits(self.bits)
    }
}

pub(crate) fn check_bits(bits: u8) -> Result<()> {
    if (8..=16).contains(&bits) {
        Ok(())
    } else {
        Err(Error::InvalidBits(bits))
    }
}

/// A device sharing the controller
#[derive(Debug, Clone)]
pub struct LogicalDevice {
    pub(crate) channel: Channel,
    pub(crate) cs: Option<Pins>,
    pub(crate) mode: SpiMode,
    pub(crate) bits: u8,
    pub(crate) divisor: u8,
    pub(crate) cs_assert_delay: u16,
    pub(crate) cs_negate_delay: u16,
    pub(crate) cs_mode: CsMode,
    pub(crate) capability: Capability,
    pub(crate) cs_state: CsState,
}

impl LogicalDevice {
    pub(crate) fn from_config(config: &DeviceConfig, capability: Capability) -> Self {
        Self {
            channel: config.channel,
            cs: config.cs.filter(|pins| !pins.is_empty()),
            mode: config.mode,
            bits: config.bits,
            divisor: if config.divisor == 0 {
                DEFAULT_DIVISOR
            } else {
                config.divisor
            },
            cs_assert_delay: config.cs_assert_delay,
            cs_negate_delay: config.cs_negate_delay,
            cs_mode: config.cs_mode,
            capability,
            cs_state: CsState::Negated,
        }
    }

    /// Hardware channel
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Chip-select pin
    pub fn cs(&self) -> Option<Pins> {
        self.cs
    }

    /// Clock mode
    pub fn mode(&self) -> SpiMode {
        self.mode
    }

    /// Word width in bits
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Serial clock divisor
    pub fn divisor(&self) -> u8 {
        self.divisor
    }

    /// Delay before the first clock edge, in MCK cycles
    pub fn cs_assert_delay(&self) -> u16 {
        self.cs_assert_delay
    }

    /// Delay between consecutive words, in MCK cycles
    pub fn cs_negate_delay(&self) -> u16 {
        self.cs_negate_delay
    }

    /// Chip-select framing
    pub fn cs_mode(&self) -> CsMode {
        self.cs_mode
    }

    /// How chip select is driven
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Current state of a bit-banged chip select
    pub fn cs_state(&self) -> CsState {
        self.cs_state
    }

    /// True while a bit-banged chip select is asserted
    pub fn cs_active(&self) -> bool {
        self.cs_state == CsState::Asserted
    }

    /// Chip select driven by the controller
    pub fn is_automatic(&self) -> bool {
        matches!(self.capability, Capability::Automatic(_))
    }

    /// DLYBCT value: the inter-word delay rounded up to units of 32 cycles
    pub(crate) fn dlybct(&self) -> u8 {
        let units = (u32::from(self.cs_negate_delay) + 31) / 32;
        units.min(u32::from(u8::MAX)) as u8
    }

    /// DLYBS value, saturated to the field width
    pub(crate) fn dlybs(&self) -> u8 {
        self.cs_assert_delay.min(u16::from(u8::MAX)) as u8
    }

    /// Drive a bit-banged chip select low
    pub(crate) fn assert_cs<P: Pio + ?Sized>(&mut self, pio: &mut P) {
        if let Some(pins) = self.cs {
            pio.set_low(pins);
            self.cs_state = CsState::Asserted;
        }
    }

    /// Drive a bit-banged chip select high
    pub(crate) fn negate_cs<P: Pio + ?Sized>(&mut self, pio: &mut P) {
        if let Some(pins) = self.cs {
            pio.set_high(pins);
            self.cs_state = CsState::Negated;
        }
    }
}
