//! SPI bus facade
//!
//! [`SpiBus`] owns the hardware and all per-controller state: the device
//! registry, the configuration cache and the power votes. Every public
//! operation of the driver is a method on it and takes `&mut self`, so one bus
//! is never driven from two places at once.
//!
//! Device settings are changed through setters that all funnel into a single
//! mutation path. That path drops the cached channel configuration when it
//! belongs to the changed device, so the next transfer reprograms the channel.

use crate::cache::ConfigCache;
use crate::device::{check_bits, CsMode, CsState, DeviceConfig, DeviceId, LogicalDevice, SpiMode};
use crate::engine::{self, PollBound, Words};
use crate::error::{Error, Result};
use crate::hal::Hardware;
use crate::lifecycle::{self, EnabledSet};
use crate::regs::{Control, Mr, Reg};
use crate::registry::DeviceRegistry;
use crate::resolver::{self, Capability};
use crate::variant::{ControllerProfile, Variant};

/// Master clock of a SAM7S running from an 18.432 MHz crystal
pub const SAM7S_MCK_HZ: u32 = 48_054_857;

/// Master clock of a SAM4S at full speed
pub const SAM4S_MCK_HZ: u32 = 120_000_000;

/// Bus-wide settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct BusConfig {
    /// Chip family
    pub variant: Variant,
    /// How long a word may take before the transfer fails
    #[cfg_attr(feature = "std", serde(default))]
    pub poll: PollBound,
    /// Master clock feeding the controller, used to turn speeds into divisors
    pub mck_hz: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::sam7s()
    }
}

impl BusConfig {
    /// AT91SAM7S defaults
    pub const fn sam7s() -> Self {
        Self {
            variant: Variant::Sam7s,
            poll: PollBound::Forever,
            mck_hz: SAM7S_MCK_HZ,
        }
    }

    /// SAM4S defaults
    pub const fn sam4s() -> Self {
        Self {
            variant: Variant::Sam4s,
            poll: PollBound::Forever,
            mck_hz: SAM4S_MCK_HZ,
        }
    }

    /// Defaults for `variant`
    pub const fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Sam7s => Self::sam7s(),
            Variant::Sam4s => Self::sam4s(),
        }
    }

    /// Set the word poll bound
    pub const fn with_poll(mut self, poll: PollBound) -> Self {
        self.poll = poll;
        self
    }

    /// Set the master clock frequency
    pub const fn with_mck_hz(mut self, mck_hz: u32) -> Self {
        self.mck_hz = mck_hz;
        self
    }
}

/// One SPI controller shared by up to `N` logical devices
#[derive(Debug)]
pub struct SpiBus<H: Hardware, const N: usize> {
    hw: H,
    config: BusConfig,
    profile: &'static ControllerProfile,
    devices: DeviceRegistry<N>,
    cache: ConfigCache,
    enabled: EnabledSet,
}

impl<H: Hardware, const N: usize> SpiBus<H, N> {
    /// Create a bus on `hw`. The controller stays off until a device exists.
    pub fn new(hw: H, config: BusConfig) -> Self {
        Self {
            hw,
            config,
            profile: config.variant.profile(),
            devices: DeviceRegistry::new(),
            cache: ConfigCache::new(),
            enabled: EnabledSet::new(),
        }
    }

    /// Bus-wide settings
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Controller description
    pub fn profile(&self) -> &'static ControllerProfile {
        self.profile
    }

    /// Underlying hardware
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Underlying hardware, mutably
    ///
    /// Writing channel registers through this handle bypasses the
    /// configuration cache; call [`SpiBus::reset`] afterwards.
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    /// Give the hardware back
    pub fn into_hardware(self) -> H {
        self.hw
    }

    // =========================================================================
    // Devices
    // =========================================================================

    /// Register a device and power the controller for it
    ///
    /// The chip-select pin is resolved against the variant's route table.
    /// Wired pins are handed to the controller; anything else becomes a GPIO
    /// output driven high.
    pub fn create(&mut self, config: &DeviceConfig) -> Result<DeviceId> {
        config.validate()?;
        if self.devices.len() == self.devices.capacity() {
            return Err(Error::PoolExhausted);
        }

        let capability = resolver::resolve(self.profile, config.channel, config.cs);
        let mut device = LogicalDevice::from_config(config, capability);

        if let (Some(pins), Capability::Gpio) = (device.cs, capability) {
            log::debug!(
                "spi: {} is not wired to NPCS{}, chip select is bit-banged",
                pins,
                device.channel
            );
        }

        lifecycle::attach_cs(&mut self.hw, &mut device);
        let id = self.devices.insert(device)?;

        log::debug!(
            "spi: created device {} on channel {} ({:?})",
            id,
            config.channel,
            capability
        );

        self.wakeup(id)?;
        Ok(id)
    }

    /// Read-only view of a device
    pub fn device(&self, id: DeviceId) -> Result<&LogicalDevice> {
        self.devices.get(id)
    }

    /// All devices with their handles
    pub fn devices(&self) -> impl Iterator<Item = (DeviceId, &LogicalDevice)> {
        self.devices.iter()
    }

    /// Device whose settings are programmed into the controller
    pub fn cached(&self) -> Option<DeviceId> {
        self.cache.current()
    }

    /// True while at least one device holds the controller powered
    pub fn is_powered(&self) -> bool {
        !self.enabled.is_empty()
    }

    /// Apply `f` to a device and drop its cached configuration
    fn update<R>(
        &mut self,
        id: DeviceId,
        f: impl FnOnce(&mut LogicalDevice, &mut H) -> R,
    ) -> Result<R> {
        let device = self.devices.get_mut(id)?;
        let ret = f(device, &mut self.hw);
        self.cache.invalidate_device(id);
        Ok(ret)
    }

    /// Set the serial clock divisor (0 selects the default)
    pub fn set_divisor(&mut self, id: DeviceId, divisor: u8) -> Result<()> {
        let divisor = if divisor == 0 {
            crate::device::DEFAULT_DIVISOR
        } else {
            divisor
        };
        self.update(id, |dev, _| dev.divisor = divisor)
    }

    /// Set the serial clock as close to `hz` as the divisor allows, without
    /// exceeding it
    ///
    /// Returns the frequency actually achieved.
    pub fn set_speed(&mut self, id: DeviceId, hz: u32) -> Result<u32> {
        if hz == 0 {
            return Err(Error::InvalidSpeed(hz));
        }

        let mck = self.config.mck_hz;
        let divisor = mck.div_ceil(hz).max(1);
        if divisor > u32::from(u8::MAX) {
            return Err(Error::InvalidSpeed(hz));
        }

        self.update(id, |dev, _| dev.divisor = divisor as u8)?;
        let achieved = mck / divisor;
        log::debug!(
            "spi: device {} clock {} Hz requested, {} Hz achieved (divisor {})",
            id,
            hz,
            achieved,
            divisor
        );
        Ok(achieved)
    }

    /// Set the clock mode
    pub fn set_mode(&mut self, id: DeviceId, mode: SpiMode) -> Result<()> {
        self.update(id, |dev, _| dev.mode = mode)
    }

    /// Set the word width (8..=16 bits)
    pub fn set_bits(&mut self, id: DeviceId, bits: u8) -> Result<()> {
        check_bits(bits)?;
        self.update(id, |dev, _| dev.bits = bits)
    }

    /// Set the chip-select framing
    pub fn set_cs_mode(&mut self, id: DeviceId, cs_mode: CsMode) -> Result<()> {
        self.update(id, |dev, _| dev.cs_mode = cs_mode)
    }

    /// Set the delay before the first clock edge, in MCK cycles
    pub fn set_cs_assert_delay(&mut self, id: DeviceId, delay: u16) -> Result<()> {
        self.update(id, |dev, _| dev.cs_assert_delay = delay)
    }

    /// Set the delay between consecutive words, in MCK cycles
    pub fn set_cs_negate_delay(&mut self, id: DeviceId, delay: u16) -> Result<()> {
        self.update(id, |dev, _| dev.cs_negate_delay = delay)
    }

    /// Let the controller drive chip select when the pin allows it, or force
    /// bit-banging
    ///
    /// Returns the capability in effect afterwards.
    pub fn set_cs_auto(&mut self, id: DeviceId, enable: bool) -> Result<Capability> {
        let profile = self.profile;
        let capability = self.update(id, |dev, hw| {
            let capability = if enable {
                resolver::resolve(profile, dev.channel, dev.cs)
            } else {
                Capability::Gpio
            };

            if capability != dev.capability {
                dev.capability = capability;
                // Parked pins pick up the new capability on the next wakeup
                if dev.cs_state != CsState::Parked {
                    lifecycle::attach_cs(hw, dev);
                }
            }
            capability
        })?;

        log::debug!("spi: device {} chip select now {:?}", id, capability);
        Ok(capability)
    }

    // =========================================================================
    // Power
    // =========================================================================

    /// Vote for controller power on behalf of `id`
    ///
    /// The first vote brings the controller up.
    pub fn wakeup(&mut self, id: DeviceId) -> Result<()> {
        self.devices.get(id)?;
        if self.enabled.insert(id) {
            lifecycle::bring_up(&mut self.hw, self.profile, &mut self.devices);
        }
        Ok(())
    }

    /// Withdraw `id`'s power vote
    ///
    /// The last vote leaving tears the controller down. The configuration
    /// cache is dropped either way.
    pub fn shutdown(&mut self, id: DeviceId) -> Result<()> {
        self.devices.get(id)?;
        self.cache.invalidate();
        if self.enabled.remove(id) {
            lifecycle::tear_down(&mut self.hw, self.profile, &mut self.devices);
        }
        Ok(())
    }

    /// Software-reset the controller and drop the cached configuration
    ///
    /// A powered controller is put back into master mode and re-enabled.
    pub fn reset(&mut self) {
        self.hw.write(Reg::Cr, Control::SWRST.bits());
        self.cache.invalidate();
        if self.is_powered() {
            self.hw.write(Reg::Mr, Mr::master().0);
            self.hw.write(Reg::Cr, Control::SPIEN.bits());
        }
        log::debug!("spi: controller reset");
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    /// Program the channel with `id`'s settings unless they already are
    ///
    /// Returns true when registers were written.
    pub fn sync(&mut self, id: DeviceId) -> Result<bool> {
        let device = self.devices.get(id)?;
        Ok(self.cache.sync(&mut self.hw, id, device))
    }

    /// Clock `words` through the controller for device `id`
    ///
    /// With `terminate` false the chip select of a framed device stays
    /// asserted so a following call continues the same frame. Returns the
    /// number of buffer bytes transferred.
    pub fn transfer(&mut self, id: DeviceId, mut words: Words<'_>, terminate: bool) -> Result<usize> {
        let device = self.devices.get_mut(id)?;
        if words.is_empty() {
            return Ok(0);
        }

        self.cache.sync(&mut self.hw, id, device);
        engine::transfer(
            &mut self.hw,
            id,
            device,
            self.config.poll,
            &mut words,
            terminate,
        )
    }

    /// Send `tx`, discarding what comes back
    pub fn write(&mut self, id: DeviceId, tx: &[u8], terminate: bool) -> Result<usize> {
        self.transfer(id, Words::Write(tx), terminate)
    }

    /// Fill `buf` from the device
    ///
    /// The current contents of `buf` are clocked out as filler.
    pub fn read(&mut self, id: DeviceId, buf: &mut [u8], terminate: bool) -> Result<usize> {
        self.transfer(id, Words::Read(buf), terminate)
    }

    /// Exchange a single word and end the frame
    pub fn exchange(&mut self, id: DeviceId, word: u16) -> Result<u16> {
        let wide = self.devices.get(id)?.bits() > 8;

        let tx = word.to_le_bytes();
        let mut rx = [0u8; 2];
        let len = if wide { 2 } else { 1 };
        self.transfer(id, Words::Duplex(&tx[..len], &mut rx[..len]), true)?;

        Ok(if wide {
            u16::from_le_bytes(rx)
        } else {
            u16::from(rx[0])
        })
    }

    /// Send a single word
    pub fn put(&mut self, id: DeviceId, word: u16) -> Result<()> {
        self.exchange(id, word).map(|_| ())
    }

    /// Receive a single word, clocking out zero
    pub fn get(&mut self, id: DeviceId) -> Result<u16> {
        self.exchange(id, 0)
    }

    /// True when a received word is waiting in RDR
    pub fn read_ready(&mut self) -> bool {
        engine::rx_ready(&mut self.hw)
    }

    /// True when TDR can accept another word
    pub fn write_ready(&mut self) -> bool {
        engine::tx_ready(&mut self.hw)
    }
}
