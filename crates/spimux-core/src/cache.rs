//! Lazy channel reconfiguration
//!
//! The four channel registers are shared by every device on the controller.
//! [`ConfigCache`] remembers whose settings are currently programmed so that
//! back-to-back transfers to one device skip the register writes entirely.
//!
//! The cache only names a device; it holds no copy of its settings. Any change
//! to that device must go through [`ConfigCache::invalidate_device`] so the
//! next [`ConfigCache::sync`] reprograms the channel.

use crate::device::{CsMode, DeviceId, LogicalDevice};
use crate::hal::SpiRegisters;
use crate::regs::{Csr, Mr, Reg};

/// Record of which device's settings are live in the channel registers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigCache {
    loaded: Option<DeviceId>,
}

impl ConfigCache {
    /// Empty cache: the next sync always writes
    pub const fn new() -> Self {
        Self { loaded: None }
    }

    /// Device whose settings are programmed, if any
    pub fn current(&self) -> Option<DeviceId> {
        self.loaded
    }

    /// True when `id`'s settings are programmed
    pub fn is_current(&self, id: DeviceId) -> bool {
        self.loaded == Some(id)
    }

    /// Forget whatever is programmed
    pub fn invalidate(&mut self) {
        self.loaded = None;
    }

    /// Forget the programmed settings if they belong to `id`
    pub fn invalidate_device(&mut self, id: DeviceId) {
        if self.is_current(id) {
            self.loaded = None;
        }
    }

    /// Make the channel registers match `device`
    ///
    /// Writes MR (fixed peripheral select of the device's channel) and then
    /// the channel's CSR, unless `id` is already current. Returns true when
    /// registers were written.
    pub fn sync<R: SpiRegisters + ?Sized>(
        &mut self,
        regs: &mut R,
        id: DeviceId,
        device: &LogicalDevice,
    ) -> bool {
        if self.is_current(id) {
            return false;
        }

        let channel = device.channel();

        let mr = Mr(regs.read(Reg::Mr));
        let mr = match device.cs_mode() {
            CsMode::AlwaysHigh => mr.with_no_channel(),
            CsMode::Toggle | CsMode::Frame => mr.with_fixed_channel(channel),
        };
        regs.write(Reg::Mr, mr.0);

        let csr = Csr(regs.read(Reg::Csr(channel)))
            .with_csaat(device.cs_mode() == CsMode::Frame)
            .with_mode(device.mode())
            .with_bits(device.bits())
            .with_divisor(device.divisor())
            .with_dlybs(device.dlybs())
            .with_dlybct(device.dlybct());
        regs.write(Reg::Csr(channel), csr.0);

        // Silicon erratum: odd word widths misbehave at the fastest clock
        if device.divisor() == 1 && device.bits() % 2 == 1 {
            log::warn!(
                "spi: device {} uses {} bit words with divisor 1, which the controller does not support",
                id,
                device.bits()
            );
        }

        log::debug!(
            "spi: loaded device {} into channel {} (csr={:#010x})",
            id,
            channel,
            csr.0
        );

        self.loaded = Some(id);
        true
    }
}
