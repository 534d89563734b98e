//! Controller power lifecycle
//!
//! The controller, its clock and its bus pins are shared by every device. Each
//! device votes for power through [`EnabledSet`]; the hardware is brought up
//! when the first vote arrives and torn down when the last one leaves.
//!
//! While the controller is down, every chip-select pin is driven low so that
//! no device is back-powered through it. Those pins are recorded as
//! [`CsState::Parked`] and restored on the next bring-up.

use crate::device::{CsState, DeviceId, LogicalDevice};
use crate::hal::Hardware;
use crate::regs::{Control, Mr, Reg};
use crate::registry::DeviceRegistry;
use crate::resolver::{self, Capability};
use crate::variant::ControllerProfile;

/// Devices that currently want the controller powered
///
/// One bit per registry slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnabledSet(u32);

impl EnabledSet {
    /// Nobody wants power
    pub const fn new() -> Self {
        Self(0)
    }

    /// Add `id`, returning true when this powers the controller up
    pub fn insert(&mut self, id: DeviceId) -> bool {
        let was_empty = self.is_empty();
        self.0 |= Self::bit(id);
        was_empty
    }

    /// Remove `id`, returning true when this powers the controller down
    pub fn remove(&mut self, id: DeviceId) -> bool {
        let was_empty = self.is_empty();
        self.0 &= !Self::bit(id);
        !was_empty && self.is_empty()
    }

    /// True when `id` holds a vote
    pub fn contains(&self, id: DeviceId) -> bool {
        self.0 & Self::bit(id) != 0
    }

    /// True when the controller should be off
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of votes
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    fn bit(id: DeviceId) -> u32 {
        1 << (id.index() & 31)
    }
}

/// Put a device's chip-select pin into its idle configuration
///
/// Automatic pins go to the controller, bit-banged pins become outputs driven
/// high.
pub(crate) fn attach_cs<H: Hardware + ?Sized>(hw: &mut H, device: &mut LogicalDevice) {
    let Some(pins) = device.cs else {
        return;
    };

    match device.capability {
        Capability::Automatic(_) => resolver::route(hw, pins, device.capability),
        Capability::Gpio => hw.configure_output(pins, true),
    }
    device.cs_state = CsState::Negated;
}

/// Power the controller up and restore parked chip selects
pub(crate) fn bring_up<H: Hardware + ?Sized, const N: usize>(
    hw: &mut H,
    profile: &ControllerProfile,
    devices: &mut DeviceRegistry<N>,
) {
    let bus = profile.bus_pins();
    hw.configure_peripheral(bus, profile.bus_function);
    hw.disable_pullup(bus);

    hw.enable_peripheral_clock(profile.peripheral_id);

    // SWRST drops the controller back to slave mode
    hw.write(Reg::Cr, Control::SWRST.bits());
    hw.write(Reg::Mr, Mr::master().0);
    hw.write(Reg::Cr, Control::SPIEN.bits());

    let mut restored = 0;
    for device in devices.iter_mut() {
        if device.cs_state == CsState::Parked {
            attach_cs(hw, device);
            restored += 1;
        }
    }

    log::debug!(
        "spi: {} controller up ({} chip selects restored)",
        profile.name,
        restored
    );
}

/// Power the controller down and park every chip select low
pub(crate) fn tear_down<H: Hardware + ?Sized, const N: usize>(
    hw: &mut H,
    profile: &ControllerProfile,
    devices: &mut DeviceRegistry<N>,
) {
    hw.write(Reg::Cr, Control::SPIDIS.bits());

    hw.configure_output(profile.mosi.with(profile.spck), false);
    hw.configure_input(profile.miso);
    hw.disable_pullup(profile.bus_pins());

    hw.disable_peripheral_clock(profile.peripheral_id);

    for device in devices.iter_mut() {
        if let Some(pins) = device.cs {
            resolver::unroute(hw, pins, false);
            device.cs_state = CsState::Parked;
        }
    }

    log::debug!("spi: {} controller down", profile.name);
}
