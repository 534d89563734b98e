//! Fixed-capacity device pool
//!
//! Devices are appended to an arena and never removed, so a [`DeviceId`] stays
//! valid for the lifetime of the registry and is never handed out twice.

use heapless::Vec;

use crate::device::{DeviceId, LogicalDevice};
use crate::error::{Error, Result};

/// Arena of up to `N` logical devices
///
/// `N` is limited to 32 so that device membership fits one word (see
/// [`crate::lifecycle::EnabledSet`]).
#[derive(Debug)]
pub struct DeviceRegistry<const N: usize> {
    devices: Vec<LogicalDevice, N>,
}

impl<const N: usize> Default for DeviceRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> DeviceRegistry<N> {
    const CAPACITY_CHECK: () = assert!(N <= 32, "device pool is limited to 32 slots");

    /// Create an empty registry
    pub const fn new() -> Self {
        let () = Self::CAPACITY_CHECK;
        Self {
            devices: Vec::new(),
        }
    }

    /// Store `device`, returning its handle
    pub fn insert(&mut self, device: LogicalDevice) -> Result<DeviceId> {
        let id = DeviceId(self.devices.len() as u8);
        self.devices
            .push(device)
            .map_err(|_| Error::PoolExhausted)?;
        Ok(id)
    }

    /// Device behind `id`
    pub fn get(&self, id: DeviceId) -> Result<&LogicalDevice> {
        self.devices.get(id.index()).ok_or(Error::UnknownDevice(id))
    }

    /// Mutable device behind `id`
    pub fn get_mut(&mut self, id: DeviceId) -> Result<&mut LogicalDevice> {
        self.devices
            .get_mut(id.index())
            .ok_or(Error::UnknownDevice(id))
    }

    /// Number of devices created so far
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// True before the first device is created
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Total number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Iterate over all devices with their handles
    pub fn iter(&self) -> impl Iterator<Item = (DeviceId, &LogicalDevice)> {
        self.devices
            .iter()
            .enumerate()
            .map(|(i, dev)| (DeviceId(i as u8), dev))
    }

    /// Iterate mutably over all devices
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LogicalDevice> {
        self.devices.iter_mut()
    }
}
