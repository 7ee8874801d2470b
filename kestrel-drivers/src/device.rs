//! A device address bound to a bus
//!
//! Sensor and display drivers talk to one slave; binding the address
//! once keeps them from carrying it through every call.

use kestrel_hal::i2c::{BusError, I2cRegisters};
use kestrel_hal::time::TickSource;

use crate::bus::BusMaster;

/// One I2C slave on one bus
pub struct I2cDevice<'b, R, C> {
    bus: &'b BusMaster<R, C>,
    /// 7-bit device address
    address: u8,
}

impl<'b, R, C> I2cDevice<'b, R, C>
where
    R: I2cRegisters,
    C: TickSource,
{
    pub fn new(bus: &'b BusMaster<R, C>, address: u8) -> Self {
        Self { bus, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn read_register(&self, register: u8) -> Result<u8, BusError> {
        self.bus.read_register(self.address, register)
    }

    pub fn write_register(&self, register: u8, value: u8) -> Result<(), BusError> {
        self.bus.write_register(self.address, register, value)
    }

    pub fn read_registers(&self, first_register: u8, out: &mut [u8]) -> Result<(), BusError> {
        self.bus.read_registers(self.address, first_register, out)
    }

    /// Does the device acknowledge its address right now?
    ///
    /// Bus faults read as "absent"; callers wanting to distinguish use
    /// [`BusMaster::probe_device`] directly.
    pub fn is_present(&self) -> bool {
        self.bus.probe_device(self.address).unwrap_or(false)
    }
}
