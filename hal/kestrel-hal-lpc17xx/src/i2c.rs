//! I2C controller register block (I2C0/1/2)
//!
//! The LPC17xx controller latches one status code per interrupt in
//! `I2STAT` and halts the bus clock until `SI` is cleared; that maps
//! directly onto the driver's one-event-per-interrupt state machine.

use kestrel_hal::i2c::{BusEvent, I2cRegisters};
use kestrel_hal::ConfigError;

/// I2C0 peripheral base
pub const I2C0_BASE: usize = 0x4001_C000;
/// I2C1 peripheral base
pub const I2C1_BASE: usize = 0x4005_C000;
/// I2C2 peripheral base
pub const I2C2_BASE: usize = 0x400A_0000;

// Register offsets (word index from base)
const CONSET: usize = 0x00 / 4;
const STAT: usize = 0x04 / 4;
const DAT: usize = 0x08 / 4;
const SCLH: usize = 0x10 / 4;
const SCLL: usize = 0x14 / 4;
const CONCLR: usize = 0x18 / 4;

// I2CONSET/I2CONCLR bits
const CON_AA: u32 = 1 << 2;
const CON_SI: u32 = 1 << 3;
const CON_STO: u32 = 1 << 4;
const CON_STA: u32 = 1 << 5;
const CON_I2EN: u32 = 1 << 6;

/// View onto one LPC17xx I2C register block
pub struct Lpc17xxI2c {
    base: *mut u32,
}

// Fixed MMIO address; access serialized by the owning driver.
unsafe impl Send for Lpc17xxI2c {}

impl Lpc17xxI2c {
    /// # Safety
    ///
    /// `base` must be one of the I2C blocks and this must be the only
    /// view constructed over it.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            base: base as *mut u32,
        }
    }

    fn read(&self, offset: usize) -> u32 {
        unsafe { self.base.add(offset).read_volatile() }
    }

    fn write(&mut self, offset: usize, value: u32) {
        unsafe { self.base.add(offset).write_volatile(value) }
    }
}

impl I2cRegisters for Lpc17xxI2c {
    fn configure(&mut self, clock_hz: u32, bus_rate_hz: u32) -> Result<(), ConfigError> {
        if bus_rate_hz == 0 || bus_rate_hz > clock_hz / 4 {
            return Err(ConfigError::BusRate);
        }
        // Symmetric high/low halves of the SCL period
        let half = clock_hz / (2 * bus_rate_hz);
        self.write(SCLH, half);
        self.write(SCLL, half);
        self.write(CONCLR, CON_AA | CON_SI | CON_STA | CON_I2EN);
        self.write(CONSET, CON_I2EN);
        Ok(())
    }

    fn event(&mut self) -> BusEvent {
        if self.read(CONSET) & CON_SI == 0 {
            return BusEvent::None;
        }
        match self.read(STAT) & 0xF8 {
            0x08 => BusEvent::StartSent,
            0x10 => BusEvent::RepeatedStartSent,
            0x18 => BusEvent::AddressAckedWrite,
            0x20 | 0x48 => BusEvent::AddressNacked,
            0x28 => BusEvent::DataAcked,
            0x30 => BusEvent::DataNacked,
            0x38 => BusEvent::ArbitrationLost,
            0x40 => BusEvent::AddressAckedRead,
            0x50 => BusEvent::ByteReceivedAcked,
            0x58 => BusEvent::ByteReceivedNacked,
            _ => BusEvent::BusFault,
        }
    }

    fn start(&mut self) {
        self.write(CONSET, CON_STA);
    }

    fn repeated_start(&mut self) {
        self.write(CONSET, CON_STA);
    }

    fn stop(&mut self) {
        self.write(CONSET, CON_STO);
        self.write(CONCLR, CON_STA);
    }

    fn write_byte(&mut self, byte: u8) {
        self.write(DAT, u32::from(byte));
        // The start request is consumed once the address/data goes out;
        // leaving STA set would fire another start.
        self.write(CONCLR, CON_STA);
    }

    fn read_byte(&mut self) -> u8 {
        self.read(DAT) as u8
    }

    fn set_ack(&mut self, ack: bool) {
        if ack {
            self.write(CONSET, CON_AA);
        } else {
            self.write(CONCLR, CON_AA);
        }
    }

    fn clear_irq(&mut self) {
        self.write(CONCLR, CON_SI);
    }

    fn bus_reset(&mut self) {
        // Disable drops any half-finished transfer; re-enable leaves the
        // controller idle and ready for a fresh start condition.
        self.write(CONCLR, CON_AA | CON_SI | CON_STA | CON_I2EN);
        self.write(CONSET, CON_I2EN);
    }
}
