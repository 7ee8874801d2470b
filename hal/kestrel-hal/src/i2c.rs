//! I2C controller register block abstraction
//!
//! [`I2cRegisters`] exposes the control surface the bus master's state
//! machine drives: start/repeated-start/stop conditions, byte transfer,
//! ack control, and the decoded bus event behind each interrupt.
//!
//! Addresses are 7-bit everywhere above this trait; the read/write bit is
//! folded in at the register boundary.

use crate::ConfigError;

/// Bus-protocol event decoded from the controller's status register
///
/// One event is latched per interrupt; the state machine consumes it and
/// releases the bus clock line by clearing the interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    /// Start condition has been transmitted
    StartSent,
    /// Repeated start condition has been transmitted
    RepeatedStartSent,
    /// Address + write bit sent, slave acknowledged
    AddressAckedWrite,
    /// Address + read bit sent, slave acknowledged
    AddressAckedRead,
    /// Address sent, no acknowledgment (absent or busy device)
    AddressNacked,
    /// Data byte sent, slave acknowledged
    DataAcked,
    /// Data byte sent, slave did not acknowledge
    DataNacked,
    /// Data byte received, controller returned ACK
    ByteReceivedAcked,
    /// Data byte received, controller returned NACK (final byte)
    ByteReceivedNacked,
    /// Lost arbitration to another master
    ArbitrationLost,
    /// Illegal start/stop framing on the wire
    BusFault,
    /// No event pending
    None,
}

/// Typed view onto one I2C controller register block
pub trait I2cRegisters {
    /// Enable the controller and derive the SCL rate from the
    /// peripheral clock
    fn configure(&mut self, clock_hz: u32, bus_rate_hz: u32) -> Result<(), ConfigError>;

    /// Read and decode the pending bus event
    fn event(&mut self) -> BusEvent;

    /// Request a start condition
    fn start(&mut self);

    /// Request a repeated start condition (bus stays owned)
    fn repeated_start(&mut self);

    /// Request a stop condition, releasing the bus
    fn stop(&mut self);

    /// Load the data register (address byte or payload byte)
    fn write_byte(&mut self, byte: u8);

    /// Read the data register after a byte-received event
    fn read_byte(&mut self) -> u8;

    /// Choose whether the controller ACKs the next received byte
    fn set_ack(&mut self, ack: bool);

    /// Acknowledge the current event, letting the bus clock resume
    fn clear_irq(&mut self);

    /// Force the controller back to an idle state
    ///
    /// Used by the timeout recovery path after a wedged transaction; must
    /// leave the controller ready to accept a new start condition.
    fn bus_reset(&mut self);
}

/// I2C bus rate configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// SCL frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            frequency: 100_000, // 100kHz standard mode
        }
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };
}

/// Error from a bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The transaction did not complete within the driver's deadline;
    /// the controller has been reset and the bus released
    Timeout,
    /// Expected acknowledgment was absent
    Nack,
    /// Another master won the bus
    ArbitrationLost,
    /// Protocol-level fault on the wire
    Bus,
    /// Transfer length outside the frame's fixed buffer
    Config,
}
