//! UART register block abstraction
//!
//! [`UartRegisters`] is the view the serial driver needs onto one UART
//! peripheral: data in/out, the decoded interrupt reason, and receive
//! status. Framing is fixed 8N1 by the chip implementation; baud rate is
//! the only line parameter the driver configures.

use crate::ConfigError;

/// Decoded cause of a UART interrupt
///
/// Mirrors the reason field hardware latches per interrupt. Only one
/// reason is reported per read; if several are pending the line re-fires
/// and the handler runs again for the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartIrqReason {
    /// Transmit holding register empty; hardware can accept more data
    TransmitEmpty,
    /// Receive FIFO reached its trigger level
    DataAvailable,
    /// Bytes sat in the receive FIFO longer than the character timeout
    ReceiveTimeout,
    /// No interrupt pending
    None,
    /// A reason this driver does not act on (line status, modem, ...)
    Other,
}

/// Typed view onto one UART register block
///
/// Exclusively owned by one `SerialLink`; the driver serializes access
/// between task and interrupt context, the implementation only performs
/// the register reads and writes.
pub trait UartRegisters {
    /// Apply baud rate and fixed 8N1 framing, enable FIFOs and the
    /// receive/transmit interrupts
    fn configure(&mut self, clock_hz: u32, baudrate: u32) -> Result<(), ConfigError>;

    /// Read and decode the pending interrupt reason
    ///
    /// Reading may acknowledge the interrupt at the hardware level,
    /// depending on the chip; callers treat this as consuming.
    fn irq_reason(&mut self) -> UartIrqReason;

    /// Is at least one received byte pending in the hardware FIFO?
    fn rx_ready(&self) -> bool;

    /// Pop one byte from the receive FIFO
    fn read_data(&mut self) -> u8;

    /// Push one byte into the transmit holding register
    fn write_data(&mut self, byte: u8);

    /// Depth of the hardware transmit FIFO
    ///
    /// Bounds how many bytes the interrupt handler batches per
    /// transmit-empty event.
    fn tx_fifo_depth(&self) -> usize {
        16
    }
}

/// Serial line configuration
///
/// Framing is fixed 8N1; the baud rate is the only knob.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    pub baudrate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self { baudrate: 115_200 }
    }
}

impl SerialConfig {
    /// The classic terminal rate
    pub const CONSOLE: Self = Self { baudrate: 115_200 };
}

/// Error from a blocking serial operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// The caller's deadline elapsed before the queue had data/space
    Timeout,
}
