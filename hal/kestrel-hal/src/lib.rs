//! Kestrel Hardware Abstraction Layer
//!
//! This crate defines the register-view traits and shared vocabulary the
//! Kestrel drivers are written against. A chip crate (e.g.
//! `kestrel-hal-lpc17xx`) implements the traits over its real memory map;
//! the driver test suites implement them over mock register blocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Tasks (terminal, sensors, logger, ...) │
//! └─────────────────────────────────────────┘
//!                     │ blocking calls, bounded by Timeout
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  kestrel-drivers (SerialLink/BusMaster) │
//! └─────────────────────────────────────────┘
//!                     │ kestrel-hal traits (this crate)
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ kestrel-hal-  │       │ mock register │
//! │    lpc17xx    │       │ harness(tests)│
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartRegisters`] - one UART register block
//! - [`i2c::I2cRegisters`] - one I2C controller register block
//! - [`time::TickSource`] - monotonic tick source for timeout bookkeeping
//! - [`irq::IrqHandler`] - interrupt entry point implemented by drivers

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;
pub mod irq;
pub mod time;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use i2c::I2cRegisters;
pub use irq::IrqHandler;
pub use time::TickSource;
pub use uart::UartRegisters;

/// Error from driver initialization
///
/// `init` failures leave no partial state behind: a driver that failed to
/// initialize has not touched the hardware in any way a retry would need
/// to undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Requested baud rate cannot be derived from the peripheral clock
    BaudRate,
    /// Requested bus rate is outside the supported range
    BusRate,
    /// Queue capacity below the supported floor
    QueueCapacity,
    /// Register block rejected the configuration
    Peripheral,
}
