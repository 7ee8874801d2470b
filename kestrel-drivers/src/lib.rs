//! Interrupt-driven peripheral drivers for Kestrel board support
//!
//! Two transaction shapes, one pattern: a task-context call either
//! completes immediately from buffered state or blocks (bounded by a
//! timeout) until the peripheral's interrupt handler advances the shared
//! state and makes it runnable again.
//!
//! - [`serial::SerialLink`] - byte-stream driver over a UART register
//!   block, with bounded receive/transmit queues
//! - [`bus::BusMaster`] - addressed register transactions over an I2C
//!   controller, serialized by a per-bus lock
//! - [`device::I2cDevice`] - a device address bound to a bus, for the
//!   sensor/display drivers layered above
//!
//! All shared state lives behind `critical_section::Mutex`; interrupt
//! handlers never block and never allocate. Both drivers are generic over
//! the register-view traits in `kestrel-hal`, so the test suites run them
//! against mock register blocks on the host.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod bus;
pub mod device;
pub mod queue;
pub mod serial;

#[cfg(test)]
mod testing;

pub use bus::BusMaster;
pub use device::I2cDevice;
pub use serial::SerialLink;
