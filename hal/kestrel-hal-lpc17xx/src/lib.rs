//! LPC17xx register views for the Kestrel drivers
//!
//! Thin volatile MMIO over the UART and I2C register blocks of the
//! LPC175x/176x family. No logic lives here beyond bit packing; the
//! drivers in `kestrel-drivers` own all sequencing.
//!
//! Board init is still responsible for the pieces this crate does not
//! touch: peripheral power (`PCONP`), pin muxing (`PINSEL`), peripheral
//! clock dividers, and routing the NVIC vectors into the `IrqTable`.
//!
//! # Safety
//!
//! Constructing a register view takes a base address on faith. Each view
//! must be the only one over its block; the drivers rely on exclusive
//! ownership for their critical-section discipline.

#![no_std]

pub mod i2c;
pub mod irq;
pub mod uart;

pub use i2c::Lpc17xxI2c;
pub use uart::Lpc17xxUart;
