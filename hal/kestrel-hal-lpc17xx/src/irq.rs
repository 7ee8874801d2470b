//! NVIC line numbers for the peripherals this crate covers
//!
//! Board init binds these into the `IrqTable`; the startup glue's vector
//! stubs dispatch on them.

use kestrel_hal::irq::IrqLine;

pub const UART0_IRQ: IrqLine = IrqLine(5);
pub const UART2_IRQ: IrqLine = IrqLine(7);
pub const UART3_IRQ: IrqLine = IrqLine(8);
pub const I2C0_IRQ: IrqLine = IrqLine(10);
pub const I2C1_IRQ: IrqLine = IrqLine(11);
pub const I2C2_IRQ: IrqLine = IrqLine(12);
