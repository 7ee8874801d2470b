//! UART register block (UART0/2/3)
//!
//! UART1 has a different memory map (modem control registers shift the
//! layout) and is not supported by this view.

use kestrel_hal::uart::{UartIrqReason, UartRegisters};
use kestrel_hal::ConfigError;

/// UART0 peripheral base
pub const UART0_BASE: usize = 0x4000_C000;
/// UART2 peripheral base
pub const UART2_BASE: usize = 0x4009_8000;
/// UART3 peripheral base
pub const UART3_BASE: usize = 0x4009_C000;

// Register offsets (word index from base)
const RBR_THR_DLL: usize = 0x00 / 4;
const DLM_IER: usize = 0x04 / 4;
const IIR_FCR: usize = 0x08 / 4;
const LCR: usize = 0x0C / 4;
const LSR: usize = 0x14 / 4;

// LSR bit 0: receiver data ready
const LSR_RDR: u32 = 1 << 0;
// LCR bit 7: divisor latch access
const LCR_DLAB: u32 = 1 << 7;

/// View onto one LPC17xx UART register block
pub struct Lpc17xxUart {
    base: *mut u32,
}

// The raw pointer is a fixed MMIO address, not shared memory; access is
// serialized by the owning driver's critical sections.
unsafe impl Send for Lpc17xxUart {}

impl Lpc17xxUart {
    /// # Safety
    ///
    /// `base` must be one of the supported UART blocks and this must be
    /// the only view constructed over it.
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

impl UartRegisters for Lpc17xxUart {
    fn configure(&mut self, clock_hz: u32, baudrate: u32) -> Result<(), ConfigError> {
        if baudrate == 0 || baudrate > clock_hz / 16 {
            return Err(ConfigError::BaudRate);
        }

        // Enable and reset FIFOs, 4-char receive trigger level
        self.write(IIR_FCR, (1 << 0) | (1 << 1) | (1 << 2) | (1 << 6));

        // DLAB on to reach the divisor latches; round to nearest
        let divisor = (clock_hz + 8 * baudrate) / (16 * baudrate);
        self.write(LCR, LCR_DLAB);
        self.write(RBR_THR_DLL, divisor & 0xFF);
        self.write(DLM_IER, (divisor >> 8) & 0xFF);

        // DLAB off, 8 data bits, no parity, 1 stop bit
        self.write(LCR, 0x03);

        // Receive and transmit-empty interrupts
        self.write(DLM_IER, (1 << 0) | (1 << 1));
        Ok(())
    }

    fn irq_reason(&mut self) -> UartIrqReason {
        let iir = self.read(IIR_FCR);
        if iir & 1 != 0 {
            // Bit 0 set means nothing pending
            return UartIrqReason::None;
        }
        match (iir >> 1) & 0x7 {
            0b001 => UartIrqReason::TransmitEmpty,
            0b010 => UartIrqReason::DataAvailable,
            0b110 => UartIrqReason::ReceiveTimeout,
            _ => UartIrqReason::Other,
        }
    }

    fn rx_ready(&self) -> bool {
        self.read(LSR) & LSR_RDR != 0
    }

    fn read_data(&mut self) -> u8 {
        self.read(RBR_THR_DLL) as u8
    }

    fn write_data(&mut self, byte: u8) {
        self.write(RBR_THR_DLL, u32::from(byte));
    }
}
