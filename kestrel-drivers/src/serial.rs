//! Byte-stream serial driver
//!
//! [`SerialLink`] moves bytes between task-level callers and a UART's
//! hardware FIFO. Received bytes are buffered in a bounded queue by the
//! interrupt handler; transmitted bytes are queued by the caller and
//! drained by the transmit-empty interrupt.
//!
//! The one delicate piece is transmit kick-off. Hardware only raises
//! transmit-empty interrupts while it is shifting something out, so the
//! first byte of an idle line must be written from task context. The
//! `tx_in_flight` flag records which side is responsible, and is only
//! read-modified inside the critical section shared with the handler;
//! otherwise a `put_byte` and a concurrent drain could both write the
//! data register without an intervening transmit-empty event.

use core::cell::RefCell;

use critical_section::Mutex;
use kestrel_hal::irq::{IrqHandler, Wakeup};
use kestrel_hal::time::{Deadline, TickSource, Timeout};
use kestrel_hal::uart::{SerialError, UartIrqReason, UartRegisters};
use kestrel_hal::ConfigError;

use crate::queue::{ByteQueue, MIN_QUEUE_CAPACITY};

/// State shared between task context and the interrupt handler
struct LinkState<R, const RX: usize, const TX: usize> {
    regs: R,
    rx: ByteQueue<RX>,
    tx: ByteQueue<TX>,
    /// Hardware holds a byte it has not finished shifting out
    tx_in_flight: bool,
}

/// Interrupt-driven serial link over one UART register block
///
/// `RX_CAP`/`TX_CAP` size the receive and transmit queues (floor of
/// [`MIN_QUEUE_CAPACITY`], checked by [`init`](Self::init)). One link
/// owns one register block and one interrupt line.
pub struct SerialLink<R, C, const RX_CAP: usize = 32, const TX_CAP: usize = 32> {
    state: Mutex<RefCell<LinkState<R, RX_CAP, TX_CAP>>>,
    clock: C,
}

impl<R, C, const RX_CAP: usize, const TX_CAP: usize> SerialLink<R, C, RX_CAP, TX_CAP>
where
    R: UartRegisters,
    C: TickSource,
{
    pub fn new(regs: R, clock: C) -> Self {
        Self {
            state: Mutex::new(RefCell::new(LinkState {
                regs,
                rx: ByteQueue::new(),
                tx: ByteQueue::new(),
                tx_in_flight: false,
            })),
            clock,
        }
    }

    /// Configure the line and enable interrupts
    pub fn init(&self, clock_hz: u32, baudrate: u32) -> Result<(), ConfigError> {
        if RX_CAP < MIN_QUEUE_CAPACITY || TX_CAP < MIN_QUEUE_CAPACITY {
            return Err(ConfigError::QueueCapacity);
        }
        critical_section::with(|cs| {
            self.state
                .borrow_ref_mut(cs)
                .regs
                .configure(clock_hz, baudrate)
        })
    }

    /// Receive the oldest buffered byte, blocking up to `timeout`
    pub fn get_byte(&self, timeout: Timeout) -> Result<u8, SerialError> {
        let deadline = Deadline::after(&self.clock, timeout);
        loop {
            let byte = critical_section::with(|cs| self.state.borrow_ref_mut(cs).rx.pop());
            if let Some(byte) = byte {
                return Ok(byte);
            }
            if deadline.reached(&self.clock) {
                return Err(SerialError::Timeout);
            }
            self.clock.park();
        }
    }

    /// Queue a byte for transmission, blocking up to `timeout` for space
    ///
    /// If hardware is idle when the byte is queued, transmission is
    /// kicked off immediately from task context.
    pub fn put_byte(&self, byte: u8, timeout: Timeout) -> Result<(), SerialError> {
        let deadline = Deadline::after(&self.clock, timeout);
        loop {
            let queued = critical_section::with(|cs| {
                let mut state = self.state.borrow_ref_mut(cs);
                if state.tx.push(byte).is_err() {
                    return false;
                }
                // Idle hardware raises no transmit-empty interrupt, so
                // the first byte has to be handed over here.
                if !state.tx_in_flight {
                    if let Some(next) = state.tx.pop() {
                        state.tx_in_flight = true;
                        state.regs.write_data(next);
                    }
                }
                true
            });
            if queued {
                return Ok(());
            }
            if deadline.reached(&self.clock) {
                return Err(SerialError::Timeout);
            }
            self.clock.park();
        }
    }

    /// Service one UART interrupt
    ///
    /// Handles exactly one latched reason; if several are pending the
    /// line re-fires and this runs again.
    pub fn on_interrupt(&self) -> Wakeup {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let state = &mut *state;
            match state.regs.irq_reason() {
                UartIrqReason::TransmitEmpty => {
                    state.tx_in_flight = false;
                    let was_full = state.tx.is_full();
                    // Batch up to the hardware FIFO depth per interrupt
                    // to amortize the handler overhead.
                    for _ in 0..state.regs.tx_fifo_depth() {
                        match state.tx.pop() {
                            Some(byte) => {
                                state.tx_in_flight = true;
                                state.regs.write_data(byte);
                            }
                            None => break,
                        }
                    }
                    if was_full && !state.tx.is_full() {
                        Wakeup::Reschedule
                    } else {
                        Wakeup::None
                    }
                }
                UartIrqReason::DataAvailable | UartIrqReason::ReceiveTimeout => {
                    let was_empty = state.rx.is_empty();
                    // Drain hardware even when the queue is full: a byte
                    // left in the FIFO re-raises this interrupt forever.
                    // An overflowing byte is dropped.
                    while state.regs.rx_ready() {
                        let byte = state.regs.read_data();
                        let _ = state.rx.push(byte);
                    }
                    if was_empty && !state.rx.is_empty() {
                        Wakeup::Reschedule
                    } else {
                        Wakeup::None
                    }
                }
                UartIrqReason::None | UartIrqReason::Other => Wakeup::None,
            }
        })
    }
}

impl<R, C, const RX_CAP: usize, const TX_CAP: usize> IrqHandler
    for SerialLink<R, C, RX_CAP, TX_CAP>
where
    R: UartRegisters + Send,
    C: TickSource + Sync,
{
    fn on_irq(&self) -> Wakeup {
        self.on_interrupt()
    }
}
