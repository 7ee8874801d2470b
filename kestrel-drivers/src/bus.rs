//! I2C bus master
//!
//! [`BusMaster`] performs short addressed register transactions against
//! slave devices on a shared two-wire bus. Task context populates a
//! single reusable transaction frame, kicks off the transfer, and waits
//! (bounded) on a completion flag; the interrupt handler advances a state
//! machine one bus event at a time until a terminal state raises the
//! flag.
//!
//! Callers are serialized by a per-bus lock, so at most one frame is in
//! flight per physical bus. While a transaction runs the frame belongs to
//! the interrupt handler alone; the lock holder reads it back only after
//! the completion flag.
//!
//! A transaction that produces no completion within
//! [`I2C_READ_TIMEOUT_MS`] is treated as a bus hang: the controller is
//! forced to issue a stop, reset to idle, and the caller gets
//! [`BusError::Timeout`] with the lock released, so the next transaction
//! starts from a clean bus instead of a wedged one.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;
use kestrel_hal::i2c::{BusError, BusEvent, I2cRegisters};
use kestrel_hal::irq::{IrqHandler, Wakeup};
use kestrel_hal::time::{Deadline, TickSource, Timeout};
use kestrel_hal::ConfigError;

/// Upper bound on one transaction, start to completion flag
pub const I2C_READ_TIMEOUT_MS: u32 = 100;

/// Fixed frame buffer size; this driver moves short register payloads,
/// not bulk data
pub const FRAME_MAX_DATA: usize = 4;

/// Direction/shape of one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum TransferMode {
    /// Address phase only; answers "is anything there?"
    Probe,
    Write,
    Read,
}

/// State machine position, advanced only by the interrupt handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum BusPhase {
    Idle,
    /// Start sent, device address going out (initial write-mode
    /// addressing, or read-mode re-addressing after a repeated start)
    Addressing,
    /// Register pointer byte going out
    WritingPointer,
    /// Payload bytes moving, one per interrupt
    TransferringData,
    ReadComplete,
    WriteComplete,
    Error,
}

/// One in-flight transaction; reused across calls, stale in between
struct TransactionFrame {
    /// 7-bit device address
    device: u8,
    /// First register to read or write
    register: u8,
    mode: TransferMode,
    buffer: [u8; FRAME_MAX_DATA],
    count: usize,
    cursor: usize,
    error: Option<BusError>,
}

impl TransactionFrame {
    const fn idle() -> Self {
        Self {
            device: 0,
            register: 0,
            mode: TransferMode::Probe,
            buffer: [0; FRAME_MAX_DATA],
            count: 0,
            cursor: 0,
            error: None,
        }
    }
}

struct BusState<R> {
    regs: R,
    phase: BusPhase,
    frame: TransactionFrame,
}

impl<R: I2cRegisters> BusState<R> {
    /// Advance on one bus event; returns true on reaching a terminal
    /// state (completion flag should be raised)
    fn step(&mut self, event: BusEvent) -> bool {
        use BusEvent::*;

        match (self.phase, event) {
            (BusPhase::Addressing, StartSent) => {
                self.regs.write_byte(self.frame.device << 1);
                self.regs.clear_irq();
                false
            }
            (BusPhase::Addressing, RepeatedStartSent) => {
                self.regs.write_byte((self.frame.device << 1) | 1);
                self.regs.clear_irq();
                false
            }
            (BusPhase::Addressing, AddressAckedWrite) => match self.frame.mode {
                TransferMode::Probe => self.finish(BusPhase::WriteComplete),
                TransferMode::Write | TransferMode::Read => {
                    self.phase = BusPhase::WritingPointer;
                    self.regs.write_byte(self.frame.register);
                    self.regs.clear_irq();
                    false
                }
            },
            (BusPhase::Addressing, AddressAckedRead) => {
                self.phase = BusPhase::TransferringData;
                // NACK the very next byte when it is also the last.
                self.regs.set_ack(self.frame.count > 1);
                self.regs.clear_irq();
                false
            }
            (BusPhase::WritingPointer, DataAcked) => match self.frame.mode {
                TransferMode::Write => {
                    self.phase = BusPhase::TransferringData;
                    self.regs.write_byte(self.frame.buffer[self.frame.cursor]);
                    self.regs.clear_irq();
                    false
                }
                TransferMode::Read => {
                    self.phase = BusPhase::Addressing;
                    self.regs.repeated_start();
                    self.regs.clear_irq();
                    false
                }
                TransferMode::Probe => self.fail(BusError::Bus),
            },
            (BusPhase::TransferringData, DataAcked) => {
                self.frame.cursor += 1;
                if self.frame.cursor >= self.frame.count {
                    self.finish(BusPhase::WriteComplete)
                } else {
                    self.regs.write_byte(self.frame.buffer[self.frame.cursor]);
                    self.regs.clear_irq();
                    false
                }
            }
            (BusPhase::TransferringData, ByteReceivedAcked) => {
                let byte = self.regs.read_byte();
                self.frame.buffer[self.frame.cursor] = byte;
                self.frame.cursor += 1;
                self.regs.set_ack(self.frame.cursor + 1 < self.frame.count);
                self.regs.clear_irq();
                false
            }
            (BusPhase::TransferringData, ByteReceivedNacked) => {
                let byte = self.regs.read_byte();
                self.frame.buffer[self.frame.cursor] = byte;
                self.frame.cursor += 1;
                self.finish(BusPhase::ReadComplete)
            }
            // An event with no transaction in flight (leftover hardware
            // state after a timeout recovery) must not issue a stop or
            // raise the completion flag.
            (BusPhase::Idle, _) => {
                self.regs.clear_irq();
                false
            }
            (_, AddressNacked) | (_, DataNacked) => self.fail(BusError::Nack),
            (_, ArbitrationLost) => self.fail(BusError::ArbitrationLost),
            (_, BusFault) => self.fail(BusError::Bus),
            // Stale or out-of-order event: acknowledge and wait for one
            // that fits the current phase.
            (_, _) => {
                self.regs.clear_irq();
                false
            }
        }
    }

    fn finish(&mut self, phase: BusPhase) -> bool {
        self.regs.stop();
        self.regs.clear_irq();
        self.phase = phase;
        true
    }

    fn fail(&mut self, error: BusError) -> bool {
        self.regs.stop();
        self.regs.clear_irq();
        self.frame.error = Some(error);
        self.phase = BusPhase::Error;
        true
    }
}

/// Interrupt-driven I2C master over one controller register block
///
/// One master owns one register block, one interrupt line, and one
/// physical bus. Independent masters (separate buses) run concurrently.
pub struct BusMaster<R, C> {
    state: Mutex<RefCell<BusState<R>>>,
    /// Raised by the interrupt handler on a terminal state
    complete: AtomicBool,
    /// Task-level bus lock; one transaction in flight at a time
    locked: AtomicBool,
    clock: C,
}

/// Releases the bus lock when the transaction path unwinds
struct BusGuard<'a> {
    locked: &'a AtomicBool,
}

impl Drop for BusGuard<'_> {
    fn drop(&mut self) {
        self.locked.store(false, Ordering::Release);
    }
}

impl<R, C> BusMaster<R, C>
where
    R: I2cRegisters,
    C: TickSource,
{
    pub fn new(regs: R, clock: C) -> Self {
        Self {
            state: Mutex::new(RefCell::new(BusState {
                regs,
                phase: BusPhase::Idle,
                frame: TransactionFrame::idle(),
            })),
            complete: AtomicBool::new(false),
            locked: AtomicBool::new(false),
            clock,
        }
    }

    /// Enable the controller at the requested SCL rate
    pub fn init(&self, clock_hz: u32, bus_rate_hz: u32) -> Result<(), ConfigError> {
        if !(1_000..=1_000_000).contains(&bus_rate_hz) {
            return Err(ConfigError::BusRate);
        }
        critical_section::with(|cs| {
            self.state
                .borrow_ref_mut(cs)
                .regs
                .configure(clock_hz, bus_rate_hz)
        })
    }

    /// Read one register
    pub fn read_register(&self, device: u8, register: u8) -> Result<u8, BusError> {
        let frame = self.transact(device, register, TransferMode::Read, &[], 1)?;
        Ok(frame[0])
    }

    /// Write one register
    pub fn write_register(&self, device: u8, register: u8, value: u8) -> Result<(), BusError> {
        self.transact(device, register, TransferMode::Write, &[value], 1)
            .map(|_| ())
    }

    /// Read consecutive registers starting at `first_register`
    ///
    /// At most [`FRAME_MAX_DATA`] bytes. Relies on the device
    /// auto-incrementing its register pointer per byte, which nearly all
    /// register-file devices do; this driver does not enforce it.
    pub fn read_registers(
        &self,
        device: u8,
        first_register: u8,
        out: &mut [u8],
    ) -> Result<(), BusError> {
        if out.is_empty() || out.len() > FRAME_MAX_DATA {
            return Err(BusError::Config);
        }
        let frame = self.transact(device, first_register, TransferMode::Read, &[], out.len())?;
        out.copy_from_slice(&frame[..out.len()]);
        Ok(())
    }

    /// Does any device acknowledge this address?
    ///
    /// Address-only transaction; useful for bus scans and for devices
    /// that NACK while internally busy (EEPROM write cycles).
    pub fn probe_device(&self, device: u8) -> Result<bool, BusError> {
        match self.transact(device, 0, TransferMode::Probe, &[], 0) {
            Ok(_) => Ok(true),
            Err(BusError::Nack) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Service one I2C interrupt: advance the state machine one event
    pub fn on_interrupt(&self) -> Wakeup {
        let terminal = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let event = state.regs.event();
            if event == BusEvent::None {
                return false;
            }
            state.step(event)
        });
        if terminal {
            self.complete.store(true, Ordering::Release);
            Wakeup::Reschedule
        } else {
            Wakeup::None
        }
    }

    fn acquire(&self) -> Result<BusGuard<'_>, BusError> {
        let deadline = Deadline::after(&self.clock, Timeout::Millis(I2C_READ_TIMEOUT_MS));
        while self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            if deadline.reached(&self.clock) {
                return Err(BusError::Timeout);
            }
            self.clock.park();
        }
        Ok(BusGuard {
            locked: &self.locked,
        })
    }

    /// Run one transaction end to end
    fn transact(
        &self,
        device: u8,
        register: u8,
        mode: TransferMode,
        payload: &[u8],
        count: usize,
    ) -> Result<[u8; FRAME_MAX_DATA], BusError> {
        if count > FRAME_MAX_DATA || payload.len() > FRAME_MAX_DATA {
            return Err(BusError::Config);
        }
        let _guard = self.acquire()?;

        self.complete.store(false, Ordering::Release);
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let mut buffer = [0; FRAME_MAX_DATA];
            buffer[..payload.len()].copy_from_slice(payload);
            state.frame = TransactionFrame {
                device,
                register,
                mode,
                buffer,
                count,
                cursor: 0,
                error: None,
            };
            state.phase = BusPhase::Addressing;
            state.regs.start();
        });

        let deadline = Deadline::after(&self.clock, Timeout::Millis(I2C_READ_TIMEOUT_MS));
        loop {
            if self.complete.swap(false, Ordering::AcqRel) {
                return critical_section::with(|cs| {
                    let mut state = self.state.borrow_ref_mut(cs);
                    let result = match state.phase {
                        BusPhase::ReadComplete | BusPhase::WriteComplete => Ok(state.frame.buffer),
                        _ => Err(state.frame.error.unwrap_or(BusError::Bus)),
                    };
                    state.phase = BusPhase::Idle;
                    result
                });
            }
            if deadline.reached(&self.clock) {
                // Bus hang: force the controller idle so the next caller
                // starts from a released bus, then report the timeout.
                critical_section::with(|cs| {
                    let mut state = self.state.borrow_ref_mut(cs);
                    state.regs.stop();
                    state.regs.bus_reset();
                    state.frame.error = Some(BusError::Timeout);
                    state.phase = BusPhase::Idle;
                });
                self.complete.store(false, Ordering::Release);
                return Err(BusError::Timeout);
            }
            self.clock.park();
        }
    }
}

impl<R, C> IrqHandler for BusMaster<R, C>
where
    R: I2cRegisters + Send,
    C: TickSource + Sync,
{
    fn on_irq(&self) -> Wakeup {
        self.on_interrupt()
    }
}
