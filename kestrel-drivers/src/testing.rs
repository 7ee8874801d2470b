//! Mock register harness for the driver test suites
//!
//! `MockUart` and `MockBus` stand in for real register blocks: the tests
//! script interrupt reasons and slave behavior, run the drivers exactly
//! as the target would, and inspect what "hardware" observed. `TestClock`
//! replaces the platform tick source; with auto-advance enabled each
//! reading moves time forward, so bounded waits expire after a known
//! number of polls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::vec::Vec;

use kestrel_hal::i2c::{BusEvent, I2cRegisters};
use kestrel_hal::time::TickSource;
use kestrel_hal::uart::{UartIrqReason, UartRegisters};
use kestrel_hal::ConfigError;

use crate::bus::BusMaster;

/// Controllable monotonic clock
#[derive(Clone, Default)]
pub struct TestClock(Arc<ClockState>);

#[derive(Default)]
struct ClockState {
    now: AtomicU64,
    step: AtomicU64,
}

impl TestClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance time by `ms` per reading; simulates ticks elapsing while
    /// a driver polls its deadline
    pub fn auto_advance(&self, ms: u64) {
        self.0.step.store(ms, Ordering::Relaxed);
    }
}

impl TickSource for TestClock {
    fn now_ms(&self) -> u64 {
        let step = self.0.step.load(Ordering::Relaxed);
        self.0.now.fetch_add(step, Ordering::Relaxed)
    }

    fn park(&self) {
        thread::yield_now();
    }
}

/// Clock that records how often a blocked wait gave up the CPU
///
/// Time advances one tick per reading, so bounded waits expire on their
/// own.
#[derive(Default)]
pub struct ParkingClock {
    now: AtomicU64,
    parks: AtomicUsize,
}

impl ParkingClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parks(&self) -> usize {
        self.parks.load(Ordering::Relaxed)
    }
}

impl TickSource for ParkingClock {
    fn now_ms(&self) -> u64 {
        self.now.fetch_add(1, Ordering::Relaxed)
    }

    fn park(&self) {
        self.parks.fetch_add(1, Ordering::Relaxed);
    }
}

/// Scriptable UART register block
#[derive(Clone, Default)]
pub struct MockUart(Arc<Mutex<UartState>>);

#[derive(Default)]
struct UartState {
    reasons: VecDeque<UartIrqReason>,
    rx_fifo: VecDeque<u8>,
    written: Vec<u8>,
    configured: Option<(u32, u32)>,
}

impl MockUart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch an interrupt reason for the next `irq_reason` read
    pub fn raise(&self, reason: UartIrqReason) {
        self.0.lock().unwrap().reasons.push_back(reason);
    }

    /// Place received bytes in the hardware FIFO
    pub fn inject_rx(&self, bytes: &[u8]) {
        self.0.lock().unwrap().rx_fifo.extend(bytes);
    }

    /// Everything written to the transmit register, in order
    pub fn written(&self) -> Vec<u8> {
        self.0.lock().unwrap().written.clone()
    }

    pub fn rx_pending(&self) -> bool {
        !self.0.lock().unwrap().rx_fifo.is_empty()
    }

    /// Last (clock, baud) pair accepted by `configure`
    pub fn configured(&self) -> Option<(u32, u32)> {
        self.0.lock().unwrap().configured
    }
}

impl UartRegisters for MockUart {
    fn configure(&mut self, clock_hz: u32, baudrate: u32) -> Result<(), ConfigError> {
        if baudrate == 0 {
            return Err(ConfigError::BaudRate);
        }
        self.0.lock().unwrap().configured = Some((clock_hz, baudrate));
        Ok(())
    }

    fn irq_reason(&mut self) -> UartIrqReason {
        self.0
            .lock()
            .unwrap()
            .reasons
            .pop_front()
            .unwrap_or(UartIrqReason::None)
    }

    fn rx_ready(&self) -> bool {
        !self.0.lock().unwrap().rx_fifo.is_empty()
    }

    fn read_data(&mut self) -> u8 {
        self.0.lock().unwrap().rx_fifo.pop_front().unwrap_or(0)
    }

    fn write_data(&mut self, byte: u8) {
        self.0.lock().unwrap().written.push(byte);
    }
}

/// Where the simulated slave is in the wire protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WirePhase {
    Idle,
    /// Start sent, next written byte is the address
    AwaitAddress,
    /// Addressed for write, next written byte is the register pointer
    AwaitPointer,
    /// Writing payload into the register file
    WriteData,
    /// Clocking bytes out of the register file
    ReadData,
}

/// Simulated I2C controller wired to one slave with a register file
///
/// The slave auto-increments its register pointer per byte, echoing what
/// register-file devices do on a real bus. `set_dead` silences the
/// controller entirely (no events, ever) to exercise the timeout path;
/// `set_present(false)` NACKs the address instead.
#[derive(Clone, Default)]
pub struct MockBus(Arc<Mutex<BusHw>>);

struct BusHw {
    registers: [u8; 256],
    pointer: u8,
    present: bool,
    dead: bool,
    phase: WirePhase,
    ack_next: bool,
    events: VecDeque<BusEvent>,
    stops: usize,
    resets: usize,
    acked_reads: usize,
    configured: Option<(u32, u32)>,
}

impl Default for BusHw {
    fn default() -> Self {
        Self {
            registers: [0; 256],
            pointer: 0,
            present: true,
            dead: false,
            phase: WirePhase::Idle,
            ack_next: false,
            events: VecDeque::new(),
            stops: 0,
            resets: 0,
            acked_reads: 0,
            configured: None,
        }
    }
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload the slave's register file starting at `first`
    pub fn load_registers(&self, first: u8, values: &[u8]) {
        let mut hw = self.0.lock().unwrap();
        for (i, &v) in values.iter().enumerate() {
            hw.registers[first as usize + i] = v;
        }
    }

    /// Latch an event directly, as leftover controller state would
    pub fn raise(&self, event: BusEvent) {
        self.0.lock().unwrap().events.push_back(event);
    }

    pub fn set_present(&self, present: bool) {
        self.0.lock().unwrap().present = present;
    }

    pub fn set_dead(&self, dead: bool) {
        self.0.lock().unwrap().dead = dead;
    }

    pub fn stops(&self) -> usize {
        self.0.lock().unwrap().stops
    }

    pub fn resets(&self) -> usize {
        self.0.lock().unwrap().resets
    }

    /// Received bytes the master ACKed (multi-byte reads ACK all but the
    /// final byte)
    pub fn acked_reads(&self) -> usize {
        self.0.lock().unwrap().acked_reads
    }

    /// Last (clock, bus rate) pair accepted by `configure`
    pub fn configured(&self) -> Option<(u32, u32)> {
        self.0.lock().unwrap().configured
    }
}

impl I2cRegisters for MockBus {
    fn configure(&mut self, clock_hz: u32, bus_rate_hz: u32) -> Result<(), ConfigError> {
        self.0.lock().unwrap().configured = Some((clock_hz, bus_rate_hz));
        Ok(())
    }

    fn event(&mut self) -> BusEvent {
        let mut hw = self.0.lock().unwrap();
        if hw.dead {
            return BusEvent::None;
        }
        hw.events.pop_front().unwrap_or(BusEvent::None)
    }

    fn start(&mut self) {
        let mut hw = self.0.lock().unwrap();
        if hw.dead {
            return;
        }
        hw.phase = WirePhase::AwaitAddress;
        hw.events.push_back(BusEvent::StartSent);
    }

    fn repeated_start(&mut self) {
        let mut hw = self.0.lock().unwrap();
        if hw.dead {
            return;
        }
        hw.phase = WirePhase::AwaitAddress;
        hw.events.push_back(BusEvent::RepeatedStartSent);
    }

    fn stop(&mut self) {
        let mut hw = self.0.lock().unwrap();
        hw.phase = WirePhase::Idle;
        hw.stops += 1;
    }

    fn write_byte(&mut self, byte: u8) {
        let mut hw = self.0.lock().unwrap();
        if hw.dead {
            return;
        }
        match hw.phase {
            WirePhase::AwaitAddress => {
                if !hw.present {
                    hw.phase = WirePhase::Idle;
                    hw.events.push_back(BusEvent::AddressNacked);
                } else if byte & 1 == 1 {
                    hw.phase = WirePhase::ReadData;
                    hw.events.push_back(BusEvent::AddressAckedRead);
                } else {
                    hw.phase = WirePhase::AwaitPointer;
                    hw.events.push_back(BusEvent::AddressAckedWrite);
                }
            }
            WirePhase::AwaitPointer => {
                hw.pointer = byte;
                hw.phase = WirePhase::WriteData;
                hw.events.push_back(BusEvent::DataAcked);
            }
            WirePhase::WriteData => {
                let pointer = hw.pointer as usize;
                hw.registers[pointer] = byte;
                hw.pointer = hw.pointer.wrapping_add(1);
                hw.events.push_back(BusEvent::DataAcked);
            }
            WirePhase::Idle | WirePhase::ReadData => {}
        }
    }

    fn read_byte(&mut self) -> u8 {
        let mut hw = self.0.lock().unwrap();
        let byte = hw.registers[hw.pointer as usize];
        hw.pointer = hw.pointer.wrapping_add(1);
        byte
    }

    fn set_ack(&mut self, ack: bool) {
        self.0.lock().unwrap().ack_next = ack;
    }

    fn clear_irq(&mut self) {
        let mut hw = self.0.lock().unwrap();
        // Releasing the clock while addressed for read shifts the next
        // byte in; whether the controller ACKs it was chosen beforehand.
        if hw.phase == WirePhase::ReadData && hw.events.is_empty() {
            let event = if hw.ack_next {
                hw.acked_reads += 1;
                BusEvent::ByteReceivedAcked
            } else {
                BusEvent::ByteReceivedNacked
            };
            hw.events.push_back(event);
        }
    }

    fn bus_reset(&mut self) {
        let mut hw = self.0.lock().unwrap();
        hw.phase = WirePhase::Idle;
        hw.events.clear();
        hw.resets += 1;
    }
}

/// Run `op` on a worker thread while servicing bus interrupts, the way
/// the platform's interrupt dispatch would
pub fn pump_bus<T: Send>(
    master: &BusMaster<MockBus, TestClock>,
    op: impl FnOnce() -> T + Send,
) -> T {
    thread::scope(|s| {
        let worker = s.spawn(op);
        while !worker.is_finished() {
            let _ = master.on_interrupt();
            thread::yield_now();
        }
        worker.join().unwrap()
    })
}
