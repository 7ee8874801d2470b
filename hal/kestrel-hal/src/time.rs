//! Timeout bookkeeping for blocking operations
//!
//! Every blocking driver operation is bounded by a [`Timeout`]. The
//! driver turns it into a [`Deadline`] against a monotonic [`TickSource`]
//! and checks it between attempts, parking on the tick source in between
//! so the platform can suspend the caller instead of burning the CPU.

/// Monotonic millisecond tick source
///
/// Implemented by the platform (SysTick, RTOS tick, ...). Only required
/// to be monotonic; the epoch is arbitrary.
pub trait TickSource {
    /// Milliseconds elapsed since an arbitrary epoch
    fn now_ms(&self) -> u64;

    /// Give up the CPU until it is worth polling again
    ///
    /// Called between attempts of a bounded wait, from task context
    /// only. Platforms with a scheduler suspend the calling task here
    /// (RTOS delay, WFI); the default is a spin hint for bare setups
    /// with nothing to yield to.
    fn park(&self) {
        core::hint::spin_loop();
    }
}

impl<T: TickSource> TickSource for &T {
    fn now_ms(&self) -> u64 {
        (*self).now_ms()
    }

    fn park(&self) {
        (*self).park()
    }
}

/// Bound on a blocking operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Timeout {
    /// Give up after this many milliseconds. `Millis(0)` degenerates to
    /// a single non-blocking attempt.
    Millis(u32),
    /// Wait without bound. Callers opt into this explicitly; no driver
    /// operation defaults to it.
    Forever,
}

/// A resolved timeout: the tick at which a wait gives up
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Option<u64>,
}

impl Deadline {
    /// Resolve `timeout` against the current tick
    pub fn after(clock: &impl TickSource, timeout: Timeout) -> Self {
        let expires_at = match timeout {
            Timeout::Millis(ms) => Some(clock.now_ms().saturating_add(u64::from(ms))),
            Timeout::Forever => None,
        };
        Self { expires_at }
    }

    /// Has the deadline passed?
    pub fn reached(&self, clock: &impl TickSource) -> bool {
        match self.expires_at {
            Some(at) => clock.now_ms() >= at,
            None => false,
        }
    }
}
