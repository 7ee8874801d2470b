//! Interrupt line registration
//!
//! The platform's vector table is fixed at link time, but which driver
//! instance services which line is configuration. Board init populates an
//! [`IrqTable`] once; the per-vector stubs in the startup glue reduce to
//! `TABLE.dispatch(line)`. One binding owns exactly one line.

/// Identifier for one hardware interrupt line (NVIC position)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqLine(pub u16);

/// What the scheduler should do once the interrupt returns
///
/// Interrupt handlers never block and never yield themselves; they report
/// whether they made a blocked task runnable (a queue went empty to
/// non-empty, or a completion flag was raised) and the platform glue
/// performs the context switch after the handler exits.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wakeup {
    /// No task became runnable
    None,
    /// A blocked task may now proceed; reschedule on interrupt exit
    Reschedule,
}

/// Interrupt entry point of a driver instance
///
/// Runs in interrupt context: must not block, must not allocate.
pub trait IrqHandler: Sync {
    fn on_irq(&self) -> Wakeup;
}

/// Error binding a handler into the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BindError {
    /// The line already has a handler
    LineTaken,
    /// No free slot left in the table
    TableFull,
}

/// Registration table mapping interrupt line to handler
///
/// `N` is the number of bindable lines, fixed at construction.
pub struct IrqTable<'h, const N: usize> {
    entries: heapless::Vec<(IrqLine, &'h dyn IrqHandler), N>,
}

impl<'h, const N: usize> IrqTable<'h, N> {
    pub const fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
        }
    }

    /// Bind `handler` to `line`
    pub fn bind(&mut self, line: IrqLine, handler: &'h dyn IrqHandler) -> Result<(), BindError> {
        if self.is_bound(line) {
            return Err(BindError::LineTaken);
        }
        self.entries
            .push((line, handler))
            .map_err(|_| BindError::TableFull)
    }

    /// Is a handler bound to `line`?
    pub fn is_bound(&self, line: IrqLine) -> bool {
        self.entries.iter().any(|(l, _)| *l == line)
    }

    /// Route one interrupt to its handler
    ///
    /// An unbound line is ignored; spurious interrupts must not fault.
    pub fn dispatch(&self, line: IrqLine) -> Wakeup {
        match self.entries.iter().find(|(l, _)| *l == line) {
            Some((_, handler)) => handler.on_irq(),
            None => Wakeup::None,
        }
    }
}

impl<const N: usize> Default for IrqTable<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}
