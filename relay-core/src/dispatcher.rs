//! Foreground cycle: arm a transaction, sleep until it is done, pause

use core::time::Duration;
use portable_atomic::{AtomicBool, Ordering};

use crate::hal::{duration_us, HalError};

/// Something that can start a fresh transaction
pub trait TransactionTrigger {
    /// Raise the serial-engine interrupt so the machine leaves `Start`
    fn arm(&mut self) -> Result<(), HalError>;
}

impl<T: TransactionTrigger + ?Sized> TransactionTrigger for &mut T {
    fn arm(&mut self) -> Result<(), HalError> {
        (**self).arm()
    }
}

/// Suspension point of the foreground loop
pub trait LowPowerWait {
    /// Sleep until the running transaction reports completion
    fn wait_for_completion(&mut self);
}

/// Set from interrupt context when a transaction has ended
pub struct CompletionFlag {
    done: AtomicBool,
}

impl CompletionFlag {
    pub const fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
        }
    }

    /// Mark the transaction finished (interrupt side)
    pub fn signal(&self) {
        self.done.store(true, Ordering::Release);
    }

    /// Consume the mark (foreground side)
    pub fn take(&self) -> bool {
        self.done.swap(false, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

impl Default for CompletionFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Main-loop driver: one transaction per cycle, separated by a fixed pause
pub struct CycleDispatcher<W, D> {
    wait: W,
    delay: D,
    cycle_delay: Duration,
    cycles: u32,
}

impl<W, D> CycleDispatcher<W, D>
where
    W: LowPowerWait,
    D: embedded_hal::delay::DelayNs,
{
    pub fn new(wait: W, delay: D, cycle_delay: Duration) -> Self {
        Self {
            wait,
            delay,
            cycle_delay,
            cycles: 0,
        }
    }

    /// Arm, sleep until completion, then pause
    pub fn run_cycle<T: TransactionTrigger>(&mut self, mut trigger: T) -> Result<(), HalError> {
        trigger.arm()?;
        self.wait.wait_for_completion();
        self.delay.delay_us(duration_us(self.cycle_delay));
        self.cycles = self.cycles.wrapping_add(1);
        trace!("Cycle {} done", self.cycles);
        Ok(())
    }

    /// Run cycles forever
    pub fn run<T: TransactionTrigger>(&mut self, mut trigger: T) -> ! {
        info!("Relay master cycling every {} us", duration_us(self.cycle_delay));
        loop {
            if let Err(err) = self.run_cycle(&mut trigger) {
                warn!("Cannot arm transaction: {}", err);
                self.delay.delay_us(duration_us(self.cycle_delay));
            }
        }
    }

    /// Completed cycles
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn wait(&self) -> &W {
        &self.wait
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }
}
