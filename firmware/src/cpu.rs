//! CPU-level services: busy-wait delay and LPM0 sleep

use relay_core::{CompletionFlag, LowPowerWait};

/// Status register bits
#[cfg_attr(not(target_arch = "msp430"), allow(dead_code))]
const GIE: u16 = 0x0008;
#[cfg_attr(not(target_arch = "msp430"), allow(dead_code))]
const CPUOFF: u16 = 0x0010;

/// Cycles spent by one iteration of the spin loop
const CYCLES_PER_SPIN: u32 = 4;

/// Blocking delay that counts CPU cycles at a fixed MCLK
#[derive(Copy, Clone, Debug)]
pub struct CycleDelay {
    cpu_hz: u32,
}

impl CycleDelay {
    pub const fn new(cpu_hz: u32) -> Self {
        Self { cpu_hz }
    }

    /// Spin-loop iterations for a delay of `ns`
    pub fn spins_for_ns(&self, ns: u32) -> u32 {
        let cycles = u64::from(ns) * u64::from(self.cpu_hz) / 1_000_000_000;
        u32::try_from(cycles / u64::from(CYCLES_PER_SPIN)).unwrap_or(u32::MAX)
    }
}

impl embedded_hal::delay::DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        for _ in 0..self.spins_for_ns(ns) {
            spin();
        }
    }
}

#[cfg(target_arch = "msp430")]
#[inline(always)]
fn spin() {
    msp430::asm::nop();
}

#[cfg(not(target_arch = "msp430"))]
#[inline(always)]
fn spin() {
    core::hint::spin_loop();
}

/// Sleep in LPM0 until the completion flag is raised
///
/// The flag is checked with interrupts masked, and sleep is entered by
/// setting GIE and CPUOFF in a single instruction, so a completion that
/// lands between the check and the sleep still wakes the CPU.
pub struct Lpm0Wait<'a> {
    completion: &'a CompletionFlag,
}

impl<'a> Lpm0Wait<'a> {
    pub const fn new(completion: &'a CompletionFlag) -> Self {
        Self { completion }
    }
}

impl LowPowerWait for Lpm0Wait<'_> {
    fn wait_for_completion(&mut self) {
        loop {
            disable_interrupts();
            if self.completion.take() {
                enable_interrupts();
                return;
            }
            sleep_with_interrupts();
        }
    }
}

#[cfg(target_arch = "msp430")]
fn disable_interrupts() {
    msp430::interrupt::disable();
}

#[cfg(target_arch = "msp430")]
pub(crate) fn enable_interrupts() {
    // SAFETY: only called from the foreground loop, outside any critical section
    unsafe { msp430::interrupt::enable() };
}

#[cfg(target_arch = "msp430")]
fn sleep_with_interrupts() {
    // SAFETY: interrupt handlers clear CPUOFF in the saved status register on exit
    unsafe {
        core::arch::asm!(
            "bis.w #{bits}, r2",
            "nop",
            bits = const GIE | CPUOFF,
            options(nostack),
        );
    }
}

#[cfg(not(target_arch = "msp430"))]
fn disable_interrupts() {}

#[cfg(not(target_arch = "msp430"))]
pub(crate) fn enable_interrupts() {}

#[cfg(not(target_arch = "msp430"))]
fn sleep_with_interrupts() {
    core::hint::spin_loop();
}
