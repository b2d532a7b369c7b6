//! Host-side test support for the relay master
//!
//! Test modules live behind `cfg(test)`; the helpers below are shared with
//! the `integration_tests` scenario runner.

use std::cell::RefCell;
use std::time::Duration;

use relay_core::AckBit;
use relay_firmware::registers::{addr, usicnt, usictl0, usictl1};
use relay_firmware::RegisterBus;

/// Async delay backed by the tokio timer
#[derive(Debug, Default)]
pub struct TokioDelay;

impl embedded_hal_async::delay::DelayNs for TokioDelay {
    async fn delay_ns(&mut self, ns: u32) {
        tokio::time::sleep(Duration::from_nanos(u64::from(ns))).await;
    }

    async fn delay_us(&mut self, us: u32) {
        tokio::time::sleep(Duration::from_micros(u64::from(us))).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        tokio::time::sleep(Duration::from_millis(u64::from(ms))).await;
    }
}

/// MSP430 register file with a behavioural USI and one I2C slave
///
/// Writes land in memory like on the chip. [`UsiSim::clock_out`] plays the
/// part of the USI hardware: it shifts the programmed number of bits and
/// raises the interrupt flag.
pub struct UsiSim {
    memory: RefCell<Vec<u8>>,
    slave: RefCell<Vec<AckBit>>,
    bytes: RefCell<Vec<u8>>,
}

impl UsiSim {
    pub fn new() -> Self {
        let sim = Self {
            memory: RefCell::new(vec![0; 0x1100]),
            slave: RefCell::new(Vec::new()),
            bytes: RefCell::new(Vec::new()),
        };
        // Factory calibration for 1 MHz
        sim.poke(addr::CALBC1_1MHZ, 0x86);
        sim.poke(addr::CALDCO_1MHZ, 0xB4);
        sim
    }

    /// Queue slave answers; once empty the slave acknowledges
    pub fn script(&self, answers: &[AckBit]) {
        self.slave.borrow_mut().extend_from_slice(answers);
    }

    pub fn poke(&self, address: u16, value: u8) {
        self.memory.borrow_mut()[usize::from(address)] = value;
    }

    pub fn peek(&self, address: u16) -> u8 {
        self.memory.borrow()[usize::from(address)]
    }

    /// Bytes the master shifted out
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.borrow().clone()
    }

    pub fn flag_raised(&self) -> bool {
        self.peek(addr::USICTL1) & usictl1::USIIFG != 0
    }

    /// Run the programmed transfer; false if the counter was not loaded
    pub fn clock_out(&self) -> bool {
        let count = self.peek(addr::USICNT) & usicnt::COUNT_MASK;
        if count == 0 {
            return false;
        }

        let shift = self.peek(addr::USISRL);
        if self.peek(addr::USICTL0) & usictl0::USIOE != 0 {
            if count == 8 {
                self.bytes.borrow_mut().push(shift);
            }
        } else {
            let answer = {
                let mut slave = self.slave.borrow_mut();
                if slave.is_empty() {
                    AckBit::Ack
                } else {
                    slave.remove(0)
                }
            };
            self.poke(addr::USISRL, (shift << 1) | answer.bit());
        }

        self.poke(addr::USICNT, self.peek(addr::USICNT) & !usicnt::COUNT_MASK);
        self.poke(addr::USICTL1, self.peek(addr::USICTL1) | usictl1::USIIFG);
        true
    }
}

impl Default for UsiSim {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBus for UsiSim {
    fn read8(&self, address: u16) -> u8 {
        self.peek(address)
    }

    fn write8(&self, address: u16, value: u8) {
        self.poke(address, value);
    }

    fn write16(&self, address: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.poke(address, lo);
        self.poke(address + 1, hi);
    }
}

#[cfg(test)]
mod transaction_tests;


#[cfg(test)]
mod dispatcher_tests;

#[cfg(test)]
mod property_tests;

#[cfg(test)]
mod board_tests;
