#![no_std]
#![no_main]
#![feature(abi_msp430_interrupt)]

//! MSP430G2231 relay master: one I2C write to the relay board per cycle,
//! button on P1.3 steps through the 16 relay patterns

#[cfg(feature = "defmt")]
use defmt_rtt as _;
use panic_msp430 as _;

use msp430_rt::entry;
use relay_firmware::board;

#[entry]
fn main() -> ! {
    board::run(relay_firmware::relay_core::default_config())
}

// ========================================
// Interrupt vectors
// ========================================

/// Interrupt sources by slot in the vector table
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Interrupt {
    PORT1 = 2,
    PORT2 = 3,
    USI = 4,
    ADC10 = 5,
    TIMERA1 = 8,
    TIMERA0 = 9,
    WDT = 10,
    NMI = 14,
}

use self::Interrupt as interrupt;
use msp430_rt::interrupt;

// Wakes the foreground loop after every step; it goes back to sleep
// unless the transaction has completed
#[interrupt(wake_cpu)]
fn USI() {
    board::usi_interrupt();
}

#[interrupt]
fn PORT1() {
    board::port1_interrupt();
}

mod vectors {
    extern "msp430-interrupt" {
        fn PORT1();
        fn PORT2();
        fn USI();
        fn ADC10();
        fn TIMERA1();
        fn TIMERA0();
        fn WDT();
        fn NMI();
    }

    #[doc(hidden)]
    pub union Vector {
        _handler: unsafe extern "msp430-interrupt" fn(),
        _reserved: u16,
    }

    #[doc(hidden)]
    #[link_section = ".vector_table.interrupts"]
    #[no_mangle]
    #[used]
    pub static __INTERRUPTS: [Vector; 15] = [
        Vector { _reserved: 0 },
        Vector { _reserved: 0 },
        Vector { _handler: PORT1 },
        Vector { _handler: PORT2 },
        Vector { _handler: USI },
        Vector { _handler: ADC10 },
        Vector { _reserved: 0 },
        Vector { _reserved: 0 },
        Vector { _handler: TIMERA1 },
        Vector { _handler: TIMERA0 },
        Vector { _handler: WDT },
        Vector { _reserved: 0 },
        Vector { _reserved: 0 },
        Vector { _reserved: 0 },
        Vector { _handler: NMI },
    ];
}
