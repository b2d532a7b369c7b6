#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "msp430", feature(asm_experimental_arch))]

//! Board support for the MSP430G2231 relay master
//!
//! Register-level drivers for the USI, Port 1, the basic clock module and
//! the CPU's low-power mode, plus the glue that wires them into
//! [`relay_core::RelayMaster`] for the two interrupt handlers and the
//! foreground loop.

#[macro_use]
mod macros;

pub mod registers;
pub mod usi;
pub mod port;
pub mod clock;
pub mod cpu;
pub mod board;

pub use registers::{Mmio, RegisterBus};
pub use usi::UsiEngine;
pub use port::{Port1, Port1Edge, Port1Led};
pub use clock::{hold_watchdog, BasicClock, InfoFlashCalibration};
pub use cpu::{CycleDelay, Lpm0Wait};
pub use board::{BoardMaster, COMPLETION, MASTER};

pub use relay_core;
