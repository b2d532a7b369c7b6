#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! # Relay Core
//!
//! I2C relay master core logic for shift-register serial engines.
//! Drives single-byte master write transactions one protocol step per
//! serial-engine interrupt, with an edge-triggered input that advances the
//! relay-control word between transactions.

#[macro_use]
mod macros;

pub mod types;
pub mod hal;
pub mod fsm;
pub mod input;
pub mod controller;
pub mod dispatcher;
pub mod startup;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;


pub use types::*;
pub use fsm::*;
pub use input::*;
pub use controller::*;
pub use dispatcher::*;
pub use startup::*;
pub use hal::{HalError, SerialEngine, EdgeInput, IndicatorOutput};

/// Relay core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration for the relay board (slave 0x48, 1 MHz SMCLK)
pub fn default_config() -> MasterConfig {
    MasterConfig::default()
}
