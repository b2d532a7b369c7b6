//! Port 1 / Port 2 GPIO: push button on P1.3, indicator LED on P1.0

use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, OutputPin};
use relay_core::{EdgeInput, HalError};

use crate::registers::{addr, RegisterBus, BIT0, BIT3};

/// SCL and SDA pins, pulled up
const I2C_PINS: u8 = 0xC0;

/// Port configuration done once at startup
pub struct Port1;

impl Port1 {
    /// Pull-ups on P1.3, P1.6 and P1.7, every other pin an output driven
    /// low, P1.3 edge interrupt enabled, Port 2 all outputs low
    ///
    /// The edge-select register is left at its reset value. The flag for
    /// P1.3 is not cleared here; see [`Port1Edge::clear_pending`].
    pub fn init<B: RegisterBus>(bus: &B) {
        bus.write8(addr::P1OUT, I2C_PINS);
        bus.set_bits8(addr::P1OUT, BIT3);
        bus.set_bits8(addr::P1REN, I2C_PINS);
        bus.set_bits8(addr::P1REN, BIT3);
        bus.write8(addr::P1DIR, 0xFF);
        bus.clear_bits8(addr::P1DIR, BIT3);
        bus.set_bits8(addr::P1IE, BIT3);
        bus.write8(addr::P2OUT, 0x00);
        bus.write8(addr::P2DIR, 0xFF);
    }
}

/// Push button edge on P1.3
pub struct Port1Edge<B> {
    bus: B,
}

impl<B: RegisterBus> Port1Edge<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Whether an edge is latched
    pub fn pending(&self) -> bool {
        self.bus.read8(addr::P1IFG) & BIT3 != 0
    }

    pub fn interrupt_enabled(&self) -> bool {
        self.bus.read8(addr::P1IE) & BIT3 != 0
    }
}

impl<B: RegisterBus> EdgeInput for Port1Edge<B> {
    type Error = HalError;

    fn set_interrupt_enabled(&mut self, enabled: bool) -> Result<(), Self::Error> {
        self.bus.update_bits8(addr::P1IE, BIT3, enabled);
        Ok(())
    }

    fn clear_pending(&mut self) -> Result<(), Self::Error> {
        self.bus.clear_bits8(addr::P1IFG, BIT3);
        Ok(())
    }
}

/// LED on P1.0
pub struct Port1Led<B> {
    bus: B,
}

impl<B: RegisterBus> Port1Led<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn is_set_high(&self) -> bool {
        self.bus.read8(addr::P1OUT) & BIT0 != 0
    }
}

impl<B> ErrorType for Port1Led<B> {
    type Error = Infallible;
}

impl<B: RegisterBus> OutputPin for Port1Led<B> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.bus.clear_bits8(addr::P1OUT, BIT0);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.bus.set_bits8(addr::P1OUT, BIT0);
        Ok(())
    }
}
