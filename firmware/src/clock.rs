//! Watchdog, DCO calibration and the basic clock module

use relay_core::{Calibration, CalibrationSource, ClockControl};

use crate::registers::{addr, wdtctl, RegisterBus};

/// Stop the watchdog
pub fn hold_watchdog<B: RegisterBus>(bus: &B) {
    bus.write16(addr::WDTCTL, wdtctl::WDTPW | wdtctl::WDTHOLD);
}

/// Factory 1 MHz constants in info flash segment A
pub struct InfoFlashCalibration<B> {
    bus: B,
}

impl<B: RegisterBus> InfoFlashCalibration<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }
}

impl<B: RegisterBus> CalibrationSource for InfoFlashCalibration<B> {
    fn read(&mut self) -> Calibration {
        Calibration {
            bcs: self.bus.read8(addr::CALBC1_1MHZ),
            dco: self.bus.read8(addr::CALDCO_1MHZ),
        }
    }
}

/// DCO and basic clock control registers
pub struct BasicClock<B> {
    bus: B,
}

impl<B: RegisterBus> BasicClock<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }
}

impl<B: RegisterBus> ClockControl for BasicClock<B> {
    fn apply(&mut self, calibration: Calibration) {
        // Range first, then step and modulation
        self.bus.write8(addr::BCSCTL1, calibration.bcs);
        self.bus.write8(addr::DCOCTL, calibration.dco);
    }
}
