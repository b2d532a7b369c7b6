//! USI peripheral as an I2C master serial engine

use relay_core::{HalError, MasterConfig, SerialEngine, TransferWidth};

use crate::registers::{addr, usicnt, usickctl, usictl0, usictl1, RegisterBus};

/// USI in I2C master mode on P1.6 (SCL) and P1.7 (SDA)
pub struct UsiEngine<B> {
    bus: B,
}

impl<B: RegisterBus> UsiEngine<B> {
    /// Configure the USI for I2C master operation
    ///
    /// SCL runs from SMCLK divided by `2^scl_divider_log2`. The interrupt
    /// flag is left for software to clear, and starts cleared.
    pub fn init(bus: B, config: &MasterConfig) -> Self {
        bus.write8(addr::USICTL0, usictl0::USIPE6 | usictl0::USIPE7 | usictl0::USIMST | usictl0::USISWRST);
        bus.write8(addr::USICTL1, usictl1::USII2C | usictl1::USIIE);
        bus.write8(
            addr::USICKCTL,
            (config.scl_divider_log2 << usickctl::USIDIV_SHIFT) | usickctl::USISSEL_2 | usickctl::USICKPL,
        );
        bus.set_bits8(addr::USICNT, usicnt::USIIFGCC);
        bus.clear_bits8(addr::USICTL0, usictl0::USISWRST);
        bus.clear_bits8(addr::USICTL1, usictl1::USIIFG);
        debug!("USI ready, SCL {} Hz", config.scl_hz());
        Self { bus }
    }

    /// Whether the engine interrupt flag is raised
    pub fn pending(&self) -> bool {
        self.bus.read8(addr::USICTL1) & usictl1::USIIFG != 0
    }

    pub fn interrupt_enabled(&self) -> bool {
        self.bus.read8(addr::USICTL1) & usictl1::USIIE != 0
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<B: RegisterBus> SerialEngine for UsiEngine<B> {
    type Error = HalError;

    fn generate_start(&mut self) -> Result<(), Self::Error> {
        // MSB of the shift register is low, so opening the latch pulls SDA down
        self.bus.write8(addr::USISRL, 0x00);
        self.bus.set_bits8(addr::USICTL0, usictl0::USIGE | usictl0::USIOE);
        self.bus.clear_bits8(addr::USICTL0, usictl0::USIGE);
        Ok(())
    }

    fn load(&mut self, value: u8) -> Result<(), Self::Error> {
        self.bus.write8(addr::USISRL, value);
        Ok(())
    }

    fn start_transfer(&mut self, width: TransferWidth) -> Result<(), Self::Error> {
        self.bus
            .modify8(addr::USICNT, |cnt| (cnt & !usicnt::COUNT_MASK) | width.bits());
        Ok(())
    }

    fn received(&mut self) -> Result<u8, Self::Error> {
        Ok(self.bus.read8(addr::USISRL))
    }

    fn set_output_enable(&mut self, enabled: bool) -> Result<(), Self::Error> {
        self.bus.update_bits8(addr::USICTL0, usictl0::USIOE, enabled);
        Ok(())
    }

    fn release_bus(&mut self) -> Result<(), Self::Error> {
        // Latch 0xFF through so SDA rises while SCL is high
        self.bus.write8(addr::USISRL, 0xFF);
        self.bus.set_bits8(addr::USICTL0, usictl0::USIGE);
        self.bus.clear_bits8(addr::USICTL0, usictl0::USIGE | usictl0::USIOE);
        Ok(())
    }

    fn set_interrupt_enabled(&mut self, enabled: bool) -> Result<(), Self::Error> {
        self.bus.update_bits8(addr::USICTL1, usictl1::USIIE, enabled);
        Ok(())
    }

    fn set_pending(&mut self) -> Result<(), Self::Error> {
        self.bus.set_bits8(addr::USICTL1, usictl1::USIIFG);
        Ok(())
    }

    fn clear_pending(&mut self) -> Result<(), Self::Error> {
        self.bus.clear_bits8(addr::USICTL1, usictl1::USIIFG);
        Ok(())
    }
}
