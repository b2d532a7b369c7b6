//! MSP430G2231 peripheral register map and bus access
//!
//! Drivers talk to registers through [`RegisterBus`] so they can run on the
//! host against an in-memory register file.

/// Peripheral register addresses
pub mod addr {
    pub const P1IN: u16 = 0x0020;
    pub const P1OUT: u16 = 0x0021;
    pub const P1DIR: u16 = 0x0022;
    pub const P1IFG: u16 = 0x0023;
    pub const P1IES: u16 = 0x0024;
    pub const P1IE: u16 = 0x0025;
    pub const P1REN: u16 = 0x0027;
    pub const P2OUT: u16 = 0x0029;
    pub const P2DIR: u16 = 0x002A;

    pub const DCOCTL: u16 = 0x0056;
    pub const BCSCTL1: u16 = 0x0057;

    pub const USICTL0: u16 = 0x0078;
    pub const USICTL1: u16 = 0x0079;
    pub const USICKCTL: u16 = 0x007A;
    pub const USICNT: u16 = 0x007B;
    pub const USISRL: u16 = 0x007C;

    /// 16-bit, password protected
    pub const WDTCTL: u16 = 0x0120;

    /// Info flash segment A
    pub const CALDCO_1MHZ: u16 = 0x10FE;
    pub const CALBC1_1MHZ: u16 = 0x10FF;
}

/// USICTL0 bits
pub mod usictl0 {
    pub const USIPE7: u8 = 0x80;
    pub const USIPE6: u8 = 0x40;
    pub const USIMST: u8 = 0x08;
    /// Output latch transparent
    pub const USIGE: u8 = 0x04;
    pub const USIOE: u8 = 0x02;
    pub const USISWRST: u8 = 0x01;
}

/// USICTL1 bits
pub mod usictl1 {
    pub const USII2C: u8 = 0x40;
    pub const USIIE: u8 = 0x10;
    pub const USIIFG: u8 = 0x01;
}

/// USICKCTL fields
pub mod usickctl {
    pub const USIDIV_SHIFT: u8 = 5;
    /// SMCLK
    pub const USISSEL_2: u8 = 0x08;
    /// Inactive SCL high
    pub const USICKPL: u8 = 0x02;
}

/// USICNT fields
pub mod usicnt {
    /// Flag is only cleared by software
    pub const USIIFGCC: u8 = 0x20;
    pub const COUNT_MASK: u8 = 0x1F;
}

/// WDTCTL bits
pub mod wdtctl {
    pub const WDTPW: u16 = 0x5A00;
    pub const WDTHOLD: u16 = 0x0080;
}

pub const BIT0: u8 = 0x01;
pub const BIT3: u8 = 0x08;

/// Byte and word register access
pub trait RegisterBus {
    fn read8(&self, addr: u16) -> u8;

    fn write8(&self, addr: u16, value: u8);

    fn write16(&self, addr: u16, value: u16);

    /// Read-modify-write
    fn modify8(&self, addr: u16, f: impl FnOnce(u8) -> u8) {
        let value = self.read8(addr);
        self.write8(addr, f(value));
    }

    fn set_bits8(&self, addr: u16, mask: u8) {
        self.modify8(addr, |v| v | mask);
    }

    fn clear_bits8(&self, addr: u16, mask: u8) {
        self.modify8(addr, |v| v & !mask);
    }

    fn update_bits8(&self, addr: u16, mask: u8, set: bool) {
        if set {
            self.set_bits8(addr, mask);
        } else {
            self.clear_bits8(addr, mask);
        }
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &B {
    fn read8(&self, addr: u16) -> u8 {
        (**self).read8(addr)
    }

    fn write8(&self, addr: u16, value: u8) {
        (**self).write8(addr, value)
    }

    fn write16(&self, addr: u16, value: u16) {
        (**self).write16(addr, value)
    }
}

/// Volatile access to the real peripheral space
#[derive(Copy, Clone, Debug)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// # Safety
    ///
    /// Only valid on the MSP430G2231 memory map. Callers must make sure
    /// register accesses from different owners do not interleave a
    /// read-modify-write; the drivers in this crate only run with
    /// interrupts masked or from within an interrupt handler.
    pub const unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl RegisterBus for Mmio {
    fn read8(&self, addr: u16) -> u8 {
        // SAFETY: `Mmio` only exists on the target, where `addr` is a peripheral register
        unsafe { core::ptr::read_volatile(usize::from(addr) as *const u8) }
    }

    fn write8(&self, addr: u16, value: u8) {
        // SAFETY: see `read8`
        unsafe { core::ptr::write_volatile(usize::from(addr) as *mut u8, value) }
    }

    fn write16(&self, addr: u16, value: u16) {
        // SAFETY: see `read8`; word registers are even-aligned
        unsafe { core::ptr::write_volatile(usize::from(addr) as *mut u16, value) }
    }
}
