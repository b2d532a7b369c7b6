//! Core data types for the I2C relay master

use core::time::Duration;

/// Protocol steps of a single master write transaction
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransactionState {
    /// Generate START and shift out the address byte
    #[default]
    Start,
    /// Release SDA so the slave can drive the address (N)ACK
    AddrAckWait,
    /// Sample the address (N)ACK and either send data or prepare STOP
    AddrAckCheck,
    /// Release SDA so the slave can drive the data (N)ACK
    DataAckWait,
    /// Sample the data (N)ACK and prepare STOP
    DataAckCheck,
    /// Generate STOP and release the bus
    Stop,
}

impl TransactionState {
    /// Returns true if no transaction is in flight
    pub const fn is_idle(&self) -> bool {
        matches!(self, TransactionState::Start)
    }

    /// Returns true if this step reads the bit shifted in by the slave
    pub const fn samples_ack(&self) -> bool {
        match self {
            TransactionState::AddrAckCheck | TransactionState::DataAckCheck => true,
            TransactionState::Start
            | TransactionState::AddrAckWait
            | TransactionState::DataAckWait
            | TransactionState::Stop => false,
        }
    }
}

/// Relay-control word, 4 bits wide
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataByte(u8);

impl DataByte {
    /// Highest relay pattern before wrapping
    pub const MAX: u8 = 15;

    /// Create a data byte, rejecting values above [`DataByte::MAX`]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Raw byte value
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Next relay pattern, 15 wraps to 0
    pub const fn next(&self) -> Self {
        if self.0 < Self::MAX {
            Self(self.0 + 1)
        } else {
            Self(0)
        }
    }

    /// Returns true if the relay at `index` (0..4) is closed
    pub const fn relay_closed(&self, index: u8) -> bool {
        index < 4 && (self.0 >> index) & 1 == 1
    }
}

/// Fixed 7-bit slave address
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlaveAddress(u8);

impl SlaveAddress {
    /// Address of the relay board
    pub const RELAY_BOARD: SlaveAddress = SlaveAddress(0x48);

    /// Create a 7-bit address
    pub const fn new(address: u8) -> Option<Self> {
        if address <= 0x7F {
            Some(Self(address))
        } else {
            None
        }
    }

    /// The 7-bit address
    pub const fn address(&self) -> u8 {
        self.0
    }

    /// Address byte with the R/W bit cleared (write)
    pub const fn write_byte(&self) -> u8 {
        self.0 << 1
    }

    /// Returns true for the reserved 0000xxx and 1111xxx address groups
    pub const fn is_reserved(&self) -> bool {
        self.0 < 0x08 || self.0 > 0x77
    }
}

impl Default for SlaveAddress {
    fn default() -> Self {
        Self::RELAY_BOARD
    }
}

/// Acknowledge bit driven by the slave after each byte
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckBit {
    /// SDA pulled low
    Ack,
    /// SDA left high
    Nack,
}

impl AckBit {
    /// Decode from the shift register; only the last received bit counts
    pub const fn from_received(shift_register: u8) -> Self {
        if shift_register & 0x01 == 0 {
            AckBit::Ack
        } else {
            AckBit::Nack
        }
    }

    /// Bus level the slave drives for this bit
    pub const fn bit(&self) -> u8 {
        match self {
            AckBit::Ack => 0,
            AckBit::Nack => 1,
        }
    }

    pub const fn is_ack(&self) -> bool {
        matches!(self, AckBit::Ack)
    }
}

/// Width of the next shift-register transfer
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferWidth {
    /// One bit: (N)ACK phases and the STOP preparation bit
    Bit,
    /// Eight bits: address and data bytes
    Byte,
}

impl TransferWidth {
    /// Value loaded into the bit counter
    pub const fn bits(&self) -> u8 {
        match self {
            TransferWidth::Bit => 1,
            TransferWidth::Byte => 8,
        }
    }
}

/// Outcome of a completed transaction
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransactionReport {
    /// Acknowledge seen after the address byte
    pub address_ack: AckBit,
    /// Acknowledge seen after the data byte, if one was sent
    pub data_ack: Option<AckBit>,
    /// Data byte put on the bus, if the address was acknowledged
    pub data: Option<DataByte>,
}

impl TransactionReport {
    /// Returns true if the slave acknowledged both bytes
    pub fn delivered(&self) -> bool {
        self.address_ack.is_ack() && self.data_ack == Some(AckBit::Ack)
    }
}

/// Running counters kept by the relay master
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MasterStats {
    /// Transactions that reached STOP
    pub completed: u32,
    /// Transactions aborted by an address NACK
    pub address_nacks: u32,
    /// Transactions whose data byte was not acknowledged
    pub data_nacks: u32,
    /// Transactions aborted by an engine failure
    pub aborted: u32,
    /// Input edges handled
    pub input_events: u32,
}

/// Relay master configuration parameters
///
/// Fields are public for struct-update construction in tests; only
/// [`MasterConfig::new`] and [`MasterConfig::validate`] check them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MasterConfig {
    /// Slave receiving the relay-control word
    pub slave: SlaveAddress,
    /// Indicator pulse length per input event
    pub pulse: Duration,
    /// Idle time between transactions
    pub cycle_delay: Duration,
    /// Serial engine source clock
    pub smclk_hz: u32,
    /// SCL = SMCLK / 2^n
    pub scl_divider_log2: u8,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            slave: SlaveAddress::RELAY_BOARD,
            pulse: Duration::from_millis(1000), // ~1M cycles at 1 MHz
            cycle_delay: Duration::from_millis(50),
            smclk_hz: 1_000_000,
            scl_divider_log2: 3, // ~125 kHz
        }
    }
}

impl MasterConfig {
    /// Longest accepted indicator pulse or cycle delay
    pub const MAX_DELAY: Duration = Duration::from_secs(60);

    /// Create a new configuration with validation
    pub fn new(
        slave: u8,
        pulse: Duration,
        cycle_delay: Duration,
        smclk_hz: u32,
        scl_divider_log2: u8,
    ) -> Result<Self, &'static str> {
        let slave = SlaveAddress::new(slave).ok_or("Slave address must fit in 7 bits")?;
        let config = Self {
            slave,
            pulse,
            cycle_delay,
            smclk_hz,
            scl_divider_log2,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check a configuration built field by field
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.slave.is_reserved() {
            return Err("Slave address is in a reserved range");
        }
        if self.pulse > Self::MAX_DELAY || self.cycle_delay > Self::MAX_DELAY {
            return Err("Delays must be <= 60s");
        }
        if self.smclk_hz == 0 {
            return Err("SMCLK must be non-zero");
        }
        if self.scl_divider_log2 > 7 {
            return Err("SCL divider exponent must be between 0 and 7");
        }
        Ok(())
    }

    /// Resulting SCL frequency
    pub fn scl_hz(&self) -> u32 {
        self.smclk_hz >> self.scl_divider_log2
    }
}
