//! Hardware Abstraction Layer for the relay master

use embedded_hal::digital::OutputPin;
use crate::types::TransferWidth;

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// Serial engine register access failed
    EngineError,
    /// GPIO operation failed
    GpioError,
    /// Interrupt configuration failed
    InterruptError,
    /// Hardware not initialized
    NotInitialized,
    /// Invalid configuration
    InvalidConfig,
    /// A transaction is already in flight
    Busy,
}

#[cfg(feature = "std")]
impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::EngineError => write!(f, "Serial engine operation failed"),
            HalError::GpioError => write!(f, "GPIO operation failed"),
            HalError::InterruptError => write!(f, "Interrupt configuration failed"),
            HalError::NotInitialized => write!(f, "Hardware not initialized"),
            HalError::InvalidConfig => write!(f, "Invalid configuration"),
            HalError::Busy => write!(f, "Transaction already in progress"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Shift-register serial engine running the I2C bit timing
///
/// One transfer of known width is pending at a time. Completing it raises
/// the engine interrupt, which drives the next protocol step.
pub trait SerialEngine {
    type Error: Into<HalError>;

    /// Produce a START condition (SDA falls while SCL is high) and leave
    /// the data line driven by the shift register
    fn generate_start(&mut self) -> Result<(), Self::Error>;

    /// Load the shift register
    fn load(&mut self, value: u8) -> Result<(), Self::Error>;

    /// Program the bit counter, which starts clocking
    fn start_transfer(&mut self, width: TransferWidth) -> Result<(), Self::Error>;

    /// Current shift register contents; the last received bit is the LSB
    fn received(&mut self) -> Result<u8, Self::Error>;

    /// Drive SDA from the shift register (true) or release it to input
    fn set_output_enable(&mut self, enabled: bool) -> Result<(), Self::Error>;

    /// Produce a STOP condition and leave SDA passively high with the
    /// output driver and transparent latch disabled
    fn release_bus(&mut self) -> Result<(), Self::Error>;

    /// Enable or disable the engine interrupt
    fn set_interrupt_enabled(&mut self, enabled: bool) -> Result<(), Self::Error>;

    /// Raise the engine interrupt flag by software
    fn set_pending(&mut self) -> Result<(), Self::Error>;

    /// Clear the engine interrupt flag
    fn clear_pending(&mut self) -> Result<(), Self::Error>;
}

/// Edge-triggered input line
pub trait EdgeInput {
    type Error: Into<HalError>;

    /// Enable or disable the edge interrupt
    fn set_interrupt_enabled(&mut self, enabled: bool) -> Result<(), Self::Error>;

    /// Clear the latched edge flag
    fn clear_pending(&mut self) -> Result<(), Self::Error>;
}

/// Visible indicator line
pub trait IndicatorOutput {
    type Error: Into<HalError>;

    /// Drive the indicator line high (true) or low (false)
    fn set_level(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Level last driven
    fn level(&self) -> bool;
}

/// Indicator on top of any embedded-hal output pin
pub struct EmbeddedHalIndicator<P> {
    pin: P,
    high: bool,
}

impl<P> EmbeddedHalIndicator<P>
where
    P: OutputPin,
{
    /// Wrap a pin that the GPIO init left driven high
    pub fn new(pin: P) -> Self {
        Self { pin, high: true }
    }

    /// Give the pin back
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> IndicatorOutput for EmbeddedHalIndicator<P>
where
    P: OutputPin,
{
    type Error = HalError;

    fn set_level(&mut self, high: bool) -> Result<(), Self::Error> {
        if high {
            self.pin.set_high().map_err(|_| HalError::GpioError)?;
        } else {
            self.pin.set_low().map_err(|_| HalError::GpioError)?;
        }
        self.high = high;
        Ok(())
    }

    fn level(&self) -> bool {
        self.high
    }
}

/// Clamp a duration to the microsecond range accepted by `DelayNs`
pub(crate) fn duration_us(duration: core::time::Duration) -> u32 {
    u32::try_from(duration.as_micros()).unwrap_or(u32::MAX)
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock implementations for testing

    use super::*;
    use crate::types::AckBit;
    use heapless::{Deque, Vec};

    /// Something observable on the simulated bus
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub enum BusEvent {
        /// START condition
        Start,
        /// Byte shifted out by the master
        Byte(u8),
        /// (N)ACK driven by the simulated slave
        AckDriven(AckBit),
        /// Single low bit shifted out ahead of STOP
        StopBit,
        /// STOP condition, bus released
        Stop,
    }

    /// Serial engine with a simulated slave on the other end
    ///
    /// A programmed transfer only finishes when the test calls
    /// [`MockSerialEngine::complete_transfer`], mirroring hardware that
    /// raises its flag after the interrupt handler has returned.
    #[derive(Debug)]
    pub struct MockSerialEngine {
        shift: u8,
        bits_pending: u8,
        output_enabled: bool,
        latch_transparent: bool,
        sda_high: bool,
        interrupt_enabled: bool,
        pending: bool,
        stalled: bool,
        fail_next_transfer: bool,
        fail_next_release: bool,
        responses: Deque<AckBit, 8>,
        events: Vec<BusEvent, 64>,
    }

    impl Default for MockSerialEngine {
        fn default() -> Self {
            Self {
                shift: 0,
                bits_pending: 0,
                output_enabled: false,
                latch_transparent: false,
                sda_high: true,
                interrupt_enabled: true,
                pending: false,
                stalled: false,
                fail_next_transfer: false,
                fail_next_release: false,
                responses: Deque::new(),
                events: Vec::new(),
            }
        }
    }

    impl MockSerialEngine {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue the slave's answers; an empty queue answers ACK
        pub fn script_responses(&mut self, responses: &[AckBit]) {
            for response in responses {
                self.responses.push_back(*response).ok();
            }
        }

        /// Stop completing transfers, as if SCL were held
        pub fn set_stalled(&mut self, stalled: bool) {
            self.stalled = stalled;
        }

        /// Make the next `start_transfer` fail
        pub fn fail_next_transfer(&mut self) {
            self.fail_next_transfer = true;
        }

        /// Make the next `release_bus` fail
        pub fn fail_next_release(&mut self) {
            self.fail_next_release = true;
        }

        pub fn events(&self) -> &[BusEvent] {
            &self.events
        }

        pub fn clear_events(&mut self) {
            self.events.clear();
        }

        /// Bytes shifted out by the master, in bus order
        pub fn transmitted(&self) -> Vec<u8, 16> {
            let mut bytes = Vec::new();
            for event in &self.events {
                if let BusEvent::Byte(byte) = event {
                    bytes.push(*byte).ok();
                }
            }
            bytes
        }

        pub fn pending(&self) -> bool {
            self.pending
        }

        pub fn interrupt_enabled(&self) -> bool {
            self.interrupt_enabled
        }

        pub fn output_enabled(&self) -> bool {
            self.output_enabled
        }

        pub fn bits_pending(&self) -> u8 {
            self.bits_pending
        }

        /// Output driver and latch off, SDA back high
        pub fn is_released(&self) -> bool {
            !self.output_enabled && !self.latch_transparent && self.sda_high
        }

        /// Clock out the programmed transfer and raise the interrupt flag
        ///
        /// Returns false if nothing was programmed or the bus is stalled.
        pub fn complete_transfer(&mut self) -> bool {
            if self.bits_pending == 0 || self.stalled {
                return false;
            }

            if self.output_enabled {
                if self.bits_pending == TransferWidth::Byte.bits() {
                    self.record(BusEvent::Byte(self.shift));
                } else {
                    self.record(BusEvent::StopBit);
                }
            } else {
                let response = self.responses.pop_front().unwrap_or(AckBit::Ack);
                self.shift = (self.shift << 1) | response.bit();
                self.record(BusEvent::AckDriven(response));
            }
            self.bits_pending = 0;
            self.pending = true;
            true
        }

        fn record(&mut self, event: BusEvent) {
            self.events.push(event).ok();
        }
    }

    impl SerialEngine for MockSerialEngine {
        type Error = HalError;

        fn generate_start(&mut self) -> Result<(), Self::Error> {
            self.shift = 0;
            self.output_enabled = true;
            self.latch_transparent = true;
            self.sda_high = false;
            self.latch_transparent = false;
            self.record(BusEvent::Start);
            Ok(())
        }

        fn load(&mut self, value: u8) -> Result<(), Self::Error> {
            self.shift = value;
            Ok(())
        }

        fn start_transfer(&mut self, width: TransferWidth) -> Result<(), Self::Error> {
            if self.fail_next_transfer {
                self.fail_next_transfer = false;
                return Err(HalError::EngineError);
            }
            self.bits_pending = width.bits();
            Ok(())
        }

        fn received(&mut self) -> Result<u8, Self::Error> {
            Ok(self.shift)
        }

        fn set_output_enable(&mut self, enabled: bool) -> Result<(), Self::Error> {
            self.output_enabled = enabled;
            Ok(())
        }

        fn release_bus(&mut self) -> Result<(), Self::Error> {
            if self.fail_next_release {
                self.fail_next_release = false;
                return Err(HalError::EngineError);
            }
            self.shift = 0xFF;
            self.latch_transparent = true;
            self.sda_high = true;
            self.latch_transparent = false;
            self.output_enabled = false;
            self.record(BusEvent::Stop);
            Ok(())
        }

        fn set_interrupt_enabled(&mut self, enabled: bool) -> Result<(), Self::Error> {
            self.interrupt_enabled = enabled;
            Ok(())
        }

        fn set_pending(&mut self) -> Result<(), Self::Error> {
            self.pending = true;
            Ok(())
        }

        fn clear_pending(&mut self) -> Result<(), Self::Error> {
            self.pending = false;
            Ok(())
        }
    }

    /// Edge input whose flag is raised by the test
    #[derive(Debug)]
    pub struct MockEdgeInput {
        interrupt_enabled: bool,
        pending: bool,
    }

    impl Default for MockEdgeInput {
        fn default() -> Self {
            Self { interrupt_enabled: true, pending: false }
        }
    }

    impl MockEdgeInput {
        pub fn new() -> Self {
            Self::default()
        }

        /// Latch an edge
        pub fn trigger(&mut self) {
            self.pending = true;
        }

        pub fn pending(&self) -> bool {
            self.pending
        }

        pub fn interrupt_enabled(&self) -> bool {
            self.interrupt_enabled
        }
    }

    impl EdgeInput for MockEdgeInput {
        type Error = HalError;

        fn set_interrupt_enabled(&mut self, enabled: bool) -> Result<(), Self::Error> {
            self.interrupt_enabled = enabled;
            Ok(())
        }

        fn clear_pending(&mut self) -> Result<(), Self::Error> {
            self.pending = false;
            Ok(())
        }
    }

    /// Indicator that counts completed low pulses
    #[derive(Debug)]
    pub struct MockIndicator {
        high: bool,
        pulses: u32,
        failing: bool,
    }

    impl Default for MockIndicator {
        fn default() -> Self {
            Self { high: true, pulses: 0, failing: false }
        }
    }

    impl MockIndicator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn pulses(&self) -> u32 {
            self.pulses
        }

        /// Make every `set_level` fail with `GpioError`
        pub fn set_failing(&mut self, failing: bool) {
            self.failing = failing;
        }
    }

    impl IndicatorOutput for MockIndicator {
        type Error = HalError;

        fn set_level(&mut self, high: bool) -> Result<(), Self::Error> {
            if self.failing {
                return Err(HalError::GpioError);
            }
            if high && !self.high {
                self.pulses += 1;
            }
            self.high = high;
            Ok(())
        }

        fn level(&self) -> bool {
            self.high
        }
    }

    /// Delay that only adds up the requested time
    #[derive(Debug, Default)]
    pub struct RecordingDelay {
        elapsed_ns: u64,
    }

    impl RecordingDelay {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn elapsed_us(&self) -> u64 {
            self.elapsed_ns / 1_000
        }
    }

    impl embedded_hal::delay::DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.elapsed_ns += u64::from(ns);
        }
    }

    #[cfg(feature = "async")]
    impl embedded_hal_async::delay::DelayNs for RecordingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.elapsed_ns += u64::from(ns);
        }
    }
}
