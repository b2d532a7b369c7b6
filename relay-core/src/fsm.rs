//! I2C master write transaction state machine
//!
//! Each call to [`TransactionFsm::step`] performs exactly one protocol step
//! and reprograms the serial engine for the next one. The engine raises its
//! interrupt when that transfer finishes, which leads to the next call.

use crate::hal::SerialEngine;
use crate::types::{AckBit, DataByte, SlaveAddress, TransactionReport, TransactionState, TransferWidth};

/// Result of a single step
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepOutcome {
    /// The engine was reprogrammed; another interrupt will follow
    InProgress(TransactionState),
    /// STOP was generated and the machine is back at `Start`
    Completed(TransactionReport),
}

impl StepOutcome {
    pub const fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed(_))
    }
}

/// Master write transaction state machine
#[derive(Debug)]
pub struct TransactionFsm {
    state: TransactionState,
    slave: SlaveAddress,
    address_ack: AckBit,
    data_ack: Option<AckBit>,
    data: Option<DataByte>,
}

impl TransactionFsm {
    /// Create a machine idle at `Start`
    pub const fn new(slave: SlaveAddress) -> Self {
        Self {
            state: TransactionState::Start,
            slave,
            address_ack: AckBit::Ack,
            data_ack: None,
            data: None,
        }
    }

    /// Get current state
    pub fn current_state(&self) -> TransactionState {
        self.state
    }

    pub fn slave(&self) -> SlaveAddress {
        self.slave
    }

    /// Execute the step for the current state
    ///
    /// `data` is only put on the bus when entering the data phase. On error
    /// the state is left unchanged; see [`TransactionFsm::abort`].
    pub fn step<E: SerialEngine>(&mut self, engine: &mut E, data: DataByte) -> Result<StepOutcome, E::Error> {
        let next = match self.state {
            TransactionState::Start => {
                engine.generate_start()?;
                engine.load(self.slave.write_byte())?;
                engine.start_transfer(TransferWidth::Byte)?;
                self.data_ack = None;
                self.data = None;
                TransactionState::AddrAckWait
            }

            TransactionState::AddrAckWait => {
                engine.set_output_enable(false)?;
                engine.start_transfer(TransferWidth::Bit)?;
                TransactionState::AddrAckCheck
            }

            TransactionState::AddrAckCheck => {
                engine.set_output_enable(true)?;
                let ack = AckBit::from_received(engine.received()?);
                match ack {
                    AckBit::Nack => {
                        engine.load(0x00)?;
                        engine.start_transfer(TransferWidth::Bit)?;
                        self.address_ack = ack;
                        TransactionState::Stop
                    }
                    AckBit::Ack => {
                        engine.load(data.value())?;
                        engine.start_transfer(TransferWidth::Byte)?;
                        self.address_ack = ack;
                        self.data = Some(data);
                        TransactionState::DataAckWait
                    }
                }
            }

            TransactionState::DataAckWait => {
                engine.set_output_enable(false)?;
                engine.start_transfer(TransferWidth::Bit)?;
                TransactionState::DataAckCheck
            }

            TransactionState::DataAckCheck => {
                engine.set_output_enable(true)?;
                // Recorded only; a data NACK still ends in a normal STOP.
                let ack = AckBit::from_received(engine.received()?);
                engine.load(0x00)?;
                engine.start_transfer(TransferWidth::Bit)?;
                self.data_ack = Some(ack);
                TransactionState::Stop
            }

            TransactionState::Stop => {
                engine.release_bus()?;
                self.state = TransactionState::Start;
                return Ok(StepOutcome::Completed(TransactionReport {
                    address_ack: self.address_ack,
                    data_ack: self.data_ack,
                    data: self.data,
                }));
            }
        };

        self.state = next;
        Ok(StepOutcome::InProgress(next))
    }

    /// Release the bus and go back to `Start`
    ///
    /// The machine is reset even if the engine refuses the release.
    pub fn abort<E: SerialEngine>(&mut self, engine: &mut E) -> Result<(), E::Error> {
        self.state = TransactionState::Start;
        self.data_ack = None;
        self.data = None;
        engine.release_bus()
    }

    /// Reset FSM to initial state without touching the bus
    pub fn reset(&mut self) {
        self.state = TransactionState::Start;
        self.address_ack = AckBit::Ack;
        self.data_ack = None;
        self.data = None;
    }
}
