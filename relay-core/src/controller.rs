//! Data register and the relay master that owns all shared state

use core::cell::RefCell;
use critical_section::Mutex;
use portable_atomic::{AtomicU8, Ordering};

use crate::dispatcher::TransactionTrigger;
use crate::fsm::{StepOutcome, TransactionFsm};
use crate::hal::{EdgeInput, HalError, IndicatorOutput, SerialEngine};
use crate::input::InputEventHandler;
use crate::types::{AckBit, DataByte, MasterConfig, MasterStats, TransactionState};

/// Relay-control word shared between the two interrupt handlers
///
/// Only the input handler writes it; the transaction machine reads it once
/// per transaction when it enters the data phase.
pub struct DataRegister {
    value: AtomicU8,
}

impl DataRegister {
    /// Create register holding pattern 0
    pub const fn new() -> Self {
        Self {
            value: AtomicU8::new(0),
        }
    }

    /// Current pattern
    pub fn load(&self) -> DataByte {
        // Only ever stored through `advance`/`set`, so always in range
        DataByte::new(self.value.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Step to the next pattern (15 wraps to 0) and return it
    pub fn advance(&self) -> DataByte {
        let previous = self
            .value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                Some(DataByte::new(raw).unwrap_or_default().next().value())
            })
            .unwrap_or_default();
        DataByte::new(previous).unwrap_or_default().next()
    }

    /// Overwrite the pattern
    pub fn set(&self, value: DataByte) {
        self.value.store(value.value(), Ordering::Release);
    }
}

impl Default for DataRegister {
    fn default() -> Self {
        Self::new()
    }
}

/// Coordinating object for one serial engine and its relay slave
///
/// Both interrupt entry points live here. Each one masks the other
/// interrupt source for its full duration and restores it on exit.
pub struct RelayMaster<E, X, L> {
    engine: E,
    edge: X,
    indicator: L,
    fsm: TransactionFsm,
    input: InputEventHandler,
    data: DataRegister,
    stats: MasterStats,
    config: MasterConfig,
}

impl<E, X, L> RelayMaster<E, X, L>
where
    E: SerialEngine,
    X: EdgeInput,
    L: IndicatorOutput,
{
    /// Create master with given peripherals and configuration
    pub fn new(engine: E, edge: X, indicator: L, config: MasterConfig) -> Self {
        Self {
            engine,
            edge,
            indicator,
            fsm: TransactionFsm::new(config.slave),
            input: InputEventHandler::new(config.pulse),
            data: DataRegister::new(),
            stats: MasterStats::default(),
            config,
        }
    }

    /// Serial-engine interrupt: run exactly one protocol step
    pub fn on_serial_interrupt(&mut self) -> Result<StepOutcome, HalError> {
        self.edge.set_interrupt_enabled(false).map_err(Into::into)?;

        let result: Result<StepOutcome, HalError> = self.fsm.step(&mut self.engine, self.data.load()).map_err(Into::into);
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("Engine failure in {}: {}", self.fsm.current_state(), err);
                self.stats.aborted += 1;
                let released = self.fsm.abort(&mut self.engine).map_err(Into::into);
                if let Err(cleanup) = released.and(self.end_serial_interrupt()) {
                    error!("Recovery after engine failure incomplete: {}", cleanup);
                }
                return Err(err);
            }
        };

        self.end_serial_interrupt()?;

        match outcome {
            StepOutcome::InProgress(state) => trace!("I2C step -> {}", state),
            StepOutcome::Completed(report) => {
                self.stats.completed += 1;
                if report.address_ack == AckBit::Nack {
                    self.stats.address_nacks += 1;
                    warn!("Slave {} did not acknowledge address", self.fsm.slave().address());
                } else if report.data_ack == Some(AckBit::Nack) {
                    self.stats.data_nacks += 1;
                    warn!("Slave {} did not acknowledge data", self.fsm.slave().address());
                } else {
                    debug!("Relay pattern {} delivered", report.data);
                }
            }
        }

        Ok(outcome)
    }

    /// Clear the engine flag and unmask the edge interrupt, both always
    fn end_serial_interrupt(&mut self) -> Result<(), HalError> {
        let cleared = self.engine.clear_pending().map_err(Into::into);
        let unmasked = self.edge.set_interrupt_enabled(true).map_err(Into::into);
        cleared.and(unmasked)
    }

    /// Input-edge interrupt, blocking for the indicator pulse
    pub fn on_input_edge<D>(&mut self, delay: &mut D) -> Result<DataByte, HalError>
    where
        D: embedded_hal::delay::DelayNs,
    {
        let value = self.input.handle(&self.data, &mut self.engine, &mut self.edge, &mut self.indicator, delay)?;
        self.stats.input_events += 1;
        Ok(value)
    }

    /// Input-edge handling with an async pulse
    #[cfg(feature = "async")]
    pub async fn on_input_edge_async<D>(&mut self, delay: &mut D) -> Result<DataByte, HalError>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        let value = self
            .input
            .handle_async(&self.data, &mut self.engine, &mut self.edge, &mut self.indicator, delay)
            .await?;
        self.stats.input_events += 1;
        Ok(value)
    }

    /// Current transaction step
    pub fn current_state(&self) -> TransactionState {
        self.fsm.current_state()
    }

    /// Relay pattern the next transaction will send
    pub fn data(&self) -> DataByte {
        self.data.load()
    }

    pub fn set_data(&mut self, value: DataByte) {
        self.data.set(value);
    }

    pub fn stats(&self) -> MasterStats {
        self.stats
    }

    pub fn config(&self) -> &MasterConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn edge(&self) -> &X {
        &self.edge
    }

    pub fn edge_mut(&mut self) -> &mut X {
        &mut self.edge
    }

    pub fn indicator(&self) -> &L {
        &self.indicator
    }

    pub fn indicator_mut(&mut self) -> &mut L {
        &mut self.indicator
    }
}

impl<E, X, L> TransactionTrigger for RelayMaster<E, X, L>
where
    E: SerialEngine,
    X: EdgeInput,
    L: IndicatorOutput,
{
    fn arm(&mut self) -> Result<(), HalError> {
        if !self.fsm.current_state().is_idle() {
            return Err(HalError::Busy);
        }
        self.engine.set_pending().map_err(Into::into)
    }
}

/// Relay master parked in a critical-section cell so that interrupt
/// handlers and the foreground loop take turns on it
pub struct SharedMaster<M> {
    inner: Mutex<RefCell<Option<M>>>,
}

impl<M> SharedMaster<M> {
    /// Create an empty cell
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Move the master in, replacing any previous one
    pub fn install(&self, master: M) {
        critical_section::with(|cs| {
            self.inner.borrow(cs).replace(Some(master));
        });
    }

    /// Run `f` with exclusive access; `None` if nothing is installed
    pub fn with<R>(&self, f: impl FnOnce(&mut M) -> R) -> Option<R> {
        critical_section::with(|cs| self.inner.borrow(cs).borrow_mut().as_mut().map(f))
    }

    /// Move the master back out
    pub fn take(&self) -> Option<M> {
        critical_section::with(|cs| self.inner.borrow(cs).take())
    }
}

impl<M> Default for SharedMaster<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: TransactionTrigger> TransactionTrigger for &SharedMaster<M> {
    fn arm(&mut self) -> Result<(), HalError> {
        self.with(|master| master.arm()).unwrap_or(Err(HalError::NotInitialized))
    }
}
