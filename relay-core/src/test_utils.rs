//! Test utilities for relay core functionality

use heapless::Vec;

use crate::controller::{RelayMaster, SharedMaster};
use crate::dispatcher::{CompletionFlag, LowPowerWait, TransactionTrigger};
use crate::fsm::StepOutcome;
use crate::hal::mock::{MockEdgeInput, MockIndicator, MockSerialEngine};
use crate::hal::HalError;
use crate::types::{MasterConfig, TransactionReport, TransactionState};

/// Relay master wired to mock peripherals
pub type MockMaster = RelayMaster<MockSerialEngine, MockEdgeInput, MockIndicator>;

/// Build a mock master with the given configuration
pub fn mock_master(config: MasterConfig) -> MockMaster {
    RelayMaster::new(MockSerialEngine::new(), MockEdgeInput::new(), MockIndicator::new(), config)
}

/// Everything observed while driving one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionTrace {
    /// State before arming, then the state after every step
    pub states: Vec<TransactionState, 8>,
    /// Present if STOP was reached
    pub report: Option<TransactionReport>,
    /// The engine stopped raising interrupts before STOP
    pub stalled: bool,
}

/// Arm and service engine interrupts until the transaction ends or stalls
pub fn run_transaction(master: &mut MockMaster) -> Result<TransactionTrace, HalError> {
    let mut trace = TransactionTrace {
        states: Vec::new(),
        report: None,
        stalled: false,
    };
    master.arm()?;
    trace.states.push(master.current_state()).ok();

    loop {
        if !master.engine().pending() {
            trace.stalled = true;
            return Ok(trace);
        }
        match master.on_serial_interrupt()? {
            StepOutcome::InProgress(state) => {
                trace.states.push(state).ok();
            }
            StepOutcome::Completed(report) => {
                trace.states.push(master.current_state()).ok();
                trace.report = Some(report);
                return Ok(trace);
            }
        }
        master.engine_mut().complete_transfer();
    }
}

/// Low-power wait for host runs
///
/// Instead of sleeping it services the shared master's serial interrupts,
/// finishing each programmed transfer, until completion is signalled. If
/// no interrupt is left to service it gives up and records a stall.
pub struct SimulatedCpu<'a> {
    master: &'a SharedMaster<MockMaster>,
    completion: &'a CompletionFlag,
    interrupts: u32,
    stalls: u32,
}

impl<'a> SimulatedCpu<'a> {
    pub fn new(master: &'a SharedMaster<MockMaster>, completion: &'a CompletionFlag) -> Self {
        Self {
            master,
            completion,
            interrupts: 0,
            stalls: 0,
        }
    }

    /// Serial interrupts serviced so far
    pub fn interrupts(&self) -> u32 {
        self.interrupts
    }

    /// Waits that ended without a completion
    pub fn stalls(&self) -> u32 {
        self.stalls
    }

    fn service_one(&mut self) -> bool {
        let completion = self.completion;
        let serviced = self.master.with(|master| {
            if !master.engine().pending() || !master.engine().interrupt_enabled() {
                return false;
            }
            match master.on_serial_interrupt() {
                Ok(StepOutcome::InProgress(_)) => {
                    master.engine_mut().complete_transfer();
                }
                Ok(StepOutcome::Completed(_)) | Err(_) => completion.signal(),
            }
            true
        });
        let serviced = serviced.unwrap_or(false);
        if serviced {
            self.interrupts += 1;
        }
        serviced
    }
}

impl LowPowerWait for SimulatedCpu<'_> {
    fn wait_for_completion(&mut self) {
        loop {
            if self.completion.take() {
                return;
            }
            if !self.service_one() {
                self.stalls += 1;
                return;
            }
        }
    }
}
