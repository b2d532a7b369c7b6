//! Board bring-up, interrupt bodies and the foreground loop

use embedded_hal::delay::DelayNs;
use relay_core::hal::EmbeddedHalIndicator;
use relay_core::{
    bring_up, CompletionFlag, CycleDispatcher, DataByte, EdgeInput, FatalError, IndicatorOutput, MasterConfig,
    RelayMaster, SerialEngine, SharedMaster, StepOutcome,
};

use crate::clock::{hold_watchdog, BasicClock, InfoFlashCalibration};
use crate::cpu::{self, CycleDelay, Lpm0Wait};
use crate::port::{Port1, Port1Edge, Port1Led};
use crate::registers::{addr, Mmio, RegisterBus, BIT0, BIT3};
use crate::usi::UsiEngine;

/// Relay master on the board's peripherals
pub type BoardMaster<B> = RelayMaster<UsiEngine<B>, Port1Edge<B>, EmbeddedHalIndicator<Port1Led<B>>>;

/// Shared between the foreground loop and both interrupt handlers
pub static MASTER: SharedMaster<BoardMaster<Mmio>> = SharedMaster::new();

/// Raised by the USI handler when a transaction ends
pub static COMPLETION: CompletionFlag = CompletionFlag::new();

/// Bring the chip up and build the master
///
/// Order: watchdog, clock, GPIO, USI, then the stale button flag. With
/// erased calibration nothing after the watchdog is touched.
pub fn start<B: RegisterBus + Copy>(bus: B, config: MasterConfig) -> Result<BoardMaster<B>, FatalError> {
    hold_watchdog(&bus);
    bring_up(&mut InfoFlashCalibration::new(bus), &mut BasicClock::new(bus))?;

    Port1::init(&bus);
    let engine = UsiEngine::init(bus, &config);
    bus.clear_bits8(addr::P1IFG, BIT3);
    // Indicator idles high
    bus.set_bits8(addr::P1OUT, BIT0);

    let edge = Port1Edge::new(bus);
    let indicator = EmbeddedHalIndicator::new(Port1Led::new(bus));
    Ok(RelayMaster::new(engine, edge, indicator, config))
}

/// Serial-engine interrupt body
///
/// Signals `completion` when the transaction finishes or is aborted.
pub fn service_serial<E, X, L>(master: &SharedMaster<RelayMaster<E, X, L>>, completion: &CompletionFlag)
where
    E: SerialEngine,
    X: EdgeInput,
    L: IndicatorOutput,
{
    match master.with(|m| m.on_serial_interrupt()) {
        Some(Ok(StepOutcome::InProgress(_))) => {}
        Some(Ok(StepOutcome::Completed(_))) | Some(Err(_)) => completion.signal(),
        None => warn!("Serial interrupt with no master installed"),
    }
}

/// Input-edge interrupt body; the pulse blocks for the configured time
pub fn service_input<E, X, L, D>(
    master: &SharedMaster<RelayMaster<E, X, L>>,
    delay: impl FnOnce(&MasterConfig) -> D,
) -> Option<DataByte>
where
    E: SerialEngine,
    X: EdgeInput,
    L: IndicatorOutput,
    D: DelayNs,
{
    let result = master.with(|m| {
        let mut delay = delay(m.config());
        m.on_input_edge(&mut delay)
    })?;
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error!("Input edge failed: {}", err);
            None
        }
    }
}

/// USI vector
pub fn usi_interrupt() {
    service_serial(&MASTER, &COMPLETION);
}

/// Port 1 vector
pub fn port1_interrupt() {
    // MCLK and SMCLK both run from the calibrated DCO
    service_input(&MASTER, |config| CycleDelay::new(config.smclk_hz));
}

/// Firmware entry after reset
pub fn run(config: MasterConfig) -> ! {
    // SAFETY: the foreground owns the peripherals until interrupts are enabled
    let bus = unsafe { Mmio::steal() };
    let master = match start(bus, config) {
        Ok(master) => master,
        Err(err) => halt(err),
    };
    MASTER.install(master);
    cpu::enable_interrupts();
    info!("Relay master {} up, slave {}", relay_core::VERSION, config.slave.address());

    let mut dispatcher = CycleDispatcher::new(
        Lpm0Wait::new(&COMPLETION),
        CycleDelay::new(config.smclk_hz),
        config.cycle_delay,
    );
    dispatcher.run(&MASTER)
}

fn halt(err: FatalError) -> ! {
    error!("Startup failed: {}", err);
    loop {
        core::hint::spin_loop();
    }
}
