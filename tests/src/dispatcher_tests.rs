//! Foreground cycle driving transactions through the shared master

use std::time::Duration;

use relay_core::hal::mock::RecordingDelay;
use relay_core::test_utils::{mock_master, MockMaster, SimulatedCpu};
use relay_core::{AckBit, CompletionFlag, CycleDispatcher, HalError, MasterConfig, SharedMaster, TransactionState};

fn installed(config: MasterConfig) -> SharedMaster<MockMaster> {
    let shared = SharedMaster::new();
    shared.install(mock_master(config));
    shared
}

#[test]
fn test_each_cycle_sends_current_pattern() {
    let shared = installed(MasterConfig::default());
    let completion = CompletionFlag::new();
    let mut dispatcher = CycleDispatcher::new(
        SimulatedCpu::new(&shared, &completion),
        RecordingDelay::new(),
        Duration::from_millis(50),
    );

    for _ in 0..4 {
        dispatcher.run_cycle(&shared).unwrap();
        // Button pressed between transactions
        shared
            .with(|m| m.on_input_edge(&mut RecordingDelay::new()))
            .unwrap()
            .unwrap();
    }

    let bytes = shared.with(|m| m.engine().transmitted().to_vec()).unwrap();
    assert_eq!(bytes, vec![0x90, 0x00, 0x90, 0x01, 0x90, 0x02, 0x90, 0x03]);
    assert_eq!(dispatcher.cycles(), 4);
    assert_eq!(dispatcher.delay().elapsed_us(), 200_000);
    assert_eq!(dispatcher.wait().stalls(), 0);
}

#[test]
fn test_nacked_cycles_keep_running() {
    let shared = installed(MasterConfig::default());
    shared.with(|m| m.engine_mut().script_responses(&[AckBit::Nack, AckBit::Nack]));
    let completion = CompletionFlag::new();
    let mut dispatcher = CycleDispatcher::new(
        SimulatedCpu::new(&shared, &completion),
        RecordingDelay::new(),
        Duration::from_millis(50),
    );

    for _ in 0..3 {
        dispatcher.run_cycle(&shared).unwrap();
    }

    let stats = shared.with(|m| m.stats()).unwrap();
    assert_eq!(stats.completed, 3);
    assert_eq!(stats.address_nacks, 2);
    // Four steps per NACKed transaction, six per delivered one
    assert_eq!(dispatcher.wait().interrupts(), 4 + 4 + 6);
}

#[test]
fn test_masked_engine_interrupt_stalls_wait() {
    let shared = installed(MasterConfig::default());
    let completion = CompletionFlag::new();
    let mut cpu = SimulatedCpu::new(&shared, &completion);

    shared.with(|m| {
        relay_core::SerialEngine::set_interrupt_enabled(m.engine_mut(), false).unwrap();
    });
    relay_core::TransactionTrigger::arm(&mut &shared).unwrap();
    relay_core::LowPowerWait::wait_for_completion(&mut cpu);

    assert_eq!(cpu.stalls(), 1);
    assert_eq!(cpu.interrupts(), 0);
    assert_eq!(shared.with(|m| m.current_state()), Some(TransactionState::Start));
}

#[test]
fn test_uninstalled_master_cannot_arm() {
    let shared: SharedMaster<MockMaster> = SharedMaster::new();
    let completion = CompletionFlag::new();
    let mut dispatcher = CycleDispatcher::new(
        SimulatedCpu::new(&shared, &completion),
        RecordingDelay::new(),
        Duration::from_millis(50),
    );

    assert_eq!(dispatcher.run_cycle(&shared), Err(HalError::NotInitialized));
    assert_eq!(dispatcher.cycles(), 0);
}
