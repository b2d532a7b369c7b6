//! Transaction state machine scenarios through the relay master

use relay_core::hal::mock::BusEvent;
use relay_core::test_utils::{mock_master, run_transaction, MockMaster};
use relay_core::{AckBit, DataByte, HalError, MasterConfig, SlaveAddress, TransactionState, TransactionTrigger};
use rstest::{fixture, rstest};

use TransactionState::*;

#[fixture]
fn master() -> MockMaster {
    mock_master(MasterConfig::default())
}

#[rstest]
#[case::scenario_a(0, &[AckBit::Ack, AckBit::Ack], &[0x90, 0x00], &[Start, AddrAckWait, AddrAckCheck, DataAckWait, DataAckCheck, Stop, Start])]
#[case::scenario_b(5, &[AckBit::Nack], &[0x90], &[Start, AddrAckWait, AddrAckCheck, Stop, Start])]
#[case::data_nack(15, &[AckBit::Ack, AckBit::Nack], &[0x90, 0x0F], &[Start, AddrAckWait, AddrAckCheck, DataAckWait, DataAckCheck, Stop, Start])]
fn test_transaction_paths(
    mut master: MockMaster,
    #[case] data: u8,
    #[case] answers: &[AckBit],
    #[case] expected_bytes: &[u8],
    #[case] expected_states: &[TransactionState],
) {
    master.set_data(DataByte::new(data).unwrap());
    master.engine_mut().script_responses(answers);

    let trace = run_transaction(&mut master).unwrap();

    assert!(!trace.stalled);
    assert_eq!(trace.states.as_slice(), expected_states);
    assert_eq!(master.engine().transmitted().as_slice(), expected_bytes);
    assert_eq!(master.current_state(), Start);
    assert!(master.engine().is_released());
}

#[rstest]
fn test_data_ack_never_changes_the_path(mut master: MockMaster) {
    master.engine_mut().script_responses(&[AckBit::Ack, AckBit::Ack, AckBit::Ack, AckBit::Nack]);

    let acked = run_transaction(&mut master).unwrap();
    let nacked = run_transaction(&mut master).unwrap();

    assert_eq!(acked.states, nacked.states);
    assert_eq!(acked.report.unwrap().data_ack, Some(AckBit::Ack));
    assert_eq!(nacked.report.unwrap().data_ack, Some(AckBit::Nack));
}

#[rstest]
fn test_address_nack_reaches_stop_without_data(mut master: MockMaster) {
    master.engine_mut().script_responses(&[AckBit::Nack]);

    run_transaction(&mut master).unwrap();

    assert_eq!(
        master.engine().events(),
        &[
            BusEvent::Start,
            BusEvent::Byte(0x90),
            BusEvent::AckDriven(AckBit::Nack),
            BusEvent::StopBit,
            BusEvent::Stop,
        ]
    );
}

#[rstest]
fn test_other_slave_address() {
    let config = MasterConfig {
        slave: SlaveAddress::new(0x20).unwrap(),
        ..MasterConfig::default()
    };
    assert!(config.validate().is_ok());
    let mut master = mock_master(config);

    run_transaction(&mut master).unwrap();

    assert_eq!(master.engine().transmitted()[0], 0x40);
}

#[rstest]
fn test_stalled_bus_stays_mid_transaction(mut master: MockMaster) {
    master.engine_mut().set_stalled(true);

    let trace = run_transaction(&mut master).unwrap();

    assert!(trace.stalled);
    assert!(trace.report.is_none());
    assert_eq!(master.current_state(), AddrAckWait);
    assert_eq!(master.arm(), Err(HalError::Busy));

    // SCL comes back
    master.engine_mut().set_stalled(false);
    master.engine_mut().complete_transfer();
    while master.engine().pending() {
        master.on_serial_interrupt().unwrap();
        master.engine_mut().complete_transfer();
    }
    assert_eq!(master.current_state(), Start);
    assert_eq!(master.stats().completed, 1);
}

#[rstest]
fn test_engine_failure_releases_bus_and_recovers(mut master: MockMaster) {
    master.arm().unwrap();
    master.on_serial_interrupt().unwrap();
    master.engine_mut().complete_transfer();
    master.on_serial_interrupt().unwrap();
    master.engine_mut().complete_transfer();

    master.engine_mut().fail_next_transfer();
    assert_eq!(master.on_serial_interrupt(), Err(HalError::EngineError));
    assert!(master.engine().is_released());
    assert_eq!(master.current_state(), Start);

    master.engine_mut().clear_events();
    let trace = run_transaction(&mut master).unwrap();
    assert!(trace.report.unwrap().delivered());
    assert_eq!(master.stats().aborted, 1);
}
