//! USI driver and board glue against the simulated USI

use relay_core::{AckBit, CompletionFlag, DataByte, MasterConfig, SharedMaster, StepOutcome, TransactionTrigger};
use relay_firmware::board::{self, BoardMaster};
use relay_firmware::registers::{addr, usictl0, BIT0};
use relay_firmware::CycleDelay;

use crate::UsiSim;

fn drive(master: &mut BoardMaster<&UsiSim>, sim: &UsiSim) -> Option<relay_core::TransactionReport> {
    master.arm().unwrap();
    while sim.flag_raised() {
        if let StepOutcome::Completed(report) = master.on_serial_interrupt().unwrap() {
            return Some(report);
        }
        sim.clock_out();
    }
    None
}

#[test]
fn test_scenario_a_on_usi() {
    let sim = UsiSim::new();
    let mut master = board::start(&sim, MasterConfig::default()).unwrap();

    let report = drive(&mut master, &sim).unwrap();

    assert!(report.delivered());
    assert_eq!(sim.bytes(), vec![0x90, 0x00]);
    // Released: output driver and latch off, SDA register high
    assert_eq!(sim.peek(addr::USICTL0) & (usictl0::USIOE | usictl0::USIGE), 0);
    assert_eq!(sim.peek(addr::USISRL), 0xFF);
}

#[test]
fn test_scenario_b_on_usi() {
    let sim = UsiSim::new();
    sim.script(&[AckBit::Nack]);
    let mut master = board::start(&sim, MasterConfig::default()).unwrap();
    master.set_data(DataByte::new(5).unwrap());

    let report = drive(&mut master, &sim).unwrap();

    assert_eq!(report.address_ack, AckBit::Nack);
    assert_eq!(sim.bytes(), vec![0x90]);
    assert_eq!(master.stats().address_nacks, 1);
}

#[test]
fn test_button_then_transaction_on_usi() {
    let sim = UsiSim::new();
    let shared = SharedMaster::new();
    shared.install(board::start(&sim, MasterConfig::default()).unwrap());
    let completion = CompletionFlag::new();

    for _ in 0..3 {
        board::service_input(&shared, |_| CycleDelay::new(1_000)).unwrap();
    }
    assert_ne!(sim.peek(addr::P1OUT) & BIT0, 0);

    (&shared).arm().unwrap();
    while !completion.is_set() {
        assert!(sim.flag_raised());
        board::service_serial(&shared, &completion);
        sim.clock_out();
    }

    assert_eq!(sim.bytes(), vec![0x90, 0x03]);
    assert_eq!(shared.with(|m| m.stats().completed), Some(1));
}

#[test]
fn test_back_to_back_transactions_on_usi() {
    let sim = UsiSim::new();
    sim.script(&[AckBit::Ack, AckBit::Nack, AckBit::Nack]);
    let mut master = board::start(&sim, MasterConfig::default()).unwrap();

    let first = drive(&mut master, &sim).unwrap();
    let second = drive(&mut master, &sim).unwrap();
    let third = drive(&mut master, &sim).unwrap();

    assert_eq!(first.data_ack, Some(AckBit::Nack));
    assert_eq!(second.address_ack, AckBit::Nack);
    assert!(third.delivered());
    assert_eq!(sim.bytes(), vec![0x90, 0x00, 0x90, 0x90, 0x00]);
}
