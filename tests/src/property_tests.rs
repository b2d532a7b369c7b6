//! Property tests over data patterns, slave answers and configuration

use std::time::Duration;

use proptest::prelude::*;
use relay_core::test_utils::{mock_master, run_transaction};
use relay_core::{AckBit, DataByte, MasterConfig, SlaveAddress, TransactionState};

fn ack_bit() -> impl Strategy<Value = AckBit> {
    prop_oneof![Just(AckBit::Ack), Just(AckBit::Nack)]
}

proptest! {
    #[test]
    fn next_is_increment_mod_16(v in 0u8..16) {
        let value = DataByte::new(v).unwrap();
        prop_assert_eq!(value.next().value(), (v + 1) % 16);
    }

    #[test]
    fn sixteen_steps_return_to_start(v in 0u8..16) {
        let start = DataByte::new(v).unwrap();
        let mut value = start;
        for _ in 0..16 {
            value = value.next();
        }
        prop_assert_eq!(value, start);
    }

    #[test]
    fn out_of_range_patterns_rejected(v in 16u8..=255) {
        prop_assert!(DataByte::new(v).is_none());
    }

    #[test]
    fn write_byte_is_address_shifted(address in 0u8..0x80) {
        let slave = SlaveAddress::new(address).unwrap();
        prop_assert_eq!(slave.write_byte(), address << 1);
        prop_assert_eq!(slave.write_byte() & 1, 0);
    }

    #[test]
    fn every_transaction_ends_released_at_start(
        data in 0u8..16,
        address_ack in ack_bit(),
        data_ack in ack_bit(),
    ) {
        let mut master = mock_master(MasterConfig::default());
        master.set_data(DataByte::new(data).unwrap());
        master.engine_mut().script_responses(&[address_ack, data_ack]);

        let trace = run_transaction(&mut master).unwrap();
        let report = trace.report.unwrap();

        prop_assert_eq!(master.current_state(), TransactionState::Start);
        prop_assert!(master.engine().is_released());
        prop_assert_eq!(report.address_ack, address_ack);
        let sent = master.engine().transmitted();
        match address_ack {
            AckBit::Ack => {
                prop_assert_eq!(trace.states.len(), 7);
                prop_assert_eq!(sent.as_slice(), &[0x90, data][..]);
                prop_assert_eq!(report.data_ack, Some(data_ack));
            }
            AckBit::Nack => {
                prop_assert_eq!(trace.states.len(), 5);
                prop_assert_eq!(sent.as_slice(), &[0x90][..]);
                prop_assert_eq!(report.data_ack, None);
            }
        }
    }

    #[test]
    fn input_events_count_mod_16(events in 0usize..64) {
        let mut master = mock_master(MasterConfig::default());
        let mut delay = relay_core::hal::mock::RecordingDelay::new();
        for _ in 0..events {
            master.on_input_edge(&mut delay).unwrap();
        }
        prop_assert_eq!(usize::from(master.data().value()), events % 16);
    }

    #[test]
    fn config_validation(
        slave in 0u8..=0xFF,
        pulse_ms in 0u64..120_000,
        divider in 0u8..16,
    ) {
        let result = MasterConfig::new(slave, Duration::from_millis(pulse_ms), Duration::from_millis(50), 1_000_000, divider);
        let valid = (0x08..=0x77).contains(&slave) && pulse_ms <= 60_000 && divider <= 7;
        prop_assert_eq!(result.is_ok(), valid);
        if let Ok(config) = result {
            prop_assert_eq!(config.scl_hz(), 1_000_000 >> divider);
        }
    }
}
