mod common;

use i4b_core::{Cause, IdleTimeState, ShortholdData, debug};
use i4b_msgs::{ChargeType, ChargingInd, IdleTimeoutInd, L4Msg, MsgType, Notification};
use common::{L4Test, default_test_config};

fn types(msgs: &[Notification]) -> Vec<MsgType> {
    msgs.iter().map(|m| m.msg_type()).collect()
}

fn charging(msgs: &[Notification]) -> Vec<i32> {
    msgs.iter()
        .filter_map(|m| match &m.msg {
            L4Msg::ChargingInd(c) => Some(c.units),
            _ => None,
        })
        .collect()
}

#[test]
fn test_fixed_unit_no_activity() {
    debug::setup_logging_verbose();
    let mut test = L4Test::new(default_test_config());
    let h = test.outgoing_call(0, ShortholdData::fixed(40, 100, 10), false);
    let cdid = test.ctx.call(h).unwrap().cdid;

    // First unit is charged at connect, before the connect is reported
    let msgs = test.messages();
    assert_eq!(types(&msgs), vec![MsgType::ChargingInd, MsgType::ConnectActiveInd]);
    assert_eq!(
        msgs[0],
        Notification::new(
            cdid.wire(),
            L4Msg::ChargingInd(ChargingInd {
                units_type: ChargeType::Calculated,
                units: 1
            })
        )
    );
    assert!(test.ctx.call(h).unwrap().timeout_active);

    test.run_to_second(89);
    assert!(test.l3().disconnects.is_empty());
    assert_eq!(test.ctx.call(h).unwrap().idletime_state, IdleTimeState::Check);

    test.run_to_second(90);
    assert_eq!(test.l3().disconnects, vec![(cdid, Cause::i4b_normal())]);
    assert_eq!(
        test.messages(),
        vec![Notification::new(cdid.wire(), L4Msg::IdleTimeoutInd(IdleTimeoutInd))]
    );

    let cd = test.ctx.call(h).unwrap();
    assert_eq!(cd.cunits, 1);
    assert_eq!(cd.cause_out, Cause::i4b_normal());
    assert_eq!(cd.idletime_state, IdleTimeState::Idle);
    assert!(!cd.timeout_active);
    assert!(!test.ctx.timer_pending(h));
}

#[test]
fn test_fixed_unit_activity_in_check_window() {
    debug::setup_logging_verbose();
    let mut test = L4Test::new(default_test_config());
    let h = test.outgoing_call(0, ShortholdData::fixed(40, 100, 10), false);
    test.messages();

    test.run_to_second(55);
    test.ctx.bch_activity(h).unwrap();

    test.run_to_second(90);
    assert!(test.l3().disconnects.is_empty());
    assert_eq!(test.ctx.call(h).unwrap().idletime_state, IdleTimeState::Safe);

    // End of the first unit, the next one is charged
    test.run_to_second(100);
    assert_eq!(test.ctx.call(h).unwrap().idletime_state, IdleTimeState::NonCheck);
    assert_eq!(test.ctx.call(h).unwrap().cunits, 2);
    assert_eq!(charging(&test.messages()), vec![2]);

    // No traffic in the second check window
    test.run_to_second(189);
    assert!(test.l3().disconnects.is_empty());
    test.run_to_second(190);
    assert_eq!(test.l3().disconnects.len(), 1);
    assert_eq!(types(&test.messages()), vec![MsgType::IdleTimeoutInd]);
}

#[test]
fn test_variable_unit() {
    debug::setup_logging_verbose();
    let mut test = L4Test::new(default_test_config());
    let h = test.outgoing_call(0, ShortholdData::variable(20, 60), false);
    assert_eq!(test.ctx.call(h).unwrap().idletime_state, IdleTimeState::Check);

    // Variable units are not charged locally
    assert_eq!(charging(&test.messages()), Vec::<i32>::new());

    // First check one second before the end of the first unit
    test.run_to_second(58);
    assert!(test.l3().disconnects.is_empty());
    test.run_to_second(59);
    assert_eq!(test.l3().disconnects.len(), 1);
}

#[test]
fn test_variable_unit_continuous_traffic() {
    debug::setup_logging_verbose();
    let mut test = L4Test::new(default_test_config());
    let h = test.outgoing_call(0, ShortholdData::variable(20, 60), false);

    for second in 1..=200 {
        test.run_to_second(second);
        test.ctx.bch_activity(h).unwrap();
    }
    assert!(test.l3().disconnects.is_empty());
    assert!(test.ctx.timer_pending(h));

    test.run_to_second(219);
    assert!(test.l3().disconnects.is_empty());
    test.run_to_second(220);
    assert_eq!(test.l3().disconnects.len(), 1);
    assert!(!test.ctx.timer_pending(h));
}

#[test]
fn test_charge_per_unit() {
    debug::setup_logging_verbose();
    let mut test = L4Test::new(default_test_config());
    let h = test.outgoing_call(0, ShortholdData::fixed(10, 30, 5), false);

    for second in 1..=120 {
        test.run_to_second(second);
        test.ctx.bch_activity(h).unwrap();
    }
    assert!(test.l3().disconnects.is_empty());
    // Units start at 0, 30, 60, 90 and 120
    assert_eq!(test.ctx.call(h).unwrap().cunits, 5);
    assert_eq!(charging(&test.messages()), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_no_local_charging_with_aocd() {
    debug::setup_logging_verbose();
    let mut test = L4Test::new(default_test_config());
    let h = test.outgoing_call(0, ShortholdData::fixed(10, 30, 5), true);

    for second in 1..=120 {
        test.run_to_second(second);
        test.ctx.bch_activity(h).unwrap();
    }
    assert!(test.l3().disconnects.is_empty());
    assert_eq!(test.ctx.call(h).unwrap().cunits, 0);
    assert_eq!(charging(&test.messages()), Vec::<i32>::new());

    // Units reported by the network are passed on as they are
    test.ctx.network_charge(h, 7, ChargeType::Aocd).unwrap();
    let msgs = test.messages();
    assert_eq!(
        msgs[0].msg,
        L4Msg::ChargingInd(ChargingInd {
            units_type: ChargeType::Aocd,
            units: 7
        })
    );
}

#[test]
fn test_unit_too_short_for_shorthold() {
    debug::setup_logging_verbose();
    let mut test = L4Test::new(default_test_config());
    let h = test.outgoing_call(0, ShortholdData::fixed(40, 50, 10), false);

    assert!(!test.ctx.call(h).unwrap().timeout_active);
    assert!(!test.ctx.timer_pending(h));
    assert_eq!(types(&test.messages()), vec![MsgType::ConnectActiveInd]);

    test.run_to_second(300);
    assert!(test.l3().disconnects.is_empty());
}

#[test]
fn test_no_idle_time_no_timeout() {
    debug::setup_logging_verbose();
    let mut test = L4Test::new(default_test_config());
    let out = test.outgoing_call(0, ShortholdData::fixed(0, 100, 10), false);
    let inc = test.incoming_call(1, 0);

    assert!(!test.ctx.call(out).unwrap().timeout_active);
    assert!(!test.ctx.call(inc).unwrap().timeout_active);
    assert_eq!(test.ctx.num_pending_callouts(), 0);
}

#[test]
fn test_simple_idle_timeout() {
    debug::setup_logging_verbose();
    let mut test = L4Test::new(default_test_config());
    let h = test.outgoing_call(0, ShortholdData::fixed(30, 0, 0), false);
    assert!(test.ctx.call(h).unwrap().timeout_active);
    assert_eq!(charging(&test.messages()), Vec::<i32>::new());

    test.run_to_second(10);
    test.ctx.bch_activity(h).unwrap();
    test.run_to_second(39);
    assert!(test.l3().disconnects.is_empty());
    test.run_to_second(40);
    assert_eq!(test.l3().disconnects.len(), 1);
}

#[test]
fn test_incoming_idle_from_driver() {
    debug::setup_logging_verbose();
    let mut test = L4Test::new(default_test_config());
    let h = test.incoming_call(0, 20);
    assert!(test.ctx.call(h).unwrap().timeout_active);

    // The driver keeps track of traffic itself
    test.run_to_second(15);
    test.l4().idletime = Some(15);
    test.run_to_second(34);
    assert!(test.l3().disconnects.is_empty());
    test.run_to_second(35);
    assert_eq!(test.l3().disconnects.len(), 1);
}
