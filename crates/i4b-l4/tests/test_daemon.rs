mod common;

use std::sync::Arc;
use std::time::Duration;

use i4b_config::SharedConfig;
use i4b_core::{ShortholdData, debug};
use i4b_l4::{AcctCounters, L4Context, MgmtCmd};
use i4b_msgs::{
    AcctType, DialoutInd, L4Msg, L12StatInd, Layer, LayerState, MAX_PACKET_LOG, MsgType, Notification, PacketDir,
};
use common::{L4Test, MockBch, MockL3, default_test_config};

#[test]
fn test_messages_dropped_without_daemon() {
    debug::setup_logging_verbose();
    let mut ctx = L4Context::new(SharedConfig::new(100, 4));
    let isdnif = ctx.attach_isdnif("isic0", "Teles", 2, Box::new(MockL3::new(0, 2, Arc::new(MockBch::default()))));
    ctx.isdnif_ready(isdnif).unwrap();
    ctx.teiasg(isdnif, 64);
    assert_eq!(ctx.pending_messages(), 0);

    let reader = ctx.daemon_attached();
    assert_eq!(reader.try_read(), None);
    ctx.l12stat(isdnif, Layer::One, LayerState::Active);
    assert_eq!(ctx.pending_messages(), 1);

    ctx.daemon_detached();
    // Queued messages can still be read, then the stream ends
    assert_eq!(reader.read().map(|m| m.msg_type()), Some(MsgType::L12StatInd));
    assert_eq!(reader.read(), None);
}

#[test]
fn test_full_queue_drops_oldest() {
    debug::setup_logging_verbose();
    let mut config = default_test_config();
    config.notify.queue_len = 2;
    let mut test = L4Test::new(config);
    let driver = test.driver;

    for unit in 0..3 {
        test.ctx.dialout(driver, unit);
    }
    let units: Vec<i32> = test
        .messages()
        .iter()
        .filter_map(|m| match &m.msg {
            L4Msg::DialoutInd(d) => Some(d.driver_unit),
            _ => None,
        })
        .collect();
    assert_eq!(units, vec![1, 2]);
}

#[test]
fn test_controller_events_read_first() {
    debug::setup_logging_verbose();
    let mut test = L4Test::new(default_test_config());
    let driver = test.driver;

    test.ctx.dialout(driver, 0);
    test.ctx.l12stat(test.isdnif, Layer::Two, LayerState::Idle);

    let first = test.reader.read_timeout(Duration::from_millis(100)).unwrap();
    assert_eq!(
        first,
        Notification::without_call(L4Msg::L12StatInd(L12StatInd {
            controller: test.isdnif as i32,
            layer: Layer::Two,
            state: LayerState::Idle,
        }))
    );
    let second = test.reader.read_timeout(Duration::from_millis(100)).unwrap();
    assert_eq!(
        second,
        Notification::without_call(L4Msg::DialoutInd(DialoutInd {
            driver: driver.0 as i32,
            driver_unit: 0
        }))
    );
}

#[test]
fn test_driver_messages() {
    debug::setup_logging_verbose();
    let mut test = L4Test::new(default_test_config());
    let driver = test.driver;

    test.ctx.dialoutnumber(driver, 1, b"0301234567");
    test.ctx.keypad(driver, 1, b"*21#");
    test.ctx.drvrdisc(driver, 1);
    test.ctx.accounting(
        driver,
        1,
        AcctType::Final,
        AcctCounters {
            outbytes: 1000,
            inbytes: 2000,
            ..Default::default()
        },
    );
    test.ctx.packet_ind(driver, 1, PacketDir::Out, &[0x45; 100]);

    let msgs = test.messages();
    assert_eq!(
        msgs.iter().map(|m| m.msg_type()).collect::<Vec<_>>(),
        vec![
            MsgType::DialoutNumberInd,
            MsgType::KeypadInd,
            MsgType::DrvrDiscReq,
            MsgType::AccountingInd,
            MsgType::PacketInd,
        ]
    );
    assert!(msgs.iter().all(|m| m.cdid == Notification::NO_CALL));
    match &msgs[3].msg {
        L4Msg::AccountingInd(a) => {
            assert_eq!(a.accttype, AcctType::Final);
            assert_eq!((a.outbytes, a.inbytes), (1000, 2000));
        }
        other => panic!("unexpected {:?}", other),
    }
    match &msgs[4].msg {
        L4Msg::PacketInd(p) => assert_eq!(p.pktdata.len(), MAX_PACKET_LOG),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_read_notification_wire_format() {
    debug::setup_logging_verbose();
    let mut test = L4Test::new(default_test_config());
    let h = test.outgoing_call(0, ShortholdData::fixed(40, 100, 10), false);
    let cdid = test.ctx.call(h).unwrap().cdid;

    let msg = test.reader.try_read().unwrap();
    assert_eq!(msg.msg_type(), MsgType::ChargingInd);
    let bytes = msg.encode();
    assert_eq!(&bytes[0..4], &(b'g' as u32).to_le_bytes());
    assert_eq!(&bytes[4..8], &cdid.wire().to_le_bytes());
    assert_eq!(Notification::decode(&bytes), Ok(msg));

    test.messages();
    test.ctx.pdeact(test.isdnif, 1);
    let bytes = test.reader.try_read().unwrap().encode();
    assert_eq!(&bytes[0..4], &(b'm' as u32).to_le_bytes());
    assert_eq!(&bytes[4..8], &[0xff; 4]);
}

#[test]
fn test_reader_on_other_thread() {
    debug::setup_logging_verbose();
    let mut test = L4Test::new(default_test_config());
    let reader = test.reader.clone();
    let t = std::thread::spawn(move || {
        let mut got = vec![];
        while let Some(msg) = reader.read() {
            got.push(msg.msg_type());
        }
        got
    });

    test.outgoing_call(0, ShortholdData::fixed(40, 100, 10), false);
    test.run_to_second(90);
    test.ctx.daemon_detached();
    assert_eq!(test.l3().mgmt, vec![(MgmtCmd::DaemonClose, 0)]);

    assert_eq!(
        t.join().unwrap(),
        vec![MsgType::ChargingInd, MsgType::ConnectActiveInd, MsgType::IdleTimeoutInd]
    );
}
