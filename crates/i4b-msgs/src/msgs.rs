//! Message bodies. Integer fields are C `int`s on the wire.

use crate::enums::{AcctType, ChargeType, CtrlEvent, Layer, LayerState, PacketDir};

/// Incoming call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectInd {
    pub controller: i32,
    pub channel: i32,
    pub bprot: i32,
    /// Called party number
    pub dst_telno: String,
    /// Calling party number
    pub src_telno: String,
    /// Screening indicator
    pub scr_ind: i32,
    /// Presentation indicator
    pub prs_ind: i32,
    pub display: String,
}

/// The B-channel is connected and data may flow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectActiveInd {
    pub controller: i32,
    pub channel: i32,
    pub datetime: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisconnectInd {
    /// Cause type in bits 8.., cause value in bits 0..8
    pub cause: i32,
}

/// An L4 driver wants to place a call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialoutInd {
    pub driver: i32,
    pub driver_unit: i32,
}

/// The layer 4 hung up an idle call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdleTimeoutInd;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountingInd {
    pub driver: i32,
    pub driver_unit: i32,
    pub accttype: AcctType,
    /// Raw bytes out, including protocol overhead
    pub ioutbytes: i32,
    pub iinbytes: i32,
    /// Bytes per second, out
    pub outbps: i32,
    pub inbps: i32,
    /// Payload bytes out
    pub outbytes: i32,
    pub inbytes: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChargingInd {
    pub units_type: ChargeType,
    pub units: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProceedingInd {
    pub controller: i32,
    pub channel: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertInd;

/// An L4 driver wants its call to be dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrvrDiscReq {
    pub driver: i32,
    pub driver_unit: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L12StatInd {
    pub controller: i32,
    pub layer: Layer,
    pub state: LayerState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeiAsgInd {
    pub controller: i32,
    /// Assigned TEI, or -1 when it was removed
    pub tei: i32,
}

/// A controller was deactivated and its calls were torn down
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdeactInd {
    pub controller: i32,
    pub numactive: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NegCompleteInd;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IfStateChangedInd {
    pub state: i32,
}

/// Dialout request carrying the number to dial. `cmd` holds at most
/// `TELNO_MAX` bytes and is not NUL terminated when full.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialoutNumberInd {
    pub driver: i32,
    pub driver_unit: i32,
    pub cmd: Vec<u8>,
}

/// First bytes of a packet that caused a dialout or kept a call up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketInd {
    pub driver: i32,
    pub driver_unit: i32,
    pub direction: PacketDir,
    pub pktdata: Vec<u8>,
}

/// Keypad facility request, `cmd` holds at most `KEYPAD_MAX` bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeypadInd {
    pub driver: i32,
    pub driver_unit: i32,
    pub cmd: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContrEvInd {
    pub controller: i32,
    pub event: CtrlEvent,
}
