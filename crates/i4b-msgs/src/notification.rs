use core::fmt;

use crate::msg_type::MsgType;
use crate::msgs::*;

/// Exhaustive list of messages the layer 4 sends to the daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum L4Msg {
    ConnectInd(ConnectInd),
    ConnectActiveInd(ConnectActiveInd),
    DisconnectInd(DisconnectInd),
    DialoutInd(DialoutInd),
    IdleTimeoutInd(IdleTimeoutInd),
    AccountingInd(AccountingInd),
    ChargingInd(ChargingInd),
    ProceedingInd(ProceedingInd),
    AlertInd(AlertInd),
    DrvrDiscReq(DrvrDiscReq),
    L12StatInd(L12StatInd),
    TeiAsgInd(TeiAsgInd),
    PdeactInd(PdeactInd),
    NegCompleteInd(NegCompleteInd),
    IfStateChangedInd(IfStateChangedInd),
    DialoutNumberInd(DialoutNumberInd),
    PacketInd(PacketInd),
    KeypadInd(KeypadInd),
    ContrEvInd(ContrEvInd),
}

impl L4Msg {
    pub fn msg_type(&self) -> MsgType {
        match self {
            L4Msg::ConnectInd(_) => MsgType::ConnectInd,
            L4Msg::ConnectActiveInd(_) => MsgType::ConnectActiveInd,
            L4Msg::DisconnectInd(_) => MsgType::DisconnectInd,
            L4Msg::DialoutInd(_) => MsgType::DialoutInd,
            L4Msg::IdleTimeoutInd(_) => MsgType::IdleTimeoutInd,
            L4Msg::AccountingInd(_) => MsgType::AccountingInd,
            L4Msg::ChargingInd(_) => MsgType::ChargingInd,
            L4Msg::ProceedingInd(_) => MsgType::ProceedingInd,
            L4Msg::AlertInd(_) => MsgType::AlertInd,
            L4Msg::DrvrDiscReq(_) => MsgType::DrvrDiscReq,
            L4Msg::L12StatInd(_) => MsgType::L12StatInd,
            L4Msg::TeiAsgInd(_) => MsgType::TeiAsgInd,
            L4Msg::PdeactInd(_) => MsgType::PdeactInd,
            L4Msg::NegCompleteInd(_) => MsgType::NegCompleteInd,
            L4Msg::IfStateChangedInd(_) => MsgType::IfStateChangedInd,
            L4Msg::DialoutNumberInd(_) => MsgType::DialoutNumberInd,
            L4Msg::PacketInd(_) => MsgType::PacketInd,
            L4Msg::KeypadInd(_) => MsgType::KeypadInd,
            L4Msg::ContrEvInd(_) => MsgType::ContrEvInd,
        }
    }

    /// Controller level events overtake queued call messages
    pub fn is_hipri(&self) -> bool {
        matches!(self, L4Msg::PdeactInd(_) | L4Msg::L12StatInd(_) | L4Msg::TeiAsgInd(_))
    }
}

impl fmt::Display for L4Msg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.msg_type(), f)
    }
}

/// A message as read by the daemon: header plus body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Call the message refers to, -1 for controller level messages
    pub cdid: i32,
    pub msg: L4Msg,
}

impl Notification {
    /// `cdid` of messages which do not refer to a call
    pub const NO_CALL: i32 = -1;

    pub fn new(cdid: i32, msg: L4Msg) -> Self {
        Self { cdid, msg }
    }

    pub fn without_call(msg: L4Msg) -> Self {
        Self { cdid: Self::NO_CALL, msg }
    }

    pub fn msg_type(&self) -> MsgType {
        self.msg.msg_type()
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cdid {}", self.msg, self.cdid)
    }
}
