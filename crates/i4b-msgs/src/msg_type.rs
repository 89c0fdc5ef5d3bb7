use core::fmt;

/// Message type codes, as found in the `type` field of the message header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgType {
    ConnectInd,
    ConnectActiveInd,
    DisconnectInd,
    DialoutInd,
    IdleTimeoutInd,
    AccountingInd,
    ChargingInd,
    ProceedingInd,
    AlertInd,
    DrvrDiscReq,
    L12StatInd,
    TeiAsgInd,
    PdeactInd,
    NegCompleteInd,
    IfStateChangedInd,
    DialoutNumberInd,
    PacketInd,
    KeypadInd,
    ContrEvInd,
}

impl MsgType {
    pub fn into_raw(self) -> u32 {
        let c = match self {
            MsgType::ConnectInd => b'a',
            MsgType::ConnectActiveInd => b'b',
            MsgType::DisconnectInd => b'c',
            MsgType::DialoutInd => b'd',
            MsgType::IdleTimeoutInd => b'e',
            MsgType::AccountingInd => b'f',
            MsgType::ChargingInd => b'g',
            MsgType::ProceedingInd => b'h',
            MsgType::AlertInd => b'i',
            MsgType::DrvrDiscReq => b'j',
            MsgType::L12StatInd => b'k',
            MsgType::TeiAsgInd => b'l',
            MsgType::PdeactInd => b'm',
            MsgType::NegCompleteInd => b'n',
            MsgType::IfStateChangedInd => b'o',
            MsgType::DialoutNumberInd => b'p',
            MsgType::PacketInd => b'q',
            MsgType::KeypadInd => b'r',
            MsgType::ContrEvInd => b's',
        };
        c as u32
    }

    pub fn try_from_raw(raw: u32) -> Result<Self, u32> {
        let Ok(c) = u8::try_from(raw) else {
            return Err(raw);
        };
        match c {
            b'a' => Ok(MsgType::ConnectInd),
            b'b' => Ok(MsgType::ConnectActiveInd),
            b'c' => Ok(MsgType::DisconnectInd),
            b'd' => Ok(MsgType::DialoutInd),
            b'e' => Ok(MsgType::IdleTimeoutInd),
            b'f' => Ok(MsgType::AccountingInd),
            b'g' => Ok(MsgType::ChargingInd),
            b'h' => Ok(MsgType::ProceedingInd),
            b'i' => Ok(MsgType::AlertInd),
            b'j' => Ok(MsgType::DrvrDiscReq),
            b'k' => Ok(MsgType::L12StatInd),
            b'l' => Ok(MsgType::TeiAsgInd),
            b'm' => Ok(MsgType::PdeactInd),
            b'n' => Ok(MsgType::NegCompleteInd),
            b'o' => Ok(MsgType::IfStateChangedInd),
            b'p' => Ok(MsgType::DialoutNumberInd),
            b'q' => Ok(MsgType::PacketInd),
            b'r' => Ok(MsgType::KeypadInd),
            b's' => Ok(MsgType::ContrEvInd),
            _ => Err(raw),
        }
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MsgType::ConnectInd => "MSG_CONNECT_IND",
            MsgType::ConnectActiveInd => "MSG_CONNECT_ACTIVE_IND",
            MsgType::DisconnectInd => "MSG_DISCONNECT_IND",
            MsgType::DialoutInd => "MSG_DIALOUT_IND",
            MsgType::IdleTimeoutInd => "MSG_IDLE_TIMEOUT_IND",
            MsgType::AccountingInd => "MSG_ACCT_IND",
            MsgType::ChargingInd => "MSG_CHARGING_IND",
            MsgType::ProceedingInd => "MSG_PROCEEDING_IND",
            MsgType::AlertInd => "MSG_ALERT_IND",
            MsgType::DrvrDiscReq => "MSG_DRVRDISC_REQ",
            MsgType::L12StatInd => "MSG_L12STAT_IND",
            MsgType::TeiAsgInd => "MSG_TEIASG_IND",
            MsgType::PdeactInd => "MSG_PDEACT_IND",
            MsgType::NegCompleteInd => "MSG_NEGCOMP_IND",
            MsgType::IfStateChangedInd => "MSG_IFSTATCHG_IND",
            MsgType::DialoutNumberInd => "MSG_DIALOUTNUMBER_IND",
            MsgType::PacketInd => "MSG_PACKET_IND",
            MsgType::KeypadInd => "MSG_KEYPAD_IND",
            MsgType::ContrEvInd => "MSG_CONTR_EV_IND",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_codes() {
        assert_eq!(MsgType::ConnectInd.into_raw(), 'a' as u32);
        assert_eq!(MsgType::IdleTimeoutInd.into_raw(), 'e' as u32);
        assert_eq!(MsgType::ContrEvInd.into_raw(), 's' as u32);
        assert_eq!(MsgType::try_from_raw('g' as u32), Ok(MsgType::ChargingInd));
        assert_eq!(MsgType::try_from_raw('z' as u32), Err('z' as u32));
        assert_eq!(MsgType::try_from_raw(0x161), Err(0x161));
    }
}
