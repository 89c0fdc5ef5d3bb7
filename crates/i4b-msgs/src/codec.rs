//! Fixed layout encoding of daemon messages (8-byte `{type, cdid}` header, little-endian)
//!
//! All integers are 32 bit. Strings occupy fixed size buffers, are NUL padded
//! and truncated so that a terminating NUL always fits. Command buffers of
//! dialout number and keypad messages are preceded by their length and may
//! fill the whole buffer.

use crate::enums::*;
use crate::msg_type::MsgType;
use crate::msgs::*;
use crate::notification::{L4Msg, Notification};
use crate::{DATETIME_MAX, DISPLAY_MAX, KEYPAD_MAX, MAX_PACKET_LOG, TELNO_MAX};

/// Header: type(4) + cdid(4)
pub const HDR_LEN: usize = 8;

/// Parse error
#[derive(Debug, PartialEq, Eq)]
pub enum MsgParseErr {
    TooShort(usize),
    UnknownType(u32),
    BadValue { field: &'static str, value: i32 },
    InvalidUtf8(&'static str),
}

impl std::fmt::Display for MsgParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort(n) => write!(f, "message too short: {} bytes", n),
            Self::UnknownType(t) => write!(f, "unknown message type: 0x{:02x}", t),
            Self::BadValue { field, value } => write!(f, "invalid value {} for {}", value, field),
            Self::InvalidUtf8(field) => write!(f, "invalid UTF-8 in {}", field),
        }
    }
}

impl std::error::Error for MsgParseErr {}

/// Size of the complete message of the given type, header included
pub fn wire_len(msg_type: MsgType) -> usize {
    let body = match msg_type {
        MsgType::ConnectInd => 4 * 5 + 2 * TELNO_MAX + DISPLAY_MAX,
        MsgType::ConnectActiveInd => 4 * 2 + DATETIME_MAX,
        MsgType::DisconnectInd => 4,
        MsgType::DialoutInd => 4 * 2,
        MsgType::IdleTimeoutInd => 0,
        MsgType::AccountingInd => 4 * 9,
        MsgType::ChargingInd => 4 * 2,
        MsgType::ProceedingInd => 4 * 2,
        MsgType::AlertInd => 0,
        MsgType::DrvrDiscReq => 4 * 2,
        MsgType::L12StatInd => 4 * 3,
        MsgType::TeiAsgInd => 4 * 2,
        MsgType::PdeactInd => 4 * 2,
        MsgType::NegCompleteInd => 0,
        MsgType::IfStateChangedInd => 4,
        MsgType::DialoutNumberInd => 4 * 3 + TELNO_MAX,
        MsgType::PacketInd => 4 * 3 + MAX_PACKET_LOG,
        MsgType::KeypadInd => 4 * 3 + KEYPAD_MAX,
        MsgType::ContrEvInd => 4 * 2,
    };
    HDR_LEN + body
}

// ─── Writing ──────────────────────────────────────────────────────

/// Write a little-endian u32 to a byte vec
fn write_u32_le(buf: &mut Vec<u8>, val: u32) {
    buf.extend_from_slice(&val.to_le_bytes());
}

/// Write a little-endian i32 to a byte vec
fn write_i32_le(buf: &mut Vec<u8>, val: i32) {
    buf.extend_from_slice(&val.to_le_bytes());
}

/// Write `s` into a NUL padded buffer of `size` bytes, cut at a char
/// boundary so at least one NUL remains
fn write_str_fixed(buf: &mut Vec<u8>, s: &str, size: usize) {
    let mut end = s.len().min(size - 1);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    buf.extend_from_slice(&s.as_bytes()[..end]);
    buf.resize(buf.len() + size - end, 0);
}

/// Write raw bytes into a zero padded buffer of `size` bytes
fn write_bytes_fixed(buf: &mut Vec<u8>, data: &[u8], size: usize) {
    let end = data.len().min(size);
    buf.extend_from_slice(&data[..end]);
    buf.resize(buf.len() + size - end, 0);
}

/// Write a length-prefixed command buffer, the length is clamped to `size`
fn write_cmd(buf: &mut Vec<u8>, cmd: &[u8], size: usize) {
    let cmdlen = cmd.len().min(size);
    write_i32_le(buf, cmdlen as i32);
    write_bytes_fixed(buf, &cmd[..cmdlen], size);
}

impl Notification {
    /// Serialize into the fixed wire layout
    pub fn encode(&self) -> Vec<u8> {
        let msg_type = self.msg_type();
        let mut buf = Vec::with_capacity(wire_len(msg_type));
        write_u32_le(&mut buf, msg_type.into_raw());
        write_i32_le(&mut buf, self.cdid);

        match &self.msg {
            L4Msg::ConnectInd(m) => {
                write_i32_le(&mut buf, m.controller);
                write_i32_le(&mut buf, m.channel);
                write_i32_le(&mut buf, m.bprot);
                write_str_fixed(&mut buf, &m.dst_telno, TELNO_MAX);
                write_str_fixed(&mut buf, &m.src_telno, TELNO_MAX);
                write_i32_le(&mut buf, m.scr_ind);
                write_i32_le(&mut buf, m.prs_ind);
                write_str_fixed(&mut buf, &m.display, DISPLAY_MAX);
            }
            L4Msg::ConnectActiveInd(m) => {
                write_i32_le(&mut buf, m.controller);
                write_i32_le(&mut buf, m.channel);
                write_str_fixed(&mut buf, &m.datetime, DATETIME_MAX);
            }
            L4Msg::DisconnectInd(m) => write_i32_le(&mut buf, m.cause),
            L4Msg::DialoutInd(m) => {
                write_i32_le(&mut buf, m.driver);
                write_i32_le(&mut buf, m.driver_unit);
            }
            L4Msg::IdleTimeoutInd(_) | L4Msg::AlertInd(_) | L4Msg::NegCompleteInd(_) => {}
            L4Msg::AccountingInd(m) => {
                write_i32_le(&mut buf, m.driver);
                write_i32_le(&mut buf, m.driver_unit);
                write_i32_le(&mut buf, m.accttype.to_int());
                write_i32_le(&mut buf, m.ioutbytes);
                write_i32_le(&mut buf, m.iinbytes);
                write_i32_le(&mut buf, m.outbps);
                write_i32_le(&mut buf, m.inbps);
                write_i32_le(&mut buf, m.outbytes);
                write_i32_le(&mut buf, m.inbytes);
            }
            L4Msg::ChargingInd(m) => {
                write_i32_le(&mut buf, m.units_type.to_int());
                write_i32_le(&mut buf, m.units);
            }
            L4Msg::ProceedingInd(m) => {
                write_i32_le(&mut buf, m.controller);
                write_i32_le(&mut buf, m.channel);
            }
            L4Msg::DrvrDiscReq(m) => {
                write_i32_le(&mut buf, m.driver);
                write_i32_le(&mut buf, m.driver_unit);
            }
            L4Msg::L12StatInd(m) => {
                write_i32_le(&mut buf, m.controller);
                write_i32_le(&mut buf, m.layer.to_int());
                write_i32_le(&mut buf, m.state.to_int());
            }
            L4Msg::TeiAsgInd(m) => {
                write_i32_le(&mut buf, m.controller);
                write_i32_le(&mut buf, m.tei);
            }
            L4Msg::PdeactInd(m) => {
                write_i32_le(&mut buf, m.controller);
                write_i32_le(&mut buf, m.numactive);
            }
            L4Msg::IfStateChangedInd(m) => write_i32_le(&mut buf, m.state),
            L4Msg::DialoutNumberInd(m) => {
                write_i32_le(&mut buf, m.driver);
                write_i32_le(&mut buf, m.driver_unit);
                write_cmd(&mut buf, &m.cmd, TELNO_MAX);
            }
            L4Msg::PacketInd(m) => {
                write_i32_le(&mut buf, m.driver);
                write_i32_le(&mut buf, m.driver_unit);
                write_i32_le(&mut buf, m.direction.to_int());
                write_bytes_fixed(&mut buf, &m.pktdata, MAX_PACKET_LOG);
            }
            L4Msg::KeypadInd(m) => {
                write_i32_le(&mut buf, m.driver);
                write_i32_le(&mut buf, m.driver_unit);
                write_cmd(&mut buf, &m.cmd, KEYPAD_MAX);
            }
            L4Msg::ContrEvInd(m) => {
                write_i32_le(&mut buf, m.controller);
                write_i32_le(&mut buf, m.event.to_int());
            }
        }

        debug_assert_eq!(buf.len(), wire_len(msg_type));
        buf
    }

    /// Parse a message in the fixed wire layout. Trailing bytes are ignored.
    pub fn decode(data: &[u8]) -> Result<Notification, MsgParseErr> {
        if data.len() < HDR_LEN {
            return Err(MsgParseErr::TooShort(data.len()));
        }
        let raw_type = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let msg_type = MsgType::try_from_raw(raw_type).map_err(MsgParseErr::UnknownType)?;
        if data.len() < wire_len(msg_type) {
            return Err(MsgParseErr::TooShort(data.len()));
        }

        let mut r = WireReader { data, pos: 4 };
        let cdid = r.i32();

        let msg = match msg_type {
            MsgType::ConnectInd => L4Msg::ConnectInd(ConnectInd {
                controller: r.i32(),
                channel: r.i32(),
                bprot: r.i32(),
                dst_telno: r.str_fixed(TELNO_MAX, "dst_telno")?,
                src_telno: r.str_fixed(TELNO_MAX, "src_telno")?,
                scr_ind: r.i32(),
                prs_ind: r.i32(),
                display: r.str_fixed(DISPLAY_MAX, "display")?,
            }),
            MsgType::ConnectActiveInd => L4Msg::ConnectActiveInd(ConnectActiveInd {
                controller: r.i32(),
                channel: r.i32(),
                datetime: r.str_fixed(DATETIME_MAX, "datetime")?,
            }),
            MsgType::DisconnectInd => L4Msg::DisconnectInd(DisconnectInd { cause: r.i32() }),
            MsgType::DialoutInd => L4Msg::DialoutInd(DialoutInd {
                driver: r.i32(),
                driver_unit: r.i32(),
            }),
            MsgType::IdleTimeoutInd => L4Msg::IdleTimeoutInd(IdleTimeoutInd),
            MsgType::AccountingInd => {
                let driver = r.i32();
                let driver_unit = r.i32();
                let accttype = r.enum_val("accttype", AcctType::from_int)?;
                L4Msg::AccountingInd(AccountingInd {
                    driver,
                    driver_unit,
                    accttype,
                    ioutbytes: r.i32(),
                    iinbytes: r.i32(),
                    outbps: r.i32(),
                    inbps: r.i32(),
                    outbytes: r.i32(),
                    inbytes: r.i32(),
                })
            }
            MsgType::ChargingInd => L4Msg::ChargingInd(ChargingInd {
                units_type: r.enum_val("units_type", ChargeType::from_int)?,
                units: r.i32(),
            }),
            MsgType::ProceedingInd => L4Msg::ProceedingInd(ProceedingInd {
                controller: r.i32(),
                channel: r.i32(),
            }),
            MsgType::AlertInd => L4Msg::AlertInd(AlertInd),
            MsgType::DrvrDiscReq => L4Msg::DrvrDiscReq(DrvrDiscReq {
                driver: r.i32(),
                driver_unit: r.i32(),
            }),
            MsgType::L12StatInd => L4Msg::L12StatInd(L12StatInd {
                controller: r.i32(),
                layer: r.enum_val("layer", Layer::from_int)?,
                state: r.enum_val("state", LayerState::from_int)?,
            }),
            MsgType::TeiAsgInd => L4Msg::TeiAsgInd(TeiAsgInd {
                controller: r.i32(),
                tei: r.i32(),
            }),
            MsgType::PdeactInd => L4Msg::PdeactInd(PdeactInd {
                controller: r.i32(),
                numactive: r.i32(),
            }),
            MsgType::NegCompleteInd => L4Msg::NegCompleteInd(NegCompleteInd),
            MsgType::IfStateChangedInd => L4Msg::IfStateChangedInd(IfStateChangedInd { state: r.i32() }),
            MsgType::DialoutNumberInd => L4Msg::DialoutNumberInd(DialoutNumberInd {
                driver: r.i32(),
                driver_unit: r.i32(),
                cmd: r.cmd(TELNO_MAX)?,
            }),
            MsgType::PacketInd => L4Msg::PacketInd(PacketInd {
                driver: r.i32(),
                driver_unit: r.i32(),
                direction: r.enum_val("direction", PacketDir::from_int)?,
                pktdata: r.bytes(MAX_PACKET_LOG).to_vec(),
            }),
            MsgType::KeypadInd => L4Msg::KeypadInd(KeypadInd {
                driver: r.i32(),
                driver_unit: r.i32(),
                cmd: r.cmd(KEYPAD_MAX)?,
            }),
            MsgType::ContrEvInd => L4Msg::ContrEvInd(ContrEvInd {
                controller: r.i32(),
                event: r.enum_val("event", CtrlEvent::from_int)?,
            }),
        };

        Ok(Notification { cdid, msg })
    }
}

// ─── Reading ──────────────────────────────────────────────────────

/// Sequential reader over a message whose length was checked up front
struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    fn bytes(&mut self, n: usize) -> &'a [u8] {
        let b = &self.data[self.pos..self.pos + n];
        self.pos += n;
        b
    }

    fn i32(&mut self) -> i32 {
        let b = self.bytes(4);
        i32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    fn enum_val<T>(&mut self, field: &'static str, f: fn(i32) -> Option<T>) -> Result<T, MsgParseErr> {
        let value = self.i32();
        f(value).ok_or(MsgParseErr::BadValue { field, value })
    }

    fn str_fixed(&mut self, size: usize, field: &'static str) -> Result<String, MsgParseErr> {
        let b = self.bytes(size);
        let end = b.iter().position(|&c| c == 0).unwrap_or(b.len());
        let s = std::str::from_utf8(&b[..end]).map_err(|_| MsgParseErr::InvalidUtf8(field))?;
        Ok(s.to_string())
    }

    fn cmd(&mut self, size: usize) -> Result<Vec<u8>, MsgParseErr> {
        let cmdlen = self.i32();
        if cmdlen < 0 || cmdlen as usize > size {
            return Err(MsgParseErr::BadValue {
                field: "cmdlen",
                value: cmdlen,
            });
        }
        let b = self.bytes(size);
        Ok(b[..cmdlen as usize].to_vec())
    }
}
