//! Messages from the ISDN layer 4 to the userland daemon
//!
//! Every message starts with a `{type, cdid}` header followed by a fixed
//! layout body. See `codec` for the byte layout.

pub mod codec;
pub mod enums;
pub mod msg_type;
pub mod msgs;
pub mod notification;

pub use codec::MsgParseErr;
pub use enums::*;
pub use msg_type::MsgType;
pub use msgs::*;
pub use notification::{L4Msg, Notification};

/// Telephone number buffer size, including the terminating NUL
pub const TELNO_MAX: usize = 41;
/// Display information element buffer size
pub const DISPLAY_MAX: usize = 91;
/// Date/time information element buffer size
pub const DATETIME_MAX: usize = 21;
/// Keypad information element buffer size
pub const KEYPAD_MAX: usize = 35;
/// Number of leading packet bytes reported in a packet indication
pub const MAX_PACKET_LOG: usize = 40;
