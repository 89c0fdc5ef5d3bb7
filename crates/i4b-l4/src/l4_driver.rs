use as_any::AsAny;
use i4b_core::{Cause, L4Softc, Seconds};

use crate::call_desc::CallDesc;
use crate::l3_driver::IsdnLinkTab;

/// Result of a dialout attempt, as reported by the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialStatus {
    /// No error
    None,
    /// Temporary failure, a retry may succeed
    TempFail,
    /// Permanent failure
    PermFail,
    /// Dialout not allowed, the interface accepts incoming calls only
    InOnly,
}

impl DialStatus {
    pub fn from_int(v: i32) -> Option<Self> {
        match v {
            0 => Some(DialStatus::None),
            1 => Some(DialStatus::TempFail),
            2 => Some(DialStatus::PermFail),
            3 => Some(DialStatus::InOnly),
            _ => None,
        }
    }
}

/// Counters reported with an accounting indication
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcctCounters {
    pub ioutbytes: i32,
    pub iinbytes: i32,
    pub outbps: i32,
    pub inbps: i32,
    pub outbytes: i32,
    pub inbytes: i32,
}

/// Application (layer 4) driver, e.g. a network interface or a telephony
/// device. Each driver serves a number of units, each unit is an instance
/// identified by a softc handle.
pub trait L4Driver: Send + AsAny {
    /// Instance serving `unit`, `None` if the unit does not exist
    fn get_softc(&mut self, unit: u32) -> Option<L4Softc>;

    /// Attach (`Some`) or detach the B-channel an instance sends and receives on
    fn set_linktab(&mut self, softc: L4Softc, ilt: Option<IsdnLinkTab>);

    fn line_connected(&mut self, softc: L4Softc, cd: &CallDesc);

    fn line_disconnected(&mut self, softc: L4Softc, cd: &CallDesc);

    /// Last second with traffic as seen by the driver. Drivers that do not
    /// track this leave it to the call's own `last_active_time`.
    fn get_idletime(&self, _softc: L4Softc) -> Option<Seconds> {
        None
    }

    fn dial_response(&mut self, _softc: L4Softc, _status: DialStatus, _cause: Cause) {}

    /// Administrative up/down from the daemon
    fn updown(&mut self, _softc: L4Softc, _up: bool) {}
}
