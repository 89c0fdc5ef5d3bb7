use core::fmt;
use std::sync::Arc;

use as_any::AsAny;
use i4b_core::{BProt, Cause, IsdnIf, L4DriverId, L4Softc};

use crate::call_desc::CallDesc;

/// Management commands passed down to a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MgmtCmd {
    /// The daemon opened the device
    DaemonOpen,
    /// The daemon closed the device
    DaemonClose,
}

/// Traffic counters of one B-channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BchStats {
    pub outbytes: u64,
    pub inbytes: u64,
}

/// Raw B-channel I/O of a controller
pub trait BChannelDriver: Send + Sync {
    /// Set up (`activate`) or shut down a channel with the given protocol
    fn bch_config(&self, channel: usize, bprot: BProt, activate: bool);

    /// Start transmitting queued data
    fn bch_tx_start(&self, channel: usize);

    /// Read and reset the traffic counters
    fn bch_stat(&self, _channel: usize) -> Option<BchStats> {
        None
    }
}

/// One B-channel of a controller as handed to an application driver
#[derive(Clone)]
pub struct IsdnLinkTab {
    pub isdnif: IsdnIf,
    pub channel: usize,
    pub bch: Arc<dyn BChannelDriver>,
}

impl fmt::Debug for IsdnLinkTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IsdnLinkTab(isdnif {} ch {})", self.isdnif, self.channel)
    }
}

/// Layer 3 (D-channel protocol) side of a controller
pub trait L3Driver: Send + AsAny {
    /// Clear the call towards the network
    fn disconnect_request(&mut self, cd: &CallDesc, cause: Cause);

    fn mgmt_command(&mut self, cmd: MgmtCmd, arg: i32);

    /// Link table for one B-channel, `None` if the channel has none
    fn get_linktab(&mut self, channel: usize) -> Option<IsdnLinkTab>;

    /// Informs the controller which application driver instance serves a channel
    fn set_l4_driver(&mut self, _channel: usize, _driver: L4DriverId, _softc: L4Softc) {}
}
