use std::sync::{Arc, Mutex};

use i4b_core::{BProt, Cause, Cdid, IsdnIf, L4DriverId, L4Softc, Seconds};
use i4b_l4::{BChannelDriver, CallDesc, DialStatus, IsdnLinkTab, L3Driver, L4Driver, MgmtCmd};

/// B-channel driver that records every configuration request
#[derive(Default)]
pub struct MockBch {
    configs: Mutex<Vec<(usize, BProt, bool)>>,
    tx_starts: Mutex<Vec<usize>>,
}

impl MockBch {
    /// (channel, bprot, activate) for each bch_config call, in order
    pub fn take_configs(&self) -> Vec<(usize, BProt, bool)> {
        std::mem::take(&mut *self.configs.lock().unwrap())
    }
}

impl BChannelDriver for MockBch {
    fn bch_config(&self, channel: usize, bprot: BProt, activate: bool) {
        tracing::debug!("bch_config ch {} {:?} activate {}", channel, bprot, activate);
        self.configs.lock().unwrap().push((channel, bprot, activate));
    }

    fn bch_tx_start(&self, channel: usize) {
        self.tx_starts.lock().unwrap().push(channel);
    }
}

/// Layer 3 of a controller. Collects disconnect requests and management
/// commands for later inspection.
pub struct MockL3 {
    pub isdnif: IsdnIf,
    pub nbch: usize,
    pub bch: Arc<MockBch>,
    pub disconnects: Vec<(Cdid, Cause)>,
    pub mgmt: Vec<(MgmtCmd, i32)>,
    pub l4_bindings: Vec<(usize, L4DriverId, L4Softc)>,
}

impl MockL3 {
    pub fn new(isdnif: IsdnIf, nbch: usize, bch: Arc<MockBch>) -> Self {
        Self {
            isdnif,
            nbch,
            bch,
            disconnects: vec![],
            mgmt: vec![],
            l4_bindings: vec![],
        }
    }
}

impl L3Driver for MockL3 {
    fn disconnect_request(&mut self, cd: &CallDesc, cause: Cause) {
        tracing::debug!("disconnect_request {:?} {:?}", cd.cdid, cause);
        self.disconnects.push((cd.cdid, cause));
    }

    fn mgmt_command(&mut self, cmd: MgmtCmd, arg: i32) {
        self.mgmt.push((cmd, arg));
    }

    fn get_linktab(&mut self, channel: usize) -> Option<IsdnLinkTab> {
        if channel >= self.nbch {
            return None;
        }
        Some(IsdnLinkTab {
            isdnif: self.isdnif,
            channel,
            bch: self.bch.clone(),
        })
    }

    fn set_l4_driver(&mut self, channel: usize, driver: L4DriverId, softc: L4Softc) {
        self.l4_bindings.push((channel, driver, softc));
    }
}

/// Application driver with a fixed number of units
pub struct MockL4 {
    pub units: u32,
    /// Reported as the last traffic second when set
    pub idletime: Option<Seconds>,
    pub connected: Vec<(L4Softc, Cdid)>,
    pub disconnected: Vec<(L4Softc, Cdid)>,
    /// (softc, channel) for every set_linktab, `None` when detached
    pub linktabs: Vec<(L4Softc, Option<usize>)>,
    pub dial_responses: Vec<(L4Softc, DialStatus, Cause)>,
    pub updowns: Vec<(L4Softc, bool)>,
}

impl MockL4 {
    pub fn new(units: u32) -> Self {
        Self {
            units,
            idletime: None,
            connected: vec![],
            disconnected: vec![],
            linktabs: vec![],
            dial_responses: vec![],
            updowns: vec![],
        }
    }
}

impl L4Driver for MockL4 {
    fn get_softc(&mut self, unit: u32) -> Option<L4Softc> {
        (unit < self.units).then_some(L4Softc(unit))
    }

    fn set_linktab(&mut self, softc: L4Softc, ilt: Option<IsdnLinkTab>) {
        self.linktabs.push((softc, ilt.map(|ilt| ilt.channel)));
    }

    fn line_connected(&mut self, softc: L4Softc, cd: &CallDesc) {
        self.connected.push((softc, cd.cdid));
    }

    fn line_disconnected(&mut self, softc: L4Softc, cd: &CallDesc) {
        self.disconnected.push((softc, cd.cdid));
    }

    fn get_idletime(&self, _softc: L4Softc) -> Option<Seconds> {
        self.idletime
    }

    fn dial_response(&mut self, softc: L4Softc, status: DialStatus, cause: Cause) {
        self.dial_responses.push((softc, status, cause));
    }

    fn updown(&mut self, softc: L4Softc, up: bool) {
        self.updowns.push((softc, up));
    }
}
