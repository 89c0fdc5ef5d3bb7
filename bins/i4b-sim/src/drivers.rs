//! Loopback controller and a minimal IP-over-ISDN style application driver

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::Sender;
use i4b_core::{BProt, Cause, Cdid, IsdnIf, L4DriverId, L4Softc, Seconds};
use i4b_l4::{AcctCounters, BChannelDriver, BchStats, CallDesc, DialStatus, IsdnLinkTab, L3Driver, L4Driver, MgmtCmd};

/// Bytes counted for each frame sent on a loopback channel
const FRAME_LEN: u64 = 1500;

/// B-channels that echo every frame back
pub struct LoopbackBch {
    active: Vec<AtomicBool>,
    frames: Vec<AtomicU64>,
}

impl LoopbackBch {
    pub fn new(nbch: usize) -> Self {
        Self {
            active: (0..nbch).map(|_| AtomicBool::new(false)).collect(),
            frames: (0..nbch).map(|_| AtomicU64::new(0)).collect(),
        }
    }
}

impl BChannelDriver for LoopbackBch {
    fn bch_config(&self, channel: usize, bprot: BProt, activate: bool) {
        let Some(active) = self.active.get(channel) else {
            tracing::warn!("loopback: bch_config for bad channel {}", channel);
            return;
        };
        tracing::debug!("loopback: ch {} {:?} {}", channel, bprot, if activate { "up" } else { "down" });
        active.store(activate, Ordering::Relaxed);
    }

    fn bch_tx_start(&self, channel: usize) {
        match (self.active.get(channel), self.frames.get(channel)) {
            (Some(active), Some(frames)) if active.load(Ordering::Relaxed) => {
                frames.fetch_add(1, Ordering::Relaxed);
            }
            _ => tracing::debug!("loopback: tx on inactive channel {}", channel),
        }
    }

    fn bch_stat(&self, channel: usize) -> Option<BchStats> {
        let frames = self.frames.get(channel)?.swap(0, Ordering::Relaxed);
        Some(BchStats {
            outbytes: frames * FRAME_LEN,
            inbytes: frames * FRAME_LEN,
        })
    }
}

/// Layer 3 of the loopback controller. The network confirms every clearing
/// request right away; the confirmation is handed to the main loop.
pub struct LoopbackL3 {
    isdnif: IsdnIf,
    nbch: usize,
    bch: Arc<LoopbackBch>,
    hangups: Sender<(Cdid, Cause)>,
}

impl LoopbackL3 {
    pub fn new(isdnif: IsdnIf, nbch: usize, hangups: Sender<(Cdid, Cause)>) -> Self {
        Self {
            isdnif,
            nbch,
            bch: Arc::new(LoopbackBch::new(nbch)),
            hangups,
        }
    }
}

impl L3Driver for LoopbackL3 {
    fn disconnect_request(&mut self, cd: &CallDesc, cause: Cause) {
        tracing::info!("loopback: clearing {:?}, cause {:?}", cd.cdid, cause);
        if self.hangups.send((cd.cdid, cause)).is_err() {
            tracing::warn!("loopback: nobody listens for hangups");
        }
    }

    fn mgmt_command(&mut self, cmd: MgmtCmd, arg: i32) {
        tracing::debug!("loopback: isdnif {} mgmt {:?} {}", self.isdnif, cmd, arg);
    }

    fn get_linktab(&mut self, channel: usize) -> Option<IsdnLinkTab> {
        (channel < self.nbch).then(|| IsdnLinkTab {
            isdnif: self.isdnif,
            channel,
            bch: self.bch.clone(),
        })
    }
}

#[derive(Default)]
struct IprUnit {
    ilt: Option<IsdnLinkTab>,
    cdid: Option<Cdid>,
    last_active: Option<Seconds>,
    outbytes: u64,
    inbytes: u64,
    raw: BchStats,
}

/// Network interface style driver. Tracks traffic itself and reports it as
/// the idle time of its calls.
pub struct IprSim {
    units: Vec<IprUnit>,
}

impl IprSim {
    pub const NAME: &'static str = "ipr";

    pub fn new(units: u32) -> Self {
        Self {
            units: (0..units).map(|_| IprUnit::default()).collect(),
        }
    }

    /// Send a packet of `len` bytes on a unit at uptime `now`. Returns false
    /// if the unit has no line.
    pub fn transmit(&mut self, unit: u32, now: Seconds, len: usize) -> bool {
        let Some(u) = self.units.get_mut(unit as usize) else {
            return false;
        };
        let Some(ilt) = &u.ilt else {
            return false;
        };
        ilt.bch.bch_tx_start(ilt.channel);
        u.last_active = Some(now);
        u.outbytes += len as u64;
        // Loopback: whatever goes out comes back in
        u.inbytes += len as u64;
        true
    }

    /// Accounting counters of a unit since its line came up
    pub fn counters(&mut self, unit: u32, connected_secs: Seconds) -> AcctCounters {
        let Some(u) = self.units.get_mut(unit as usize) else {
            return AcctCounters::default();
        };
        if let Some(stat) = u.ilt.as_ref().and_then(|ilt| ilt.bch.bch_stat(ilt.channel)) {
            u.raw.outbytes += stat.outbytes;
            u.raw.inbytes += stat.inbytes;
        }
        let secs = connected_secs.max(1) as u64;
        AcctCounters {
            ioutbytes: u.raw.outbytes as i32,
            iinbytes: u.raw.inbytes as i32,
            outbps: (u.outbytes / secs) as i32,
            inbps: (u.inbytes / secs) as i32,
            outbytes: u.outbytes as i32,
            inbytes: u.inbytes as i32,
        }
    }

    fn unit(&mut self, softc: L4Softc) -> Option<&mut IprUnit> {
        self.units.get_mut(softc.0 as usize)
    }
}

impl L4Driver for IprSim {
    fn get_softc(&mut self, unit: u32) -> Option<L4Softc> {
        ((unit as usize) < self.units.len()).then_some(L4Softc(unit))
    }

    fn set_linktab(&mut self, softc: L4Softc, ilt: Option<IsdnLinkTab>) {
        if let Some(u) = self.unit(softc) {
            u.ilt = ilt;
        }
    }

    fn line_connected(&mut self, softc: L4Softc, cd: &CallDesc) {
        tracing::info!("ipr{}: connected, {:?}", softc.0, cd.cdid);
        if let Some(u) = self.unit(softc) {
            *u = IprUnit {
                ilt: u.ilt.take(),
                cdid: Some(cd.cdid),
                last_active: Some(cd.last_active_time),
                ..Default::default()
            };
        }
    }

    fn line_disconnected(&mut self, softc: L4Softc, cd: &CallDesc) {
        tracing::info!("ipr{}: disconnected, {:?}", softc.0, cd.cdid);
        if let Some(u) = self.unit(softc) {
            u.cdid = None;
            u.last_active = None;
        }
    }

    fn get_idletime(&self, softc: L4Softc) -> Option<Seconds> {
        self.units.get(softc.0 as usize).and_then(|u| u.last_active)
    }

    fn dial_response(&mut self, softc: L4Softc, status: DialStatus, cause: Cause) {
        tracing::info!("ipr{}: dial response {:?}, cause {:?}", softc.0, status, cause);
    }

    fn updown(&mut self, softc: L4Softc, up: bool) {
        tracing::info!("ipr{}: interface {}", softc.0, if up { "up" } else { "down" });
    }
}

/// Look up the simulator's application driver
pub fn ipr(ctx: &mut i4b_l4::L4Context, id: L4DriverId) -> Option<&mut IprSim> {
    use as_any::AsAny;
    ctx.l4_get_driver(id)?.as_any_mut().downcast_mut::<IprSim>()
}
