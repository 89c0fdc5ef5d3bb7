use i4b_config::SharedConfig;
use i4b_core::{Cause, Cdid, IsdnIf, L4DriverId, Seconds, UptimeClock};
use i4b_msgs::{
    AccountingInd, AcctType, AlertInd, ChargeType, ChargingInd, ConnectActiveInd, ConnectInd, ContrEvInd, CtrlEvent,
    DialoutInd, DialoutNumberInd, DisconnectInd, DrvrDiscReq, IdleTimeoutInd, IfStateChangedInd, KeypadInd, L4Msg,
    L12StatInd, Layer, LayerState, MAX_PACKET_LOG, NegCompleteInd, Notification, PacketDir, PacketInd, PdeactInd,
    ProceedingInd, TeiAsgInd,
};

use crate::call_desc::{CallDesc, CallDescStore, CallHandle};
use crate::callout::CalloutQueue;
use crate::error::L4Err;
use crate::l3_driver::{L3Driver, MgmtCmd};
use crate::l4_driver::{AcctCounters, DialStatus, L4Driver};
use crate::linkage;
use crate::notify::{DaemonReader, NotificationQueue};
use crate::registry::{L3Instance, L3Registry, L4DriverDesc, L4Registry};
use crate::timeout::{self, TimeoutEffect};

/// Last second with traffic on a call: asked from the bound application
/// driver if it keeps track, otherwise taken from the call itself
fn get_idletime(cd: &CallDesc, l4: &L4Registry) -> Seconds {
    if let (Some(id), Some(softc)) = (cd.l4_driver, cd.l4_driver_softc) {
        if let Some(t) = l4.get(id).and_then(|d| d.get_idletime(softc)) {
            return t;
        }
    }
    cd.last_active_time
}

/// The ISDN layer 4
pub struct L4Context {
    config: SharedConfig,
    clock: UptimeClock,
    store: CallDescStore,
    l3: L3Registry,
    l4: L4Registry,
    callouts: CalloutQueue,
    notify: NotificationQueue,
}

impl L4Context {
    pub fn new(config: SharedConfig) -> Self {
        let cfg = config.config();
        Self {
            clock: UptimeClock::new(cfg.kernel.hz),
            store: CallDescStore::new(cfg.kernel.num_call_desc),
            l3: L3Registry::default(),
            l4: L4Registry::default(),
            callouts: CalloutQueue::default(),
            notify: NotificationQueue::new(cfg.notify.queue_len),
            config,
        }
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    // ─── Clock ────────────────────────────────────────────────────

    pub fn now(&self) -> UptimeClock {
        self.clock
    }

    /// Current uptime second
    pub fn second(&self) -> Seconds {
        self.clock.second()
    }

    /// Advance the clock by one tick and run all callouts that became due
    pub fn tick(&mut self) {
        self.clock.advance(1);
        while let Some(h) = self.callouts.pop_expired(self.clock.ticks) {
            self.idle_check(h);
        }
    }

    pub fn run_ticks(&mut self, num_ticks: u64) {
        for _ in 0..num_ticks {
            self.tick();
        }
    }

    pub fn run_seconds(&mut self, secs: Seconds) {
        self.run_ticks(self.clock.secs_to_ticks(secs));
    }

    // ─── Call descriptors ─────────────────────────────────────────

    /// Allocate a call descriptor on a controller. The call starts out with
    /// the configured default shorthold parameters, if any.
    pub fn reserve_cd(&mut self, isdnif: IsdnIf) -> Result<CallHandle, L4Err> {
        if self.l3.get(isdnif).is_none() {
            return Err(L4Err::NoSuchController(isdnif));
        }
        let h = self.store.reserve(isdnif)?;
        if let (Some(sh), Some(cd)) = (self.config.config().shorthold, self.store.get_mut(h)) {
            cd.shorthold_data = sh;
        }
        Ok(h)
    }

    /// Drop a call that never became active, releasing its channel
    pub fn free_cd(&mut self, h: CallHandle) -> Result<(), L4Err> {
        if self.store.get(h).is_none() {
            return Err(L4Err::StaleHandle);
        }
        self.clear_call(h);
        self.store.free(h);
        Ok(())
    }

    pub fn call(&self, h: CallHandle) -> Option<&CallDesc> {
        self.store.get(h)
    }

    pub fn call_mut(&mut self, h: CallHandle) -> Option<&mut CallDesc> {
        self.store.get_mut(h)
    }

    pub fn calls(&self) -> &CallDescStore {
        &self.store
    }

    pub fn find_cd_by_cdid(&self, cdid: Cdid) -> Option<CallHandle> {
        self.store.find_by_cdid(cdid)
    }

    pub fn find_cd_by_cr(&self, isdnif: IsdnIf, cr: u32, crflag: u8) -> Option<CallHandle> {
        self.store.find_by_cr(isdnif, cr, crflag)
    }

    /// Reserve a B-channel for a call. A requested channel that is taken is
    /// replaced by any free one unless the call wants it exclusively. A
    /// channel the call held before is released first.
    pub fn alloc_channel(&mut self, h: CallHandle, wanted: Option<usize>) -> Result<usize, L4Err> {
        let cd = self.store.get_mut(h).ok_or(L4Err::StaleHandle)?;
        let inst = self.l3.get_mut(cd.isdnif).ok_or(L4Err::NoSuchController(cd.isdnif))?;

        if let Some(old) = cd.channelid.take() {
            if let Err(e) = inst.bch.release(old) {
                tracing::trace!("alloc_channel: {:?} releasing ch {}: {:?}", cd.cdid, old, e);
            }
        }

        let channel = match wanted.map(|ch| inst.bch.reserve(ch)) {
            Some(Ok(())) => wanted,
            Some(Err(e)) if cd.channelexcl => {
                tracing::debug!("alloc_channel: {:?} exclusive channel unavailable: {:?}", cd.cdid, e);
                None
            }
            _ => inst.bch.allocate_any(),
        };
        let channel = channel.ok_or(L4Err::NoChannel(cd.isdnif))?;
        cd.channelid = Some(channel);
        Ok(channel)
    }

    /// Whether the idle callout of a call is armed
    pub fn timer_pending(&self, h: CallHandle) -> bool {
        self.callouts.is_pending(h)
    }

    pub fn num_pending_callouts(&self) -> usize {
        self.callouts.len()
    }

    // ─── Controllers ──────────────────────────────────────────────

    pub fn attach_isdnif(&mut self, devname: &str, card_name: &str, nbch: usize, driver: Box<dyn L3Driver>) -> IsdnIf {
        self.l3.attach(devname, card_name, nbch, driver)
    }

    /// Announce a controller that finished its own initialization
    pub fn isdnif_ready(&mut self, isdnif: IsdnIf) -> Result<(), L4Err> {
        let inst = self.l3.get(isdnif).ok_or(L4Err::NoSuchController(isdnif))?;
        tracing::info!(
            ts = self.clock.second(),
            "ISDN {} at {} ({}), {} B channels",
            isdnif,
            inst.devname,
            inst.card_name,
            inst.nbch()
        );
        self.contr_ev_ind(isdnif, CtrlEvent::Attach);
        Ok(())
    }

    /// Remove a controller and drop all of its calls
    pub fn detach_isdnif(&mut self, isdnif: IsdnIf) -> Result<(), L4Err> {
        if self.l3.get(isdnif).is_none() {
            return Err(L4Err::NoSuchController(isdnif));
        }
        self.contr_ev_ind(isdnif, CtrlEvent::Detach);

        // Calls are cleared while the controller can still shut its channels down
        for h in self.store.handles_of_isdnif(isdnif) {
            self.clear_call(h);
            self.store.free(h);
        }
        if let Some(inst) = self.l3.detach(isdnif) {
            tracing::debug!("detach: isdnif {} {} removed", isdnif, inst.devname);
        }
        tracing::info!(ts = self.clock.second(), "ISDN {} detached", isdnif);
        Ok(())
    }

    pub fn find_l3_by_isdnif(&mut self, isdnif: IsdnIf) -> Option<&mut L3Instance> {
        self.l3.get_mut(isdnif)
    }

    /// Number of attached controllers and the highest isdnif among them
    pub fn count_isdnif(&self) -> (usize, Option<IsdnIf>) {
        self.l3.count()
    }

    // ─── Application drivers ──────────────────────────────────────

    pub fn l4_driver_attach(&mut self, name: &str, units: u32, driver: Box<dyn L4Driver>) -> L4DriverId {
        self.l4.attach(name, units, driver)
    }

    pub fn l4_driver_detach(&mut self, name: &str) -> Result<(), L4Err> {
        self.l4.detach(name)
    }

    pub fn l4_find_driver(&mut self, name: &str) -> Option<&mut L4DriverDesc> {
        self.l4.find_driver(name)
    }

    pub fn l4_find_driverid(&self, name: &str) -> Option<L4DriverId> {
        self.l4.find_driverid(name)
    }

    pub fn l4_get_driver(&mut self, id: L4DriverId) -> Option<&mut dyn L4Driver> {
        self.l4.get_mut(id)
    }

    // ─── Daemon ───────────────────────────────────────────────────

    /// The daemon opened the device. Controllers are told, messages are
    /// queued from now on.
    pub fn daemon_attached(&mut self) -> DaemonReader {
        tracing::info!(ts = self.clock.second(), "daemon attached");
        let reader = self.notify.open();
        for inst in self.l3.iter_mut() {
            inst.driver.mgmt_command(MgmtCmd::DaemonOpen, 0);
        }
        reader
    }

    pub fn daemon_detached(&mut self) {
        tracing::info!(ts = self.clock.second(), "daemon detached");
        self.notify.close();
        for inst in self.l3.iter_mut() {
            inst.driver.mgmt_command(MgmtCmd::DaemonClose, 0);
        }
    }

    /// Messages queued and not yet read by the daemon
    pub fn pending_messages(&self) -> usize {
        self.notify.pending()
    }

    /// Result of a dialout the application driver asked for
    pub fn dial_response(&mut self, driver: L4DriverId, unit: u32, status: DialStatus, cause: Cause) -> Result<(), L4Err> {
        tracing::debug!("<- dial_response driver {} unit {} {:?} {:?}", driver.0, unit, status, cause);
        let drv = self.l4.get_mut(driver).ok_or(L4Err::NoSuchDriver(driver))?;
        let softc = drv.get_softc(unit).ok_or(L4Err::NoSuchUnit { driver, unit })?;
        drv.dial_response(softc, status, cause);
        Ok(())
    }

    pub fn updown_ind(&mut self, driver: L4DriverId, unit: u32, up: bool) -> Result<(), L4Err> {
        tracing::debug!("<- updown driver {} unit {} up {}", driver.0, unit, up);
        let drv = self.l4.get_mut(driver).ok_or(L4Err::NoSuchDriver(driver))?;
        let softc = drv.get_softc(unit).ok_or(L4Err::NoSuchUnit { driver, unit })?;
        drv.updown(softc, up);
        Ok(())
    }

    // ─── Events from layer 3 ──────────────────────────────────────

    fn call_msg(&mut self, h: CallHandle, f: impl FnOnce(&CallDesc) -> L4Msg) -> Result<(), L4Err> {
        let cd = self.store.get(h).ok_or(L4Err::StaleHandle)?;
        let msg = Notification::new(cd.cdid.wire(), f(cd));
        self.notify.push(msg);
        Ok(())
    }

    /// Incoming call is offered
    pub fn connect_ind(&mut self, h: CallHandle) -> Result<(), L4Err> {
        self.call_msg(h, |cd| {
            L4Msg::ConnectInd(ConnectInd {
                controller: cd.isdnif as i32,
                channel: cd.channel_wire(),
                bprot: cd.bprot.to_int(),
                dst_telno: cd.dst_telno.clone(),
                src_telno: cd.src_telno.clone(),
                scr_ind: cd.scr_ind,
                prs_ind: cd.prs_ind,
                display: cd.display.clone(),
            })
        })
    }

    /// The B-channel of a call is through-connected. Binds the application
    /// driver, starts the idle timeout and tells the daemon.
    pub fn connect_active_ind(&mut self, h: CallHandle) -> Result<(), L4Err> {
        let now = self.clock.second();
        let cd = self.store.get_mut(h).ok_or(L4Err::StaleHandle)?;
        cd.last_active_time = now;
        cd.connect_time = now;
        tracing::info!(ts = now, "{:?}: connected, isdnif {} ch {:?}", cd.cdid, cd.isdnif, cd.channelid);

        if let (Some(ch), Some(inst)) = (cd.channelid, self.l3.get_mut(cd.isdnif)) {
            if let Err(e) = inst.bch.set_busy(ch) {
                tracing::warn!("{:?}: cannot mark channel busy: {:?}", cd.cdid, e);
            }
        }

        match linkage::link_bchandrvr(cd, &mut self.l3, &mut self.l4, true) {
            Ok(()) => {
                if let (Some(id), Some(softc)) = (cd.l4_driver, cd.l4_driver_softc) {
                    if let Some(drv) = self.l4.get_mut(id) {
                        drv.line_connected(softc, cd);
                    }
                }
            }
            Err(e) => tracing::trace!("{:?}: no application driver bound: {}", cd.cdid, e),
        }

        self.callouts.stop(h);
        let effects = timeout::setup_timeout(cd, &self.clock);
        let msg = Notification::new(
            cd.cdid.wire(),
            L4Msg::ConnectActiveInd(ConnectActiveInd {
                controller: cd.isdnif as i32,
                channel: cd.channel_wire(),
                datetime: cd.datetime.clone(),
            }),
        );
        self.apply_effects(h, effects);
        self.notify.push(msg);
        Ok(())
    }

    /// The call is gone. Releases driver and channel, tells the daemon and
    /// frees the descriptor.
    pub fn disconnect_ind(&mut self, h: CallHandle) -> Result<(), L4Err> {
        let cd = self.store.get(h).ok_or(L4Err::StaleHandle)?;
        let cdid = cd.cdid;
        let cause = cd.cause_in;
        tracing::info!(ts = self.clock.second(), "{:?}: disconnected, cause {:?}", cdid, cause);

        self.clear_call(h);
        self.notify.push(Notification::new(
            cdid.wire(),
            L4Msg::DisconnectInd(DisconnectInd { cause: cause.0 as i32 }),
        ));
        self.store.free(h);
        Ok(())
    }

    pub fn alert_ind(&mut self, h: CallHandle) -> Result<(), L4Err> {
        self.call_msg(h, |_| L4Msg::AlertInd(AlertInd))
    }

    pub fn proceeding_ind(&mut self, h: CallHandle) -> Result<(), L4Err> {
        self.call_msg(h, |cd| {
            L4Msg::ProceedingInd(ProceedingInd {
                controller: cd.isdnif as i32,
                channel: cd.channel_wire(),
            })
        })
    }

    /// Report the charging units of a call: calculated ones if the layer 4
    /// counts them itself, else those reported by the network
    pub fn charging_ind(&mut self, h: CallHandle) -> Result<(), L4Err> {
        self.call_msg(h, |cd| {
            let units = if cd.units_type == ChargeType::Calculated {
                cd.cunits
            } else {
                cd.units
            };
            L4Msg::ChargingInd(ChargingInd {
                units_type: cd.units_type,
                units,
            })
        })
    }

    /// Charging information received from the network
    pub fn network_charge(&mut self, h: CallHandle, units: i32, units_type: ChargeType) -> Result<(), L4Err> {
        let cd = self.store.get_mut(h).ok_or(L4Err::StaleHandle)?;
        cd.units = units;
        cd.units_type = units_type;
        self.charging_ind(h)
    }

    pub fn status_ind(&mut self, h: CallHandle) -> Result<(), L4Err> {
        let cd = self.store.get(h).ok_or(L4Err::StaleHandle)?;
        tracing::trace!("{:?}: status indication ignored", cd.cdid);
        Ok(())
    }

    pub fn negcomplete(&mut self, h: CallHandle) -> Result<(), L4Err> {
        self.call_msg(h, |_| L4Msg::NegCompleteInd(NegCompleteInd))
    }

    pub fn ifstate_changed(&mut self, h: CallHandle, state: i32) -> Result<(), L4Err> {
        self.call_msg(h, |_| L4Msg::IfStateChangedInd(IfStateChangedInd { state }))
    }

    pub fn l12stat(&mut self, isdnif: IsdnIf, layer: Layer, state: LayerState) {
        self.notify.push(Notification::without_call(L4Msg::L12StatInd(L12StatInd {
            controller: isdnif as i32,
            layer,
            state,
        })));
    }

    pub fn teiasg(&mut self, isdnif: IsdnIf, tei: i32) {
        self.notify.push(Notification::without_call(L4Msg::TeiAsgInd(TeiAsgInd {
            controller: isdnif as i32,
            tei,
        })));
    }

    /// Layer 1 of a controller went down: all of its calls are dropped
    /// without further signalling
    pub fn pdeact(&mut self, isdnif: IsdnIf, numactive: i32) {
        let handles = self.store.handles_of_isdnif(isdnif);
        tracing::info!(
            ts = self.clock.second(),
            "isdnif {} deactivated, dropping {} calls",
            isdnif,
            handles.len()
        );
        for h in handles {
            self.clear_call(h);
            self.store.free(h);
        }
        self.notify.push(Notification::without_call(L4Msg::PdeactInd(PdeactInd {
            controller: isdnif as i32,
            numactive,
        })));
    }

    fn contr_ev_ind(&mut self, isdnif: IsdnIf, event: CtrlEvent) {
        self.notify.push(Notification::without_call(L4Msg::ContrEvInd(ContrEvInd {
            controller: isdnif as i32,
            event,
        })));
    }

    // ─── Events from application drivers ──────────────────────────

    /// Traffic was seen on the call's B-channel
    pub fn bch_activity(&mut self, h: CallHandle) -> Result<(), L4Err> {
        let now = self.clock.second();
        let cd = self.store.get_mut(h).ok_or(L4Err::StaleHandle)?;
        cd.last_active_time = now;
        Ok(())
    }

    /// An application driver unit wants to be connected
    pub fn dialout(&mut self, driver: L4DriverId, unit: u32) {
        self.notify.push(Notification::without_call(L4Msg::DialoutInd(DialoutInd {
            driver: driver.0 as i32,
            driver_unit: unit as i32,
        })));
    }

    pub fn dialoutnumber(&mut self, driver: L4DriverId, unit: u32, cmd: &[u8]) {
        self.notify.push(Notification::without_call(L4Msg::DialoutNumberInd(DialoutNumberInd {
            driver: driver.0 as i32,
            driver_unit: unit as i32,
            cmd: cmd.to_vec(),
        })));
    }

    pub fn keypad(&mut self, driver: L4DriverId, unit: u32, cmd: &[u8]) {
        self.notify.push(Notification::without_call(L4Msg::KeypadInd(KeypadInd {
            driver: driver.0 as i32,
            driver_unit: unit as i32,
            cmd: cmd.to_vec(),
        })));
    }

    /// An application driver unit wants its connection dropped
    pub fn drvrdisc(&mut self, driver: L4DriverId, unit: u32) {
        self.notify.push(Notification::without_call(L4Msg::DrvrDiscReq(DrvrDiscReq {
            driver: driver.0 as i32,
            driver_unit: unit as i32,
        })));
    }

    pub fn accounting(&mut self, driver: L4DriverId, unit: u32, accttype: AcctType, c: AcctCounters) {
        self.notify.push(Notification::without_call(L4Msg::AccountingInd(AccountingInd {
            driver: driver.0 as i32,
            driver_unit: unit as i32,
            accttype,
            ioutbytes: c.ioutbytes,
            iinbytes: c.iinbytes,
            outbps: c.outbps,
            inbps: c.inbps,
            outbytes: c.outbytes,
            inbytes: c.inbytes,
        })));
    }

    /// Log the head of a packet that caused a dialout or kept a line up
    pub fn packet_ind(&mut self, driver: L4DriverId, unit: u32, direction: PacketDir, pkt: &[u8]) {
        let len = pkt.len().min(MAX_PACKET_LOG);
        self.notify.push(Notification::without_call(L4Msg::PacketInd(PacketInd {
            driver: driver.0 as i32,
            driver_unit: unit as i32,
            direction,
            pktdata: pkt[..len].to_vec(),
        })));
    }

    // ─── Internals ────────────────────────────────────────────────

    /// Stop the callout of a call, release its application driver and its
    /// B-channel. The descriptor itself stays allocated.
    fn clear_call(&mut self, h: CallHandle) {
        self.callouts.stop(h);
        let Some(cd) = self.store.get_mut(h) else {
            return;
        };
        cd.timeout_active = false;

        if let (Some(id), Some(softc)) = (cd.l4_driver, cd.l4_driver_softc) {
            if let Some(drv) = self.l4.get_mut(id) {
                drv.line_disconnected(softc, cd);
            }
            linkage::unlink_bchandrvr(cd, &mut self.l3);
        }

        if let Some(ch) = cd.channelid {
            match self.l3.get_mut(cd.isdnif) {
                Some(inst) if inst.bch.is_valid(ch) => {
                    if let Err(e) = inst.bch.release(ch) {
                        tracing::trace!("{:?}: {:?}", cd.cdid, e);
                    }
                }
                // Not an error, a callback call may not have a channel yet
                _ => tracing::debug!("{:?}: invalid channel {} for isdnif {}", cd.cdid, ch, cd.isdnif),
            }
        }

        cd.l4_driver = None;
        cd.l4_driver_softc = None;
        cd.ilt = None;
    }

    /// Callout of a call fired
    fn idle_check(&mut self, h: CallHandle) {
        let Some(cd) = self.store.get_mut(h) else {
            tracing::trace!("callout for stale {:?}", h);
            return;
        };
        let idletime = get_idletime(cd, &self.l4);
        let effects = timeout::idle_check(cd, idletime, &self.clock);
        self.apply_effects(h, effects);
    }

    fn apply_effects(&mut self, h: CallHandle, effects: Vec<TimeoutEffect>) {
        for effect in effects {
            match effect {
                TimeoutEffect::StartTimer(ticks) => {
                    self.callouts.start(h, self.clock.ticks, ticks);
                }
                TimeoutEffect::RequestDisconnect(cause) => {
                    let Some(cd) = self.store.get_mut(h) else {
                        continue;
                    };
                    cd.cause_out = cause;
                    match self.l3.get_mut(cd.isdnif) {
                        Some(inst) => inst.driver.disconnect_request(cd, cause),
                        None => tracing::warn!("{:?}: isdnif {} gone, cannot disconnect", cd.cdid, cd.isdnif),
                    }
                }
                TimeoutEffect::NotifyIdleTimeout => {
                    if let Err(e) = self.call_msg(h, |_| L4Msg::IdleTimeoutInd(IdleTimeoutInd)) {
                        tracing::trace!("{:?}: idle timeout not reported: {}", h, e);
                    }
                }
                TimeoutEffect::NotifyCharging => {
                    if let Err(e) = self.charging_ind(h) {
                        tracing::trace!("{:?}: charging not reported: {}", h, e);
                    }
                }
            }
        }
    }
}
