use i4b_core::{
    BProt, CDID_UNUSED, CallDir, Cause, Cdid, IdleTimeState, IsdnIf, L4DriverId, L4Softc, Seconds, ShortholdData,
};
use i4b_msgs::ChargeType;

use crate::error::L4Err;
use crate::l3_driver::IsdnLinkTab;

/// Largest cdid before the counter wraps. Keeps ids positive in the
/// message header, where -1 means "no call".
const CDID_MAX: u32 = i32::MAX as u32;

/// State of one call
#[derive(Debug, Clone)]
pub struct CallDesc {
    /// Id known to the daemon, `CDID_UNUSED` for a free slot
    pub cdid: Cdid,
    /// Controller this call runs on
    pub isdnif: IsdnIf,
    /// Q.931 call reference and flag
    pub cr: u32,
    pub crflag: u8,

    /// B-channel, `None` while no channel is assigned
    pub channelid: Option<usize>,
    /// Channel was requested exclusively
    pub channelexcl: bool,
    pub dir: CallDir,
    pub bprot: BProt,

    /// Application driver and unit the daemon wants this call bound to
    pub bchan_driver_index: Option<L4DriverId>,
    pub bchan_driver_unit: u32,

    /// Application driver actually bound at connect
    pub l4_driver: Option<L4DriverId>,
    pub l4_driver_softc: Option<L4Softc>,
    /// Link table of the bound B-channel
    pub ilt: Option<IsdnLinkTab>,

    pub shorthold_data: ShortholdData,
    pub idletime_state: IdleTimeState,
    /// Set iff the idle callout of this call is armed
    pub timeout_active: bool,
    /// Idle ceiling for incoming calls, 0 disables the check
    pub max_idle_time: Seconds,

    pub last_active_time: Seconds,
    pub connect_time: Seconds,
    /// Start of the current check window
    pub idletimechk_start: Seconds,

    /// Locally calculated charging units
    pub cunits: i32,
    /// Charging units reported by the network
    pub units: i32,
    pub units_type: ChargeType,
    /// Network sends advice of charge during the call
    pub aocd_flag: bool,

    pub cause_in: Cause,
    pub cause_out: Cause,
    pub dst_telno: String,
    pub src_telno: String,
    pub scr_ind: i32,
    pub prs_ind: i32,
    pub display: String,
    pub datetime: String,
}

impl CallDesc {
    fn unused() -> Self {
        CallDesc {
            cdid: CDID_UNUSED,
            isdnif: 0,
            cr: 0,
            crflag: 0,
            channelid: None,
            channelexcl: false,
            dir: CallDir::Incoming,
            bprot: BProt::default(),
            bchan_driver_index: None,
            bchan_driver_unit: 0,
            l4_driver: None,
            l4_driver_softc: None,
            ilt: None,
            shorthold_data: ShortholdData::default(),
            idletime_state: IdleTimeState::Idle,
            timeout_active: false,
            max_idle_time: 0,
            last_active_time: 0,
            connect_time: 0,
            idletimechk_start: 0,
            cunits: 0,
            units: 0,
            units_type: ChargeType::Invalid,
            aocd_flag: false,
            cause_in: Cause::default(),
            cause_out: Cause::default(),
            dst_telno: String::new(),
            src_telno: String::new(),
            scr_ind: 0,
            prs_ind: 0,
            display: String::new(),
            datetime: String::new(),
        }
    }

    /// True if an application driver instance is bound to the channel
    pub fn is_bound(&self) -> bool {
        self.l4_driver.is_some() && self.l4_driver_softc.is_some()
    }

    /// Channel number as carried in messages, -1 for none
    pub fn channel_wire(&self) -> i32 {
        self.channelid.map_or(-1, |c| c as i32)
    }
}

/// Generation checked reference to a call descriptor slot. A handle to a
/// slot that was freed and reused no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallHandle {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    cd: CallDesc,
}

/// Fixed capacity table of call descriptors
pub struct CallDescStore {
    slots: Vec<Slot>,
    /// Next cdid to hand out. Never `CDID_UNUSED`.
    next_cdid: u32,
}

impl CallDescStore {
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                generation: 0,
                cd: CallDesc::unused(),
            })
            .collect();
        Self { slots, next_cdid: 1 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn next_free_cdid(&mut self) -> Cdid {
        loop {
            let candidate = Cdid(self.next_cdid);
            self.next_cdid = if self.next_cdid >= CDID_MAX { 1 } else { self.next_cdid + 1 };
            if self.find_by_cdid(candidate).is_none() {
                return candidate;
            }
        }
    }

    /// Take the first free slot and give it a fresh cdid
    pub fn reserve(&mut self, isdnif: IsdnIf) -> Result<CallHandle, L4Err> {
        let Some(index) = self.slots.iter().position(|s| s.cd.cdid.is_unused()) else {
            tracing::warn!("reserve: no free call descriptor, {} in use", self.slots.len());
            return Err(L4Err::NoFreeCallDesc);
        };
        let cdid = self.next_free_cdid();

        let slot = &mut self.slots[index];
        slot.cd = CallDesc::unused();
        slot.cd.cdid = cdid;
        slot.cd.isdnif = isdnif;

        tracing::trace!("reserve: {:?} isdnif {} slot {}", cdid, isdnif, index);
        Ok(CallHandle {
            index: index as u32,
            generation: slot.generation,
        })
    }

    /// Reset the descriptor and invalidate all handles to it. Returns false
    /// for a stale handle.
    pub fn free(&mut self, handle: CallHandle) -> bool {
        if self.get(handle).is_none() {
            return false;
        }
        let slot = &mut self.slots[handle.index as usize];
        tracing::trace!("free: {:?} slot {}", slot.cd.cdid, handle.index);
        slot.cd = CallDesc::unused();
        slot.generation = slot.generation.wrapping_add(1);
        true
    }

    pub fn get(&self, handle: CallHandle) -> Option<&CallDesc> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation || slot.cd.cdid.is_unused() {
            return None;
        }
        Some(&slot.cd)
    }

    pub fn get_mut(&mut self, handle: CallHandle) -> Option<&mut CallDesc> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation || slot.cd.cdid.is_unused() {
            return None;
        }
        Some(&mut slot.cd)
    }

    fn handle_at(&self, index: usize) -> CallHandle {
        CallHandle {
            index: index as u32,
            generation: self.slots[index].generation,
        }
    }

    pub fn find_by_cdid(&self, cdid: Cdid) -> Option<CallHandle> {
        if cdid.is_unused() {
            return None;
        }
        let index = self.slots.iter().position(|s| s.cd.cdid == cdid)?;
        Some(self.handle_at(index))
    }

    /// Look up a call by its Q.931 call reference on one controller
    pub fn find_by_cr(&self, isdnif: IsdnIf, cr: u32, crflag: u8) -> Option<CallHandle> {
        let index = self.slots.iter().position(|s| {
            !s.cd.cdid.is_unused() && s.cd.isdnif == isdnif && s.cd.cr == cr && s.cd.crflag == crflag
        })?;
        Some(self.handle_at(index))
    }

    /// Handles of all live calls on one controller
    pub fn handles_of_isdnif(&self, isdnif: IsdnIf) -> Vec<CallHandle> {
        (0..self.slots.len())
            .filter(|&i| {
                let cd = &self.slots[i].cd;
                !cd.cdid.is_unused() && cd.isdnif == isdnif
            })
            .map(|i| self.handle_at(i))
            .collect()
    }

    pub fn num_active(&self) -> usize {
        self.slots.iter().filter(|s| !s.cd.cdid.is_unused()).count()
    }

    /// All live calls
    pub fn iter(&self) -> impl Iterator<Item = (CallHandle, &CallDesc)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.cd.cdid.is_unused())
            .map(|(i, s)| {
                (
                    CallHandle {
                        index: i as u32,
                        generation: s.generation,
                    },
                    &s.cd,
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_until_full() {
        let mut store = CallDescStore::new(2);
        let a = store.reserve(0).unwrap();
        let b = store.reserve(1).unwrap();
        assert_eq!(store.reserve(0), Err(L4Err::NoFreeCallDesc));
        assert_eq!(store.num_active(), 2);

        assert_ne!(store.get(a).unwrap().cdid, store.get(b).unwrap().cdid);
        assert!(!store.get(a).unwrap().cdid.is_unused());
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let mut store = CallDescStore::new(1);
        let a = store.reserve(0).unwrap();
        let cdid_a = store.get(a).unwrap().cdid;
        assert!(store.free(a));
        assert!(store.get(a).is_none());
        assert!(!store.free(a));

        let b = store.reserve(0).unwrap();
        assert!(store.get(a).is_none());
        assert!(store.get_mut(a).is_none());
        assert_ne!(store.get(b).unwrap().cdid, cdid_a);
        assert_eq!(store.find_by_cdid(cdid_a), None);
    }

    #[test]
    fn test_cdid_wraps_and_skips_in_use() {
        let mut store = CallDescStore::new(3);
        let first = store.reserve(0).unwrap();
        assert_eq!(store.get(first).unwrap().cdid, Cdid(1));

        store.next_cdid = CDID_MAX;
        let h = store.reserve(0).unwrap();
        assert_eq!(store.get(h).unwrap().cdid, Cdid(CDID_MAX));

        // Counter wraps to 1, which is still in use, so 2 is handed out
        let h = store.reserve(0).unwrap();
        assert_eq!(store.get(h).unwrap().cdid, Cdid(2));
    }

    #[test]
    fn test_lookups() {
        let mut store = CallDescStore::new(4);
        let a = store.reserve(0).unwrap();
        let b = store.reserve(1).unwrap();
        let c = store.reserve(1).unwrap();
        store.get_mut(b).unwrap().cr = 0x12;
        store.get_mut(b).unwrap().crflag = 1;

        assert_eq!(store.find_by_cr(1, 0x12, 1), Some(b));
        assert_eq!(store.find_by_cr(1, 0x12, 0), None);
        assert_eq!(store.find_by_cr(0, 0x12, 1), None);

        let cdid = store.get(a).unwrap().cdid;
        assert_eq!(store.find_by_cdid(cdid), Some(a));
        assert_eq!(store.find_by_cdid(CDID_UNUSED), None);

        assert_eq!(store.handles_of_isdnif(1), vec![b, c]);
        assert_eq!(store.iter().count(), 3);
    }
}
