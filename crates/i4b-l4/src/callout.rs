//! One-shot callouts keyed by call

use std::collections::{BTreeMap, HashMap};

use i4b_core::Ticks;

use crate::call_desc::CallHandle;

/// Pending callouts ordered by deadline. At most one callout per call;
/// starting a callout for a call replaces its pending one.
#[derive(Default)]
pub struct CalloutQueue {
    /// (deadline, sequence) -> call. The sequence number keeps callouts
    /// with equal deadlines in arming order.
    by_deadline: BTreeMap<(Ticks, u64), CallHandle>,
    by_handle: HashMap<CallHandle, (Ticks, u64)>,
    seq: u64,
}

impl CalloutQueue {
    /// Arm the callout of `handle` to fire `ticks` after `now`. A callout of
    /// zero ticks fires on the next tick. Returns the deadline.
    pub fn start(&mut self, handle: CallHandle, now: Ticks, ticks: Ticks) -> Ticks {
        self.stop(handle);
        let deadline = now + ticks.max(1);
        let key = (deadline, self.seq);
        self.seq += 1;
        self.by_deadline.insert(key, handle);
        self.by_handle.insert(handle, key);
        tracing::trace!("callout start {:?} at tick {}", handle, deadline);
        deadline
    }

    /// Cancel the pending callout of `handle`, if any
    pub fn stop(&mut self, handle: CallHandle) -> bool {
        match self.by_handle.remove(&handle) {
            Some(key) => {
                self.by_deadline.remove(&key);
                tracing::trace!("callout stop {:?}", handle);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, handle: CallHandle) -> bool {
        self.by_handle.contains_key(&handle)
    }

    pub fn deadline(&self, handle: CallHandle) -> Option<Ticks> {
        self.by_handle.get(&handle).map(|(deadline, _)| *deadline)
    }

    /// Remove and return the earliest callout due at `now`
    pub fn pop_expired(&mut self, now: Ticks) -> Option<CallHandle> {
        let (&key, _) = self.by_deadline.first_key_value()?;
        if key.0 > now {
            return None;
        }
        let handle = self.by_deadline.remove(&key)?;
        self.by_handle.remove(&handle);
        Some(handle)
    }

    pub fn len(&self) -> usize {
        self.by_deadline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_deadline.is_empty()
    }
}
