/// Allocation state of one B-channel of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BchState {
    #[default]
    Free,
    /// Requested during call setup, not yet through-connected
    Reserved,
    /// Carrying a call
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BchAllocErr {
    InvalidChannel(usize),
    InUse { channel: usize, state: BchState },
    NotAllocated { channel: usize },
}

/// Per-controller B-channel bookkeeping, `nbch` channels numbered from 0
#[derive(Debug, Clone)]
pub struct BchAllocator {
    state: Vec<BchState>,
}

impl BchAllocator {
    pub fn new(nbch: usize) -> Self {
        Self { state: vec![BchState::Free; nbch] }
    }

    pub fn nbch(&self) -> usize {
        self.state.len()
    }

    /// True if `channel` indexes a channel of this controller
    pub fn is_valid(&self, channel: usize) -> bool {
        channel < self.state.len()
    }

    fn idx(&self, channel: usize) -> Result<usize, BchAllocErr> {
        if self.is_valid(channel) {
            Ok(channel)
        } else {
            Err(BchAllocErr::InvalidChannel(channel))
        }
    }

    /// Reserve the first free channel
    pub fn allocate_any(&mut self) -> Option<usize> {
        for (i, slot) in self.state.iter_mut().enumerate() {
            if *slot == BchState::Free {
                *slot = BchState::Reserved;
                return Some(i);
            }
        }
        None
    }

    pub fn reserve(&mut self, channel: usize) -> Result<(), BchAllocErr> {
        let idx = self.idx(channel)?;
        match self.state[idx] {
            BchState::Free => {
                self.state[idx] = BchState::Reserved;
                Ok(())
            }
            state => Err(BchAllocErr::InUse { channel, state }),
        }
    }

    /// Mark a reserved (or free) channel as carrying a call
    pub fn set_busy(&mut self, channel: usize) -> Result<(), BchAllocErr> {
        let idx = self.idx(channel)?;
        self.state[idx] = BchState::Busy;
        Ok(())
    }

    pub fn release(&mut self, channel: usize) -> Result<(), BchAllocErr> {
        let idx = self.idx(channel)?;
        match self.state[idx] {
            BchState::Free => Err(BchAllocErr::NotAllocated { channel }),
            _ => {
                self.state[idx] = BchState::Free;
                Ok(())
            }
        }
    }

    pub fn state(&self, channel: usize) -> Option<BchState> {
        self.state.get(channel).copied()
    }

    pub fn is_free(&self, channel: usize) -> bool {
        self.state(channel) == Some(BchState::Free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_release() {
        let mut alloc = BchAllocator::new(2);
        assert_eq!(alloc.allocate_any(), Some(0));
        assert_eq!(alloc.allocate_any(), Some(1));
        assert_eq!(alloc.allocate_any(), None);

        assert_eq!(alloc.reserve(1), Err(BchAllocErr::InUse { channel: 1, state: BchState::Reserved }));
        alloc.set_busy(1).unwrap();
        assert_eq!(alloc.state(1), Some(BchState::Busy));

        alloc.release(1).unwrap();
        assert!(alloc.is_free(1));
        assert_eq!(alloc.release(1), Err(BchAllocErr::NotAllocated { channel: 1 }));
        assert_eq!(alloc.reserve(5), Err(BchAllocErr::InvalidChannel(5)));
    }
}
