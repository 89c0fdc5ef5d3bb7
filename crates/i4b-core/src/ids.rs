use core::fmt;

/// Call descriptor id as seen by userland. Zero is reserved for free slots.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Cdid(pub u32);

/// Marks a call descriptor slot that is not in use
pub const CDID_UNUSED: Cdid = Cdid(0);

impl Cdid {
    #[inline]
    pub fn is_unused(self) -> bool {
        self == CDID_UNUSED
    }

    /// Value placed in a message header. Messages not tied to a call carry -1.
    pub fn wire(self) -> i32 {
        self.0 as i32
    }
}

impl fmt::Display for Cdid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Cdid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cdid:{}", self.0)
    }
}

/// Controller number, assigned at attach time
pub type IsdnIf = u32;

/// Id of a registered application (layer 4) driver, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct L4DriverId(pub u32);

/// Opaque per-unit instance handle handed out by an application driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct L4Softc(pub u32);
