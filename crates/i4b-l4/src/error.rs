use core::fmt;

use i4b_core::{IsdnIf, L4DriverId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum L4Err {
    /// All call descriptors are in use
    NoFreeCallDesc,
    /// Handle refers to a descriptor that was freed since
    StaleHandle,
    NoSuchController(IsdnIf),
    /// Controller has no free B-channel, or the requested one is taken
    NoChannel(IsdnIf),
    /// Controller has no link table for the channel
    NoLinkTab { isdnif: IsdnIf, channel: Option<usize> },
    NoSuchDriver(L4DriverId),
    NoSuchDriverName(String),
    NoSuchUnit { driver: L4DriverId, unit: u32 },
    /// Call has no application driver to bind to
    NoDriverRequested,
}

impl fmt::Display for L4Err {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            L4Err::NoFreeCallDesc => write!(f, "no free call descriptor"),
            L4Err::StaleHandle => write!(f, "call descriptor no longer exists"),
            L4Err::NoSuchController(isdnif) => write!(f, "no controller with isdnif {}", isdnif),
            L4Err::NoChannel(isdnif) => write!(f, "no B-channel available on isdnif {}", isdnif),
            L4Err::NoLinkTab { isdnif, channel } => {
                write!(f, "isdnif {} has no link table for channel {:?}", isdnif, channel)
            }
            L4Err::NoSuchDriver(id) => write!(f, "no layer 4 driver with id {}", id.0),
            L4Err::NoSuchDriverName(name) => write!(f, "no layer 4 driver named {}", name),
            L4Err::NoSuchUnit { driver, unit } => {
                write!(f, "layer 4 driver {} has no unit {}", driver.0, unit)
            }
            L4Err::NoDriverRequested => write!(f, "call has no layer 4 driver assigned"),
        }
    }
}

impl std::error::Error for L4Err {}
