//! ISDN layer 4: call descriptors, controller and application driver
//! registries, B-channel linkage, idle and shorthold timeouts and the
//! message queue towards the userland daemon.
//!
//! All state lives in one [`L4Context`]. Every event takes `&mut L4Context`
//! and runs to completion, including callouts fired from [`L4Context::tick`].

pub mod call_desc;
pub mod callout;
pub mod context;
pub mod error;
pub mod l3_driver;
pub mod l4_driver;
pub mod linkage;
pub mod notify;
pub mod registry;
pub mod timeout;

pub use call_desc::{CallDesc, CallDescStore, CallHandle};
pub use context::L4Context;
pub use error::L4Err;
pub use l3_driver::{BChannelDriver, BchStats, IsdnLinkTab, L3Driver, MgmtCmd};
pub use l4_driver::{AcctCounters, DialStatus, L4Driver};
pub use notify::DaemonReader;
pub use registry::{L3Instance, L4DriverDesc, L4DRIVER_NAME_SIZ};
