//! Core utilities for the i4b layer 4
//!
//! This crate provides fundamental types shared by the ISDN layer 4 crates:
//! - Identifiers for calls, controllers and application drivers
//! - The uptime clock that drives all callouts
//! - Shorthold parameters, causes and B-channel protocols
//! - B-channel state bookkeeping for controllers
//! - Common macros and debug utilities

pub mod bch_alloc;
pub mod bprot;
pub mod call_dir;
pub mod cause;
pub mod clock;
pub mod debug;
pub mod ids;
pub mod shorthold;

// Re-export commonly used items
pub use bch_alloc::{BchAllocErr, BchAllocator, BchState};
pub use bprot::BProt;
pub use call_dir::CallDir;
pub use cause::Cause;
pub use clock::{Seconds, Ticks, UptimeClock};
pub use ids::*;
pub use shorthold::{IdleTimeState, ShortholdAlgorithm, ShortholdData};

/// Maximum number of controllers a single layer 4 serves. Used to size the
/// default call descriptor table.
pub const MAX_CONTROLLERS: usize = 8;

/// Default number of call descriptors, 20 per controller.
pub const N_CALL_DESC: usize = 20 * MAX_CONTROLLERS;
