use core::fmt;

/// Cause type: value is a Q.850 cause from the network
pub const CAUSET_Q850: u32 = 0;
/// Cause type: value is generated locally by i4b
pub const CAUSET_I4B: u32 = 1;

/// Normal call clearing
pub const CAUSE_I4B_NORMAL: u32 = 0;
/// User busy
pub const CAUSE_I4B_BUSY: u32 = 1;
/// No channel available
pub const CAUSE_I4B_NOCHAN: u32 = 2;
/// Incompatible source or destination
pub const CAUSE_I4B_INCOMP: u32 = 3;
/// Call rejected
pub const CAUSE_I4B_REJECT: u32 = 4;
/// Destination out of order
pub const CAUSE_I4B_OOO: u32 = 5;
/// Temporary failure
pub const CAUSE_I4B_TMPFAIL: u32 = 6;
/// Layer 1 error or not activatable
pub const CAUSE_I4B_L1ERROR: u32 = 7;
/// No dialout number available
pub const CAUSE_I4B_LLDIAL: u32 = 8;

/// A cause value as exchanged with the daemon: cause type in bits 8..,
/// cause value in the low 8 bits.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Cause(pub u32);

impl Cause {
    pub const fn new(cause_type: u32, value: u32) -> Self {
        Cause((cause_type << 8) | (value & 0xff))
    }

    /// Locally generated normal clearing, used for idle disconnects
    pub const fn i4b_normal() -> Self {
        Cause::new(CAUSET_I4B, CAUSE_I4B_NORMAL)
    }

    pub fn cause_type(self) -> u32 {
        self.0 >> 8
    }

    pub fn value(self) -> u32 {
        self.0 & 0xff
    }
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = match self.cause_type() {
            CAUSET_Q850 => "q850",
            CAUSET_I4B => "i4b",
            _ => "?",
        };
        write!(f, "{}:{}", t, self.value())
    }
}
