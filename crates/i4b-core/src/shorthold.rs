use serde::Deserialize;

use crate::clock::Seconds;

/// How the idle timeout of an outgoing call is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ShortholdAlgorithm {
    /// Charging units of fixed length: hang up just before the next unit
    /// starts if the line was idle during the check window
    #[default]
    FixedUnit,
    /// Units of variable length: watch for idle_time seconds of silence,
    /// starting one second before the first unit ends
    VariableUnit,
}

impl ShortholdAlgorithm {
    /// Maps the daemon's integer tag. Unknown values fall back to the fixed
    /// unit algorithm.
    pub fn from_int(v: i32) -> Self {
        match v {
            0 => ShortholdAlgorithm::FixedUnit,
            1 => ShortholdAlgorithm::VariableUnit,
            _ => {
                tracing::warn!("bad shorthold algorithm {}, using fixed unit", v);
                ShortholdAlgorithm::FixedUnit
            }
        }
    }
}

/// Shorthold parameters of one call, all in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct ShortholdData {
    #[serde(default)]
    pub algorithm: ShortholdAlgorithm,
    /// Idle time before hangup (check window length for full shorthold)
    #[serde(default)]
    pub idle_time: Seconds,
    /// Length of a charging unit, 0 for simple idle timeout
    #[serde(default)]
    pub unitlen_time: Seconds,
    /// Safety margin before the end of a unit
    #[serde(default)]
    pub earlyhup_time: Seconds,
}

impl ShortholdData {
    pub fn fixed(idle_time: Seconds, unitlen_time: Seconds, earlyhup_time: Seconds) -> Self {
        Self { algorithm: ShortholdAlgorithm::FixedUnit, idle_time, unitlen_time, earlyhup_time }
    }

    pub fn variable(idle_time: Seconds, unitlen_time: Seconds) -> Self {
        Self { algorithm: ShortholdAlgorithm::VariableUnit, idle_time, unitlen_time, earlyhup_time: 0 }
    }

    /// Simple idle timeout: no unit length configured
    pub fn is_simple_idle(&self) -> bool {
        self.idle_time > 0 && self.unitlen_time == 0
    }

    /// Full shorthold: a unit is long enough to hold the check window and
    /// the early hangup margin
    pub fn is_full_shorthold(&self) -> bool {
        self.unitlen_time > 0 && self.unitlen_time > self.idle_time + self.earlyhup_time
    }

    /// Length of the window at the start of each unit in which the line is
    /// not checked for activity
    pub fn nocheck_window(&self) -> Seconds {
        self.unitlen_time - (self.idle_time + self.earlyhup_time)
    }
}

/// Phase of a call within its current charging unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdleTimeState {
    /// No shorthold state machine running, or it has terminated
    #[default]
    Idle,
    /// Start of a unit, activity is not checked
    NonCheck,
    /// Activity is watched; silence leads to hangup
    Check,
    /// Activity was seen, wait for the unit to end
    Safe,
}
