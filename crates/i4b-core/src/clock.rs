use core::fmt;

/// Whole seconds on the uptime clock
pub type Seconds = i64;

/// Clock ticks, `hz` per second
pub type Ticks = u64;

/// Monotonic uptime clock. Counts ticks since start, `hz` ticks per second.
/// The current second (`SECOND` in the BSD sources) is the tick count
/// divided by `hz`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct UptimeClock {
    /// Ticks per second
    pub hz: u32,
    /// Ticks elapsed since start
    pub ticks: Ticks,
}

impl Default for UptimeClock {
    /// 100 Hz, started at tick 0
    fn default() -> Self {
        UptimeClock { hz: 100, ticks: 0 }
    }
}

impl UptimeClock {
    pub fn new(hz: u32) -> Self {
        assert!(hz > 0, "clock needs at least one tick per second");
        UptimeClock { hz, ticks: 0 }
    }

    /// Current uptime in whole seconds
    #[inline(always)]
    pub fn second(&self) -> Seconds {
        (self.ticks / self.hz as Ticks) as Seconds
    }

    /// Advance the clock by a number of ticks
    pub fn advance(&mut self, num_ticks: Ticks) {
        self.ticks += num_ticks;
    }

    /// Converts seconds to ticks. Negative durations clamp to zero.
    pub fn secs_to_ticks(&self, secs: Seconds) -> Ticks {
        if secs <= 0 { 0 } else { secs as Ticks * self.hz as Ticks }
    }

    /// Ticks in half a second, the granularity of the simple idle checks
    pub fn half_second(&self) -> Ticks {
        (self.hz / 2) as Ticks
    }

    /// Number of ticks until `deadline`, zero if already passed
    pub fn ticks_until(&self, deadline: Ticks) -> Ticks {
        deadline.saturating_sub(self.ticks)
    }
}

impl fmt::Display for UptimeClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sub = self.ticks % self.hz as Ticks;
        write!(f, "{:6}+{:03}", self.second(), sub)
    }
}

impl fmt::Debug for UptimeClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}hz", self, self.hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_and_advance() {
        let mut clk = UptimeClock::new(100);
        assert_eq!(clk.second(), 0);
        clk.advance(99);
        assert_eq!(clk.second(), 0);
        clk.advance(1);
        assert_eq!(clk.second(), 1);
        clk.advance(4900);
        assert_eq!(clk.second(), 50);
    }

    #[test]
    fn test_conversions() {
        let clk = UptimeClock::new(100);
        assert_eq!(clk.secs_to_ticks(40), 4000);
        assert_eq!(clk.secs_to_ticks(-3), 0);
        assert_eq!(clk.half_second(), 50);
        assert_eq!(clk.ticks_until(30), 30);

        // hz of 1 has no half second; callers must still fire on the next tick
        let clk = UptimeClock::new(1);
        assert_eq!(clk.half_second(), 0);
    }
}
