//! Idle timeout and shorthold state machine
//!
//! Incoming calls are dropped after `max_idle_time` seconds without traffic,
//! checked every half second. Outgoing calls follow their shorthold
//! parameters:
//!
//! - Fixed unit, simple idle (`unitlen_time == 0`): dropped after
//!   `idle_time` seconds without traffic, checked every half second.
//! - Fixed unit, full shorthold: each charging unit is split into a window
//!   without checks, a check window of `idle_time` seconds and an early
//!   hangup margin of `earlyhup_time` seconds at its end:
//!
//!   ```text
//!   |<- unitlen_time ------------------------------------------->|
//!   |<- NonCheck ->|<- Check (idle_time) ->|<- Safe (earlyhup) ->|
//!   ```
//!
//!   Traffic during the check window keeps the call for the next unit,
//!   otherwise it is dropped at the end of the check window.
//! - Variable unit: the first check happens one second before the end of
//!   the first unit, then every second. The call is dropped once it has been
//!   idle for `idle_time` seconds.
//!
//! The steps here only update the call and return what has to be done; the
//! context arms callouts, talks to the drivers and queues the messages.

use i4b_core::{Cause, IdleTimeState, Seconds, ShortholdAlgorithm, Ticks, UptimeClock, assert_warn};
use i4b_msgs::ChargeType;

use crate::call_desc::CallDesc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutEffect {
    /// (Re)arm the idle callout of this call
    StartTimer(Ticks),
    /// Ask the layer 3 to clear the call
    RequestDisconnect(Cause),
    /// Tell the daemon the call was dropped for being idle
    NotifyIdleTimeout,
    /// Tell the daemon the charging units changed
    NotifyCharging,
}

fn arm(cd: &mut CallDesc, effects: &mut Vec<TimeoutEffect>, ticks: Ticks) {
    cd.timeout_active = true;
    effects.push(TimeoutEffect::StartTimer(ticks));
}

fn disconnect(effects: &mut Vec<TimeoutEffect>) {
    effects.push(TimeoutEffect::RequestDisconnect(Cause::i4b_normal()));
    effects.push(TimeoutEffect::NotifyIdleTimeout);
}

/// Charge one locally calculated unit, unless the network reports units
fn charge_unit(cd: &mut CallDesc, effects: &mut Vec<TimeoutEffect>) {
    if !cd.aocd_flag {
        cd.units_type = ChargeType::Calculated;
        cd.cunits += 1;
        effects.push(TimeoutEffect::NotifyCharging);
    }
}

/// Select the timeout policy of a call that just became active and arm its
/// first callout
pub fn setup_timeout(cd: &mut CallDesc, clock: &UptimeClock) -> Vec<TimeoutEffect> {
    let mut effects = Vec::new();
    let ts = clock.second();
    let sh = cd.shorthold_data;

    assert_warn!(!cd.timeout_active, "{:?}: idle timeout already armed at connect", cd.cdid);
    cd.timeout_active = false;
    cd.idletime_state = IdleTimeState::Idle;

    if cd.dir.is_incoming() && cd.max_idle_time > 0 {
        tracing::debug!(ts, "{:?}: incoming call, max_idle_time {}", cd.cdid, cd.max_idle_time);
        arm(cd, &mut effects, clock.half_second());
    } else if cd.dir.is_outgoing() && sh.idle_time > 0 {
        match sh.algorithm {
            ShortholdAlgorithm::VariableUnit => {
                tracing::debug!(
                    ts,
                    "{:?}: variable unit, unitlen_time {}, idle_time {}",
                    cd.cdid,
                    sh.unitlen_time,
                    sh.idle_time
                );
                cd.idletime_state = IdleTimeState::Check;
                arm(cd, &mut effects, clock.secs_to_ticks(sh.unitlen_time - 1));
            }
            ShortholdAlgorithm::FixedUnit => {
                if sh.unitlen_time == 0 {
                    tracing::debug!(ts, "{:?}: outgoing call, idle_time {}", cd.cdid, sh.idle_time);
                    arm(cd, &mut effects, clock.half_second());
                } else if sh.is_full_shorthold() {
                    tracing::debug!(
                        ts,
                        "{:?}: shorthold, unitlen_time {}, idle_time {}, earlyhup_time {}",
                        cd.cdid,
                        sh.unitlen_time,
                        sh.idle_time,
                        sh.earlyhup_time
                    );
                    cd.idletime_state = IdleTimeState::NonCheck;
                    arm(cd, &mut effects, clock.secs_to_ticks(sh.nocheck_window()));
                    // The first unit is charged at connect
                    charge_unit(cd, &mut effects);
                } else {
                    tracing::error!(
                        ts,
                        "{:?}: unitlen_time {} too short for idle_time {} + earlyhup_time {}, no idle timeout",
                        cd.cdid,
                        sh.unitlen_time,
                        sh.idle_time,
                        sh.earlyhup_time
                    );
                }
            }
        }
    } else {
        tracing::debug!(ts, "{:?}: no idle timeout configured", cd.cdid);
    }

    effects
}

/// Callout handler. `idletime` is the last second with traffic on the call.
pub fn idle_check(cd: &mut CallDesc, idletime: Seconds, clock: &UptimeClock) -> Vec<TimeoutEffect> {
    let mut effects = Vec::new();
    if cd.cdid.is_unused() {
        return effects;
    }

    let ts = clock.second();
    let sh = cd.shorthold_data;

    if !cd.timeout_active {
        tracing::error!(ts, "{:?}: idle check fired with timeout_active == false", cd.cdid);
    } else {
        cd.timeout_active = false;
    }

    if cd.dir.is_incoming() {
        if idletime + cd.max_idle_time <= ts {
            tracing::debug!(ts, "{:?}: incoming call idle since {}, disconnecting", cd.cdid, idletime);
            disconnect(&mut effects);
        } else {
            arm(cd, &mut effects, clock.half_second());
        }
        return effects;
    }

    match sh.algorithm {
        ShortholdAlgorithm::FixedUnit if sh.unitlen_time == 0 => {
            if idletime + sh.idle_time <= ts {
                tracing::debug!(ts, "{:?}: outgoing call idle since {}, disconnecting", cd.cdid, idletime);
                disconnect(&mut effects);
            } else {
                arm(cd, &mut effects, clock.half_second());
            }
        }
        ShortholdAlgorithm::FixedUnit => match cd.idletime_state {
            IdleTimeState::NonCheck => {
                tracing::debug!(ts, "{:?}: NonCheck -> Check", cd.cdid);
                arm(cd, &mut effects, clock.secs_to_ticks(sh.idle_time));
                cd.idletimechk_start = ts;
                cd.idletime_state = IdleTimeState::Check;
            }
            IdleTimeState::Check => {
                if idletime > cd.idletimechk_start && idletime <= ts {
                    tracing::debug!(ts, "{:?}: activity at {}, Check -> Safe", cd.cdid, idletime);
                    arm(cd, &mut effects, clock.secs_to_ticks(sh.earlyhup_time));
                    cd.idletime_state = IdleTimeState::Safe;
                } else {
                    tracing::debug!(ts, "{:?}: no activity since {}, disconnecting", cd.cdid, idletime);
                    disconnect(&mut effects);
                    cd.idletime_state = IdleTimeState::Idle;
                }
            }
            IdleTimeState::Safe => {
                tracing::debug!(ts, "{:?}: end of unit, Safe -> NonCheck", cd.cdid);
                arm(cd, &mut effects, clock.secs_to_ticks(sh.nocheck_window()));
                cd.idletime_state = IdleTimeState::NonCheck;
                charge_unit(cd, &mut effects);
            }
            IdleTimeState::Idle => {
                tracing::error!(ts, "{:?}: shorthold check in state {:?}", cd.cdid, cd.idletime_state);
                cd.idletime_state = IdleTimeState::Idle;
            }
        },
        ShortholdAlgorithm::VariableUnit => match cd.idletime_state {
            IdleTimeState::Check => {
                if idletime > ts - sh.idle_time {
                    tracing::trace!(ts, "{:?}: activity at {}, recheck in 1s", cd.cdid, idletime);
                    arm(cd, &mut effects, clock.secs_to_ticks(1));
                } else {
                    tracing::debug!(ts, "{:?}: idle since {}, disconnecting", cd.cdid, idletime);
                    disconnect(&mut effects);
                    cd.idletime_state = IdleTimeState::Idle;
                }
            }
            state => {
                tracing::error!(ts, "{:?}: variable unit check in state {:?}", cd.cdid, state);
                cd.idletime_state = IdleTimeState::Idle;
            }
        },
    }

    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_desc::CallDescStore;
    use i4b_core::{CallDir, ShortholdData};

    use TimeoutEffect::*;

    fn outgoing(store: &mut CallDescStore, sh: ShortholdData) -> crate::CallHandle {
        let h = store.reserve(0).unwrap();
        let cd = store.get_mut(h).unwrap();
        cd.dir = CallDir::Outgoing;
        cd.shorthold_data = sh;
        h
    }

    fn at(second: u64) -> UptimeClock {
        UptimeClock { hz: 100, ticks: second * 100 }
    }

    #[test]
    fn test_setup_full_shorthold_charges_first_unit() {
        let mut store = CallDescStore::new(1);
        let h = outgoing(&mut store, ShortholdData::fixed(40, 100, 10));
        let cd = store.get_mut(h).unwrap();

        let effects = setup_timeout(cd, &at(0));
        assert_eq!(effects, vec![StartTimer(5000), NotifyCharging]);
        assert_eq!(cd.idletime_state, IdleTimeState::NonCheck);
        assert!(cd.timeout_active);
        assert_eq!(cd.cunits, 1);
        assert_eq!(cd.units_type, ChargeType::Calculated);
    }

    #[test]
    fn test_setup_with_aocd_does_not_charge() {
        let mut store = CallDescStore::new(1);
        let h = outgoing(&mut store, ShortholdData::fixed(40, 100, 10));
        let cd = store.get_mut(h).unwrap();
        cd.aocd_flag = true;

        assert_eq!(setup_timeout(cd, &at(0)), vec![StartTimer(5000)]);
        assert_eq!(cd.cunits, 0);
        assert_eq!(cd.units_type, ChargeType::Invalid);
    }

    #[test]
    fn test_setup_policies() {
        let mut store = CallDescStore::new(1);
        let h = outgoing(&mut store, ShortholdData::variable(20, 60));
        let cd = store.get_mut(h).unwrap();
        assert_eq!(setup_timeout(cd, &at(3)), vec![StartTimer(5900)]);
        assert_eq!(cd.idletime_state, IdleTimeState::Check);

        cd.shorthold_data = ShortholdData::fixed(30, 0, 0);
        assert_eq!(setup_timeout(cd, &at(3)), vec![StartTimer(50)]);
        assert_eq!(cd.idletime_state, IdleTimeState::Idle);

        // Unit too short for the check window: nothing armed
        cd.shorthold_data = ShortholdData::fixed(40, 45, 10);
        assert_eq!(setup_timeout(cd, &at(3)), vec![]);
        assert!(!cd.timeout_active);

        // No idle time configured
        cd.shorthold_data = ShortholdData::fixed(0, 100, 10);
        assert_eq!(setup_timeout(cd, &at(3)), vec![]);
        assert!(!cd.timeout_active);

        // Incoming calls only look at max_idle_time
        cd.dir = CallDir::Incoming;
        cd.shorthold_data = ShortholdData::fixed(40, 100, 10);
        assert_eq!(setup_timeout(cd, &at(3)), vec![]);
        cd.max_idle_time = 10;
        assert_eq!(setup_timeout(cd, &at(3)), vec![StartTimer(50)]);
    }

    #[test]
    fn test_full_shorthold_cycle() {
        let mut store = CallDescStore::new(1);
        let h = outgoing(&mut store, ShortholdData::fixed(40, 100, 10));
        let cd = store.get_mut(h).unwrap();
        setup_timeout(cd, &at(0));

        assert_eq!(idle_check(cd, 0, &at(50)), vec![StartTimer(4000)]);
        assert_eq!(cd.idletime_state, IdleTimeState::Check);
        assert_eq!(cd.idletimechk_start, 50);

        // Traffic at 55 keeps the call for another unit
        assert_eq!(idle_check(cd, 55, &at(90)), vec![StartTimer(1000)]);
        assert_eq!(cd.idletime_state, IdleTimeState::Safe);

        assert_eq!(idle_check(cd, 55, &at(100)), vec![StartTimer(5000), NotifyCharging]);
        assert_eq!(cd.idletime_state, IdleTimeState::NonCheck);
        assert_eq!(cd.cunits, 2);

        assert_eq!(idle_check(cd, 55, &at(150)), vec![StartTimer(4000)]);
        // Traffic exactly at the start of the check window does not count
        assert_eq!(
            idle_check(cd, 150, &at(190)),
            vec![RequestDisconnect(Cause::i4b_normal()), NotifyIdleTimeout]
        );
        assert_eq!(cd.idletime_state, IdleTimeState::Idle);
        assert!(!cd.timeout_active);
    }

    #[test]
    fn test_variable_unit() {
        let mut store = CallDescStore::new(1);
        let h = outgoing(&mut store, ShortholdData::variable(20, 60));
        let cd = store.get_mut(h).unwrap();
        setup_timeout(cd, &at(0));

        assert_eq!(idle_check(cd, 45, &at(59)), vec![StartTimer(100)]);
        assert_eq!(idle_check(cd, 45, &at(60)), vec![StartTimer(100)]);
        assert_eq!(
            idle_check(cd, 45, &at(65)),
            vec![RequestDisconnect(Cause::i4b_normal()), NotifyIdleTimeout]
        );
        assert_eq!(cd.idletime_state, IdleTimeState::Idle);

        // Check in any other state ends the machine
        cd.timeout_active = true;
        assert_eq!(idle_check(cd, 70, &at(70)), vec![]);
        assert_eq!(cd.idletime_state, IdleTimeState::Idle);
    }

    #[test]
    fn test_simple_idle_incoming() {
        let mut store = CallDescStore::new(1);
        let h = store.reserve(0).unwrap();
        let cd = store.get_mut(h).unwrap();
        cd.max_idle_time = 30;
        setup_timeout(cd, &at(0));

        assert_eq!(idle_check(cd, 10, &at(39)), vec![StartTimer(50)]);
        assert_eq!(
            idle_check(cd, 10, &at(40)),
            vec![RequestDisconnect(Cause::i4b_normal()), NotifyIdleTimeout]
        );
    }

    #[test]
    fn test_spurious_check_is_logged_and_handled() {
        let mut store = CallDescStore::new(1);
        let h = outgoing(&mut store, ShortholdData::fixed(30, 0, 0));
        let cd = store.get_mut(h).unwrap();
        assert!(!cd.timeout_active);
        assert_eq!(idle_check(cd, 0, &at(5)), vec![StartTimer(50)]);
        assert!(cd.timeout_active);
    }
}
