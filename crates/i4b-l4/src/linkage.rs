//! Binding of a call's B-channel to an application driver instance

use crate::call_desc::CallDesc;
use crate::error::L4Err;
use crate::registry::{L3Registry, L4Registry};

/// Bind the call's B-channel to the application driver instance requested
/// for it and switch the channel on (`activate`) or off.
///
/// On failure the call stays unbound: `l4_driver` and `l4_driver_softc` are
/// left unset and `ilt` holds whatever link table could be obtained.
pub fn link_bchandrvr(cd: &mut CallDesc, l3: &mut L3Registry, l4: &mut L4Registry, activate: bool) -> Result<(), L4Err> {
    let Some(inst) = l3.get_mut(cd.isdnif) else {
        cd.ilt = None;
        return Err(L4Err::NoSuchController(cd.isdnif));
    };
    let channel = cd.channelid;
    cd.ilt = channel.and_then(|ch| inst.driver.get_linktab(ch));

    let driver_id = cd.bchan_driver_index.ok_or(L4Err::NoDriverRequested)?;
    let unit = cd.bchan_driver_unit;
    let driver = l4.get_mut(driver_id).ok_or(L4Err::NoSuchDriver(driver_id))?;
    let softc = driver
        .get_softc(unit)
        .ok_or(L4Err::NoSuchUnit { driver: driver_id, unit })?;
    let (Some(ilt), Some(channel)) = (cd.ilt.clone(), channel) else {
        return Err(L4Err::NoLinkTab {
            isdnif: cd.isdnif,
            channel,
        });
    };

    inst.driver.set_l4_driver(channel, driver_id, softc);
    driver.set_linktab(softc, Some(ilt.clone()));
    cd.l4_driver = Some(driver_id);
    cd.l4_driver_softc = Some(softc);

    tracing::debug!(
        "link: {:?} isdnif {} ch {} -> driver {} unit {}, activate {}",
        cd.cdid,
        cd.isdnif,
        channel,
        driver_id.0,
        unit,
        activate
    );
    ilt.bch.bch_config(ilt.channel, cd.bprot, activate);
    Ok(())
}

/// Switch the call's B-channel off. The link table is looked up again from
/// the controller, so a controller that is gone or has no table for the
/// channel is left alone. Calling this twice shuts the channel down twice.
pub fn unlink_bchandrvr(cd: &mut CallDesc, l3: &mut L3Registry) {
    let Some(inst) = l3.get_mut(cd.isdnif) else {
        tracing::debug!("unlink: {:?} isdnif {} gone", cd.cdid, cd.isdnif);
        return;
    };
    cd.ilt = cd.channelid.and_then(|ch| inst.driver.get_linktab(ch));
    let Some(ilt) = &cd.ilt else {
        tracing::debug!("unlink: {:?} no link table for ch {:?}", cd.cdid, cd.channelid);
        return;
    };
    tracing::debug!("unlink: {:?} isdnif {} ch {}", cd.cdid, cd.isdnif, ilt.channel);
    ilt.bch.bch_config(ilt.channel, cd.bprot, false);
}
