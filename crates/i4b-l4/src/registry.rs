//! Registries of attached controllers (layer 3 instances) and of
//! application (layer 4) drivers

use std::collections::BTreeMap;

use i4b_core::{BchAllocator, IsdnIf, L4DriverId, unimplemented_log};

use crate::error::L4Err;
use crate::l3_driver::L3Driver;
use crate::l4_driver::L4Driver;

/// Size of a driver name buffer including the terminating NUL
pub const L4DRIVER_NAME_SIZ: usize = 16;

/// An attached controller
pub struct L3Instance {
    pub isdnif: IsdnIf,
    pub devname: String,
    pub card_name: String,
    /// State of each B-channel
    pub bch: BchAllocator,
    pub driver: Box<dyn L3Driver>,
}

impl L3Instance {
    pub fn nbch(&self) -> usize {
        self.bch.nbch()
    }
}

#[derive(Default)]
pub struct L3Registry {
    instances: BTreeMap<IsdnIf, L3Instance>,
    next_isdnif: IsdnIf,
}

impl L3Registry {
    pub fn attach(&mut self, devname: &str, card_name: &str, nbch: usize, driver: Box<dyn L3Driver>) -> IsdnIf {
        let isdnif = self.next_isdnif;
        self.next_isdnif += 1;
        self.instances.insert(
            isdnif,
            L3Instance {
                isdnif,
                devname: devname.to_string(),
                card_name: card_name.to_string(),
                bch: BchAllocator::new(nbch),
                driver,
            },
        );
        tracing::debug!("attach: isdnif {} {} ({}), {} B-channels", isdnif, devname, card_name, nbch);
        isdnif
    }

    /// Remove a controller. The next attach reuses the number following the
    /// highest remaining one.
    pub fn detach(&mut self, isdnif: IsdnIf) -> Option<L3Instance> {
        let inst = self.instances.remove(&isdnif)?;
        self.next_isdnif = self.instances.keys().next_back().map_or(0, |max| max + 1);
        tracing::debug!("detach: isdnif {} {}, next isdnif {}", isdnif, inst.devname, self.next_isdnif);
        Some(inst)
    }

    pub fn get(&self, isdnif: IsdnIf) -> Option<&L3Instance> {
        self.instances.get(&isdnif)
    }

    pub fn get_mut(&mut self, isdnif: IsdnIf) -> Option<&mut L3Instance> {
        self.instances.get_mut(&isdnif)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut L3Instance> {
        self.instances.values_mut()
    }

    /// Number of attached controllers and the highest isdnif among them
    pub fn count(&self) -> (usize, Option<IsdnIf>) {
        (self.instances.len(), self.instances.keys().next_back().copied())
    }
}

/// A registered application driver
pub struct L4DriverDesc {
    pub id: L4DriverId,
    pub name: String,
    pub units: u32,
    pub driver: Box<dyn L4Driver>,
}

#[derive(Default)]
pub struct L4Registry {
    drivers: BTreeMap<L4DriverId, L4DriverDesc>,
    next_id: u32,
}

/// Cut a driver name so that it fits a name buffer with its NUL
fn truncate_name(name: &str) -> String {
    let mut end = name.len().min(L4DRIVER_NAME_SIZ - 1);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

impl L4Registry {
    /// Register a driver. Ids are never reused.
    pub fn attach(&mut self, name: &str, units: u32, driver: Box<dyn L4Driver>) -> L4DriverId {
        let id = L4DriverId(self.next_id);
        self.next_id += 1;
        let name = truncate_name(name);
        tracing::debug!("l4_driver_attach: {} id {} units {}", name, id.0, units);
        self.drivers.insert(
            id,
            L4DriverDesc {
                id,
                name,
                units,
                driver,
            },
        );
        id
    }

    /// Drivers stay registered until shutdown
    pub fn detach(&mut self, name: &str) -> Result<(), L4Err> {
        unimplemented_log!("l4_driver_detach {}", name);
        Ok(())
    }

    pub fn find_driver(&mut self, name: &str) -> Option<&mut L4DriverDesc> {
        let name = truncate_name(name);
        self.drivers.values_mut().find(|d| d.name == name)
    }

    pub fn find_driverid(&self, name: &str) -> Option<L4DriverId> {
        let name = truncate_name(name);
        self.drivers.values().find(|d| d.name == name).map(|d| d.id)
    }

    pub fn get(&self, id: L4DriverId) -> Option<&dyn L4Driver> {
        self.drivers.get(&id).map(|d| d.driver.as_ref())
    }

    pub fn get_mut(&mut self, id: L4DriverId) -> Option<&mut dyn L4Driver> {
        self.drivers.get_mut(&id).map(|d| d.driver.as_mut())
    }

    pub fn desc(&self, id: L4DriverId) -> Option<&L4DriverDesc> {
        self.drivers.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_desc::CallDesc;
    use crate::l3_driver::{IsdnLinkTab, MgmtCmd};
    use i4b_core::{Cause, L4Softc};

    struct NullL3;

    impl L3Driver for NullL3 {
        fn disconnect_request(&mut self, _cd: &CallDesc, _cause: Cause) {}
        fn mgmt_command(&mut self, _cmd: MgmtCmd, _arg: i32) {}
        fn get_linktab(&mut self, _channel: usize) -> Option<IsdnLinkTab> {
            None
        }
    }

    struct NullL4;

    impl L4Driver for NullL4 {
        fn get_softc(&mut self, unit: u32) -> Option<L4Softc> {
            Some(L4Softc(unit))
        }
        fn set_linktab(&mut self, _softc: L4Softc, _ilt: Option<IsdnLinkTab>) {}
        fn line_connected(&mut self, _softc: L4Softc, _cd: &CallDesc) {}
        fn line_disconnected(&mut self, _softc: L4Softc, _cd: &CallDesc) {}
    }

    #[test]
    fn test_isdnif_numbering() {
        let mut reg = L3Registry::default();
        assert_eq!(reg.count(), (0, None));
        assert_eq!(reg.attach("isic0", "Teles S0/16.3", 2, Box::new(NullL3)), 0);
        assert_eq!(reg.attach("isic1", "Teles S0/16.3", 2, Box::new(NullL3)), 1);
        assert_eq!(reg.attach("daic0", "EiconCard S", 2, Box::new(NullL3)), 2);
        assert_eq!(reg.count(), (3, Some(2)));

        // Removing the highest controller makes its number available again
        assert!(reg.detach(2).is_some());
        assert_eq!(reg.attach("daic0", "EiconCard S", 2, Box::new(NullL3)), 2);

        // Removing one in the middle does not
        assert!(reg.detach(1).is_some());
        assert!(reg.detach(1).is_none());
        assert_eq!(reg.attach("isic1", "Teles S0/16.3", 2, Box::new(NullL3)), 3);
        assert_eq!(reg.count(), (3, Some(3)));

        assert_eq!(reg.get(0).unwrap().nbch(), 2);
    }

    #[test]
    fn test_l4_driver_lookup() {
        let mut reg = L4Registry::default();
        let ipr = reg.attach("ipr", 4, Box::new(NullL4));
        let tel = reg.attach("a-driver-with-a-long-name", 2, Box::new(NullL4));
        assert_ne!(ipr, tel);

        assert_eq!(reg.find_driverid("ipr"), Some(ipr));
        assert_eq!(reg.desc(tel).unwrap().name, "a-driver-with-a");
        assert_eq!(reg.find_driverid("a-driver-with-a-long-name"), Some(tel));
        assert_eq!(reg.find_driverid("isp"), None);
        assert_eq!(reg.find_driver("ipr").unwrap().units, 4);

        // Detach is accepted but the driver stays
        assert_eq!(reg.detach("ipr"), Ok(()));
        assert!(reg.get(ipr).is_some());

        // Ids are not reused
        let isp = reg.attach("isp", 1, Box::new(NullL4));
        assert_eq!(isp, L4DriverId(2));
    }
}
