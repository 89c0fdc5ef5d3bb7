use std::sync::Arc;

use as_any::AsAny;
use i4b_config::{SharedConfig, StackConfig};
use i4b_core::{BProt, CallDir, IsdnIf, L4DriverId, Seconds, ShortholdData};
use i4b_l4::{CallHandle, DaemonReader, L4Context};
use i4b_msgs::Notification;

use super::mocks::{MockBch, MockL3, MockL4};

/// Creates a default config for testing. It can still be modified as needed
/// before passing it to the L4Test constructor
pub fn default_test_config() -> StackConfig {
    StackConfig::new(100, 8)
}

/// A layer 4 with one two-channel controller, one application driver with
/// two units and an attached daemon
pub struct L4Test {
    pub ctx: L4Context,
    pub isdnif: IsdnIf,
    pub driver: L4DriverId,
    pub bch: Arc<MockBch>,
    pub reader: DaemonReader,
}

impl L4Test {
    pub fn new(config: StackConfig) -> Self {
        let mut ctx = L4Context::new(SharedConfig::from_config(config));
        let bch = Arc::new(MockBch::default());

        let (_, next) = ctx.count_isdnif();
        let isdnif = next.map_or(0, |max| max + 1);
        let l3 = MockL3::new(isdnif, 2, bch.clone());
        let attached = ctx.attach_isdnif("isic0", "Teles S0/16.3", 2, Box::new(l3));
        assert_eq!(attached, isdnif);

        let driver = ctx.l4_driver_attach("ipr", 2, Box::new(MockL4::new(2)));
        let reader = ctx.daemon_attached();
        ctx.isdnif_ready(isdnif).unwrap();

        let mut test = Self {
            ctx,
            isdnif,
            driver,
            bch,
            reader,
        };
        // Attach and daemon messages are not of interest to most tests
        test.messages();
        test.l3().mgmt.clear();
        test
    }

    /// Connect an outgoing call bound to `unit` of the application driver
    pub fn outgoing_call(&mut self, unit: u32, shorthold: ShortholdData, aocd: bool) -> CallHandle {
        let h = self.ctx.reserve_cd(self.isdnif).unwrap();
        let cd = self.ctx.call_mut(h).unwrap();
        cd.dir = CallDir::Outgoing;
        cd.bprot = BProt::Hdlc;
        cd.bchan_driver_index = Some(self.driver);
        cd.bchan_driver_unit = unit;
        cd.shorthold_data = shorthold;
        cd.aocd_flag = aocd;
        self.ctx.alloc_channel(h, None).unwrap();
        self.ctx.connect_active_ind(h).unwrap();
        h
    }

    /// Connect an incoming call bound to `unit` of the application driver
    pub fn incoming_call(&mut self, unit: u32, max_idle_time: Seconds) -> CallHandle {
        let h = self.ctx.reserve_cd(self.isdnif).unwrap();
        let cd = self.ctx.call_mut(h).unwrap();
        cd.dir = CallDir::Incoming;
        cd.bprot = BProt::Raw;
        cd.bchan_driver_index = Some(self.driver);
        cd.bchan_driver_unit = unit;
        cd.max_idle_time = max_idle_time;
        self.ctx.alloc_channel(h, None).unwrap();
        self.ctx.connect_active_ind(h).unwrap();
        h
    }

    /// Run the clock until the given uptime second has started
    pub fn run_to_second(&mut self, second: Seconds) {
        while self.ctx.second() < second {
            self.ctx.tick();
        }
    }

    /// Everything the daemon could read right now
    pub fn messages(&mut self) -> Vec<Notification> {
        self.reader.drain()
    }

    pub fn l3(&mut self) -> &mut MockL3 {
        let inst = self.ctx.find_l3_by_isdnif(self.isdnif).unwrap();
        (*inst.driver).as_any_mut().downcast_mut::<MockL3>().unwrap()
    }

    pub fn l4(&mut self) -> &mut MockL4 {
        let driver = self.ctx.l4_get_driver(self.driver).unwrap();
        driver.as_any_mut().downcast_mut::<MockL4>().unwrap()
    }
}
