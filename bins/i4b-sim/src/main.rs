use clap::{Parser, ValueEnum};

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::Receiver;
use i4b_config::{SharedConfig, toml_config};
use i4b_core::{BProt, CallDir, Cause, Cdid, Seconds, ShortholdAlgorithm, ShortholdData, debug};
use i4b_l4::{CallHandle, DaemonReader, L4Context, L4Err};
use i4b_msgs::{AcctType, Notification, PacketDir};

mod drivers;
use drivers::{IprSim, LoopbackL3, ipr};

/// Number of B-channels on the simulated controller
const SIM_NBCH: usize = 2;
/// Accounting interval while a call is up
const ACCT_INTERVAL: Seconds = 60;

/// Load configuration file
fn load_config_from_toml(cfg_path: &str) -> SharedConfig {
    match toml_config::from_file(cfg_path) {
        Ok(c) => c,
        Err(e) => {
            println!("Failed to load configuration from {}: {}", cfg_path, e);
            std::process::exit(1);
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Direction {
    In,
    Out,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Algorithm {
    Fixed,
    Variable,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "i4b layer 4 simulator",
    long_about = "Runs one call over a loopback ISDN controller and prints what the layer 4 reports to the daemon"
)]
struct Args {
    /// Config file (required)
    #[arg(help = "TOML config with kernel, queue and default shorthold parameters")]
    config: String,

    #[arg(long, value_enum, default_value = "out")]
    direction: Direction,

    /// Shorthold algorithm, overrides the config file
    #[arg(long, value_enum)]
    algorithm: Option<Algorithm>,

    /// Idle time in seconds, overrides the config file
    #[arg(long)]
    idle: Option<Seconds>,

    /// Charging unit length in seconds
    #[arg(long)]
    unitlen: Option<Seconds>,

    /// Early hangup margin in seconds
    #[arg(long)]
    earlyhup: Option<Seconds>,

    /// Idle time of incoming calls
    #[arg(long, default_value_t = 0)]
    max_idle: Seconds,

    /// The network reports charging units, none are calculated locally
    #[arg(long)]
    aocd: bool,

    /// Seconds at which a packet is sent, e.g. 10,55,130
    #[arg(long, value_delimiter = ',')]
    activity: Vec<Seconds>,

    /// Seconds to simulate
    #[arg(long, default_value_t = 600)]
    duration: Seconds,

    /// Run at wall clock speed instead of as fast as possible
    #[arg(long)]
    realtime: bool,
}

/// Shorthold parameters from the command line, falling back to the config
fn shorthold_from_args(args: &Args, cfg: &SharedConfig) -> ShortholdData {
    let mut sh = cfg.config().shorthold.unwrap_or_default();
    if let Some(alg) = args.algorithm {
        sh.algorithm = match alg {
            Algorithm::Fixed => ShortholdAlgorithm::FixedUnit,
            Algorithm::Variable => ShortholdAlgorithm::VariableUnit,
        };
    }
    sh.idle_time = args.idle.unwrap_or(sh.idle_time);
    sh.unitlen_time = args.unitlen.unwrap_or(sh.unitlen_time);
    sh.earlyhup_time = args.earlyhup.unwrap_or(sh.earlyhup_time);
    sh
}

/// Prints everything the layer 4 sends to the daemon, in wire format
fn spawn_daemon(reader: DaemonReader) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        while let Some(msg) = reader.read() {
            let bytes = msg.encode();
            match Notification::decode(&bytes) {
                Ok(decoded) => println!("daemon <- {} [{} bytes]", decoded, bytes.len()),
                Err(e) => println!("daemon <- undecodable message: {}", e),
            }
        }
    })
}

struct Sim {
    ctx: L4Context,
    isdnif: u32,
    ipr: i4b_core::L4DriverId,
    call: Option<CallHandle>,
    hangups: Receiver<(Cdid, Cause)>,
}

impl Sim {
    fn new(cfg: SharedConfig) -> Self {
        let mut ctx = L4Context::new(cfg);
        let (tx, hangups) = crossbeam_channel::unbounded();
        let (_, max) = ctx.count_isdnif();
        let isdnif = max.map_or(0, |m| m + 1);
        ctx.attach_isdnif("sim0", "loopback", SIM_NBCH, Box::new(LoopbackL3::new(isdnif, SIM_NBCH, tx)));
        let ipr = ctx.l4_driver_attach(IprSim::NAME, 1, Box::new(IprSim::new(1)));
        Self {
            ctx,
            isdnif,
            ipr,
            call: None,
            hangups,
        }
    }

    fn place_call(&mut self, dir: Direction, shorthold: ShortholdData, max_idle: Seconds, aocd: bool) -> Result<CallHandle, L4Err> {
        let ctx = &mut self.ctx;
        ctx.isdnif_ready(self.isdnif)?;
        let h = ctx.reserve_cd(self.isdnif)?;
        let cd = ctx.call_mut(h).ok_or(L4Err::StaleHandle)?;
        cd.dir = match dir {
            Direction::In => CallDir::Incoming,
            Direction::Out => CallDir::Outgoing,
        };
        cd.bprot = BProt::Hdlc;
        cd.bchan_driver_index = Some(self.ipr);
        cd.bchan_driver_unit = 0;
        cd.shorthold_data = shorthold;
        cd.max_idle_time = max_idle;
        cd.aocd_flag = aocd;
        cd.src_telno = "3051234".to_string();
        cd.dst_telno = "3059876".to_string();

        if let Err(e) = ctx.alloc_channel(h, None) {
            ctx.free_cd(h)?;
            return Err(e);
        }

        match dir {
            Direction::Out => {
                // A packet for the interface triggers the dialout
                ctx.dialout(self.ipr, 0);
                ctx.packet_ind(self.ipr, 0, PacketDir::Out, &[0x45, 0x00, 0x00, 0x54]);
                ctx.proceeding_ind(h)?;
                ctx.alert_ind(h)?;
            }
            Direction::In => ctx.connect_ind(h)?,
        }
        ctx.connect_active_ind(h)?;
        Ok(h)
    }

    fn send_packet(&mut self) {
        let now = self.ctx.second();
        let sent = ipr(&mut self.ctx, self.ipr).is_some_and(|d| d.transmit(0, now, 84));
        if !sent {
            tracing::info!(ts = now, "no line for packet");
        }
    }

    fn report_accounting(&mut self, accttype: AcctType) {
        let Some(connect_time) = self.call.and_then(|h| self.ctx.call(h)).map(|cd| cd.connect_time) else {
            return;
        };
        let secs = self.ctx.second() - connect_time;
        if let Some(d) = ipr(&mut self.ctx, self.ipr) {
            let counters = d.counters(0, secs);
            self.ctx.accounting(self.ipr, 0, accttype, counters);
        }
    }

    /// Deliver clearing confirmations from the loopback network
    fn process_hangups(&mut self) {
        while let Ok((cdid, cause)) = self.hangups.try_recv() {
            let Some(h) = self.ctx.find_cd_by_cdid(cdid) else {
                tracing::warn!("hangup for unknown {:?}", cdid);
                continue;
            };
            if self.call == Some(h) {
                self.report_accounting(AcctType::Final);
                self.call = None;
            }
            if let Some(cd) = self.ctx.call_mut(h) {
                cd.cause_in = cause;
            }
            if let Err(e) = self.ctx.disconnect_ind(h) {
                tracing::warn!("disconnect of {:?} failed: {}", cdid, e);
            }
        }
    }
}

fn main() {
    eprintln!("i4b layer 4 simulator");
    eprintln!(" -> loopback controller, {} B channels\n", SIM_NBCH);

    let args = Args::parse();
    let cfg = load_config_from_toml(&args.config);
    let _log_guard = debug::setup_logging_default(cfg.config().debug_log.clone());

    let shorthold = shorthold_from_args(&args, &cfg);
    let activity: BTreeSet<Seconds> = args.activity.iter().copied().collect();
    let hz = cfg.config().kernel.hz;

    let mut sim = Sim::new(cfg);
    let daemon = spawn_daemon(sim.ctx.daemon_attached());
    match sim.place_call(args.direction, shorthold, args.max_idle, args.aocd) {
        Ok(h) => sim.call = Some(h),
        Err(e) => tracing::error!("call setup failed: {}", e),
    }

    // Set up Ctrl+C handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("failed to set Ctrl+C handler");

    let tick_len = Duration::from_secs(1) / hz;
    let mut second = sim.ctx.second();
    while sim.call.is_some() && second < args.duration && running.load(Ordering::SeqCst) {
        sim.ctx.tick();
        sim.process_hangups();

        if sim.ctx.second() != second {
            second = sim.ctx.second();
            if activity.contains(&second) {
                sim.send_packet();
            }
            if second % ACCT_INTERVAL == 0 {
                sim.report_accounting(AcctType::During);
            }
        }
        if args.realtime {
            std::thread::sleep(tick_len);
        }
    }

    if let Some(h) = sim.call.take() {
        tracing::info!(ts = second, "end of simulation, dropping call");
        if let Some(cd) = sim.ctx.call_mut(h) {
            cd.cause_in = Cause::i4b_normal();
        }
        let _ = sim.ctx.disconnect_ind(h);
    }
    sim.ctx.daemon_detached();
    let _ = daemon.join();
}
