use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use i4b_core::{Seconds, ShortholdAlgorithm, ShortholdData};
use serde::Deserialize;
use toml::Value;

use super::stack_config::{CfgKernel, CfgNotify, SharedConfig, StackConfig};

const EXPECTED_CONFIG_VERSION: &str = "0.1";

/// Build `SharedConfig` from a TOML configuration file
pub fn from_toml_str(toml_str: &str) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let root: TomlConfigRoot = toml::from_str(toml_str)?;

    if root.config_version != EXPECTED_CONFIG_VERSION {
        return Err(format!(
            "Unrecognized config_version: {}, expect {}",
            root.config_version, EXPECTED_CONFIG_VERSION
        )
        .into());
    }
    if !root.extra.is_empty() {
        return Err(format!("Unrecognized top-level fields: {:?}", sorted_keys(&root.extra)).into());
    }
    if let Some(ref k) = root.kernel {
        if !k.extra.is_empty() {
            return Err(format!("Unrecognized fields: kernel::{:?}", sorted_keys(&k.extra)).into());
        }
    }
    if let Some(ref n) = root.notify {
        if !n.extra.is_empty() {
            return Err(format!("Unrecognized fields: notify::{:?}", sorted_keys(&n.extra)).into());
        }
    }
    if let Some(ref sh) = root.shorthold {
        if !sh.extra.is_empty() {
            return Err(format!("Unrecognized fields: shorthold::{:?}", sorted_keys(&sh.extra)).into());
        }
    }

    let mut cfg = StackConfig {
        debug_log: root.debug_log,
        ..Default::default()
    };

    if let Some(k) = root.kernel {
        apply_kernel_patch(&mut cfg.kernel, k);
    }
    if let Some(n) = root.notify {
        apply_notify_patch(&mut cfg.notify, n);
    }
    cfg.shorthold = root.shorthold.map(|sh| ShortholdData {
        algorithm: sh.algorithm.unwrap_or_default(),
        idle_time: sh.idle_time,
        unitlen_time: sh.unitlen_time.unwrap_or(0),
        earlyhup_time: sh.earlyhup_time.unwrap_or(0),
    });

    // Report instead of panicking inside SharedConfig::from_config
    if let Err(e) = cfg.validate() {
        return Err(format!("Invalid configuration: {}", e).into());
    }

    Ok(SharedConfig::from_config(cfg))
}

/// Build `SharedConfig` from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let mut contents = String::new();
    let mut reader = BufReader::new(reader);
    reader.read_to_string(&mut contents)?;
    from_toml_str(&contents)
}

/// Build `SharedConfig` from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let f = File::open(path)?;
    from_reader(BufReader::new(f))
}

fn apply_kernel_patch(dst: &mut CfgKernel, src: KernelDto) {
    if let Some(v) = src.hz {
        dst.hz = v;
    }
    if let Some(v) = src.num_call_desc {
        dst.num_call_desc = v;
    }
}

fn apply_notify_patch(dst: &mut CfgNotify, src: NotifyDto) {
    if let Some(v) = src.queue_len {
        dst.queue_len = v;
    }
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<&str> {
    let mut v: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
    v.sort_unstable();
    v
}

/// ----------------------- DTOs for input shape -----------------------

#[derive(Deserialize)]
struct TomlConfigRoot {
    config_version: String,
    debug_log: Option<String>,

    #[serde(default)]
    kernel: Option<KernelDto>,

    #[serde(default)]
    notify: Option<NotifyDto>,

    #[serde(default)]
    shorthold: Option<ShortholdDto>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct KernelDto {
    pub hz: Option<u32>,
    pub num_call_desc: Option<usize>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct NotifyDto {
    pub queue_len: Option<usize>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct ShortholdDto {
    pub algorithm: Option<ShortholdAlgorithm>,
    pub idle_time: Seconds,
    pub unitlen_time: Option<Seconds>,
    pub earlyhup_time: Option<Seconds>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}
