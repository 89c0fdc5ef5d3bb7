use std::sync::Arc;

use i4b_core::{N_CALL_DESC, ShortholdData};

/// Kernel-side parameters of the layer 4
#[derive(Debug, Clone)]
pub struct CfgKernel {
    /// Clock ticks per second driving all callouts
    pub hz: u32,
    /// Capacity of the call descriptor table
    pub num_call_desc: usize,
}

impl Default for CfgKernel {
    fn default() -> Self {
        Self {
            hz: default_hz(),
            num_call_desc: N_CALL_DESC,
        }
    }
}

/// Queue towards the userland daemon
#[derive(Debug, Clone)]
pub struct CfgNotify {
    /// Maximum number of queued normal priority messages. When full, the
    /// oldest message is dropped.
    pub queue_len: usize,
}

impl Default for CfgNotify {
    fn default() -> Self {
        Self { queue_len: default_queue_len() }
    }
}

#[inline]
fn default_hz() -> u32 {
    100
}

#[inline]
fn default_queue_len() -> usize {
    50
}

#[derive(Debug, Clone)]
pub struct StackConfig {
    pub debug_log: Option<String>,

    pub kernel: CfgKernel,

    pub notify: CfgNotify,

    /// Shorthold parameters new calls start out with. The daemon may
    /// override them per call before the call becomes active.
    pub shorthold: Option<ShortholdData>,
}

impl Default for StackConfig {
    fn default() -> Self {
        StackConfig {
            debug_log: None,
            kernel: CfgKernel::default(),
            notify: CfgNotify::default(),
            shorthold: None,
        }
    }
}

impl StackConfig {
    pub fn new(hz: u32, num_call_desc: usize) -> Self {
        StackConfig {
            kernel: CfgKernel { hz, num_call_desc },
            ..Default::default()
        }
    }

    /// Validate that all required configuration fields are properly set.
    pub fn validate(&self) -> Result<(), &str> {
        if self.kernel.hz == 0 {
            return Err("kernel.hz must be at least 1");
        }
        if self.kernel.num_call_desc == 0 {
            return Err("kernel.num_call_desc must be at least 1");
        }
        if self.notify.queue_len == 0 {
            return Err("notify.queue_len must be at least 1");
        }
        if let Some(sh) = &self.shorthold {
            if sh.idle_time < 0 || sh.unitlen_time < 0 || sh.earlyhup_time < 0 {
                return Err("shorthold times must not be negative");
            }
        }
        Ok(())
    }
}

/// Shared, immutable configuration handle
#[derive(Clone)]
pub struct SharedConfig {
    cfg: Arc<StackConfig>,
}

impl SharedConfig {
    pub fn new(hz: u32, num_call_desc: usize) -> Self {
        Self::from_config(StackConfig::new(hz, num_call_desc))
    }

    pub fn from_config(cfg: StackConfig) -> Self {
        // Check config for validity before returning the SharedConfig object
        match cfg.validate() {
            Ok(_) => {}
            Err(e) => panic!("Invalid stack configuration: {}", e),
        }

        Self { cfg: Arc::new(cfg) }
    }

    /// Access immutable config.
    pub fn config(&self) -> Arc<StackConfig> {
        Arc::clone(&self.cfg)
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::from_config(StackConfig::default())
    }
}
