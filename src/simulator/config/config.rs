use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::arch::ara::bundles::{AraReq, ReqFlags, VecOp, NF_MAX, VREG_MASK};
use crate::arch::ara::counter::SegmentCounter;
use crate::arch::ara::{BackendConfig, Instruction, SequencerConfig};
use crate::error::{Result, SimError};

/// Sequencer section
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SequencerSection {
  #[serde(default = "default_segment_support")]
  pub segment_support: bool,
  #[serde(default = "default_vstart_width")]
  pub vstart_width: u32,
}

fn default_segment_support() -> bool {
  true
}

fn default_vstart_width() -> u32 {
  64
}

impl Default for SequencerSection {
  fn default() -> Self {
    Self {
      segment_support: default_segment_support(),
      vstart_width: default_vstart_width(),
    }
  }
}

impl SequencerSection {
  pub fn to_config(&self) -> SequencerConfig {
    SequencerConfig {
      segment_support: self.segment_support,
      vstart_width: self.vstart_width,
    }
  }
}

/// Backend stub section
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendSection {
  #[serde(default = "default_latency")]
  pub latency: u32,
  #[serde(default)]
  pub idle_delay: u32,
  #[serde(default = "default_queue_depth")]
  pub queue_depth: usize,
  #[serde(default)]
  pub error_at: Vec<u64>,
}

fn default_latency() -> u32 {
  1
}

fn default_queue_depth() -> usize {
  1
}

impl Default for BackendSection {
  fn default() -> Self {
    Self {
      latency: default_latency(),
      idle_delay: 0,
      queue_depth: default_queue_depth(),
      error_at: Vec::new(),
    }
  }
}

impl BackendSection {
  pub fn to_config(&self) -> BackendConfig {
    BackendConfig {
      latency: self.latency,
      idle_delay: self.idle_delay,
      queue_depth: self.queue_depth,
      error_at: self.error_at.clone(),
    }
  }
}

/// Simulation section
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationSection {
  #[serde(default)]
  pub quiet: bool,
  #[serde(default)]
  pub step_mode: bool,
  #[serde(default)]
  pub trace_file: String,
  #[serde(default = "default_max_cycles")]
  pub max_cycles: u64,
}

fn default_max_cycles() -> u64 {
  100_000
}

impl Default for SimulationSection {
  fn default() -> Self {
    Self {
      quiet: false,
      step_mode: false,
      trace_file: String::new(),
      max_cycles: default_max_cycles(),
    }
  }
}

/// One instruction of the workload
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkloadEntry {
  #[serde(default)]
  pub op: VecOp,
  #[serde(default)]
  pub segmented: bool,
  #[serde(default)]
  pub illegal: bool,
  #[serde(default)]
  pub nf: u8,
  #[serde(default)]
  pub vl: u64,
  #[serde(default)]
  pub vstart: u64,
  #[serde(default)]
  pub vs1: u8,
  #[serde(default)]
  pub vd: u8,
  #[serde(default)]
  pub scalar_op: u64,
}

impl WorkloadEntry {
  pub fn to_instruction(&self) -> Instruction {
    Instruction {
      req: AraReq {
        op: self.op,
        vl: self.vl,
        vstart: self.vstart,
        nf: self.nf,
        vs1: self.vs1,
        vd: self.vd,
        scalar_op: self.scalar_op,
        ..AraReq::default()
      },
      flags: ReqFlags {
        is_segment_mem_op: self.segmented,
        illegal_insn: self.illegal,
        is_vload: self.op == VecOp::Load,
      },
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
  #[serde(default)]
  pub sequencer: SequencerSection,
  #[serde(default)]
  pub backend: BackendSection,
  #[serde(default)]
  pub simulation: SimulationSection,
  #[serde(default)]
  pub workload: Vec<WorkloadEntry>,
}

/// Command line overrides, applied after the files
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
  pub quiet: bool,
  pub step: bool,
  pub trace_file: Option<String>,
  pub max_cycles: Option<u64>,
  pub no_segment_support: bool,
}

fn default_config_path() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("src")
    .join("simulator")
    .join("config")
    .join("default.toml")
}

fn read_table(path: &Path) -> Result<toml::Table> {
  let content = fs::read_to_string(path)
    .map_err(|e| SimError::Config(format!("cannot read config file {:?}: {}", path, e)))?;
  Ok(toml::from_str::<toml::Table>(&content)?)
}

/// Load the default configuration shipped with the crate
pub fn load_default_config() -> Result<AppConfig> {
  load_config_file(&default_config_path())
}

/// Load a configuration file on its own; missing keys take their defaults
pub fn load_config_file(path: &Path) -> Result<AppConfig> {
  let table = read_table(path)?;
  Ok(toml::Value::Table(table).try_into()?)
}

/// Parse configuration text
pub fn parse_config(text: &str) -> Result<AppConfig> {
  Ok(toml::from_str::<AppConfig>(text)?)
}

/// Merge `over` into `base`: nested tables merge key by key, everything
/// else (including the workload array) is replaced
pub fn merge_tables(base: &mut toml::Table, over: toml::Table) {
  for (key, value) in over {
    match (base.get_mut(&key), value) {
      (Some(toml::Value::Table(base_sub)), toml::Value::Table(over_sub)) => merge_tables(base_sub, over_sub),
      (_, value) => {
        base.insert(key, value);
      },
    }
  }
}

/// Apply command line overrides
pub fn apply_cli_overrides(config: &mut AppConfig, cli: &CliOverrides) {
  if cli.quiet {
    config.simulation.quiet = true;
  }
  if cli.step {
    config.simulation.step_mode = true;
  }
  if let Some(file) = &cli.trace_file {
    config.simulation.trace_file = file.clone();
  }
  if let Some(max_cycles) = cli.max_cycles {
    config.simulation.max_cycles = max_cycles;
  }
  if cli.no_segment_support {
    config.sequencer.segment_support = false;
  }
}

/// Validate a configuration
pub fn validate_config(config: &AppConfig) -> Result<()> {
  if config.backend.latency == 0 {
    return Err(SimError::Config("backend.latency must be at least 1".to_string()));
  }
  if config.backend.queue_depth == 0 {
    return Err(SimError::Config("backend.queue_depth must be at least 1".to_string()));
  }
  if config.sequencer.vstart_width == 0 || config.sequencer.vstart_width > 64 {
    return Err(SimError::Config(format!(
      "sequencer.vstart_width must be in 1..=64, got {}",
      config.sequencer.vstart_width
    )));
  }

  let seg_cnt = SegmentCounter::new(config.sequencer.vstart_width);
  for (i, entry) in config.workload.iter().enumerate() {
    if !seg_cnt.reaches(entry.vl) || !seg_cnt.holds(entry.vstart) {
      return Err(SimError::Config(format!(
        "workload[{}]: vl={} / vstart={} do not fit sequencer.vstart_width={}",
        i, entry.vl, entry.vstart, config.sequencer.vstart_width
      )));
    }
    if entry.nf > NF_MAX {
      return Err(SimError::Config(format!("workload[{}]: nf={} exceeds {}", i, entry.nf, NF_MAX)));
    }
    if entry.vs1 > VREG_MASK || entry.vd > VREG_MASK {
      return Err(SimError::Config(format!(
        "workload[{}]: register index out of range (vs1={}, vd={})",
        i, entry.vs1, entry.vd
      )));
    }
    if entry.segmented && entry.op == VecOp::Other {
      return Err(SimError::Config(format!(
        "workload[{}]: only loads and stores can be segmented",
        i
      )));
    }
  }

  Ok(())
}

/// Load and merge configs
///
/// 1. load the default config
/// 2. merge the custom config file on top, if any
/// 3. apply CLI overrides
/// 4. validate
pub fn load_and_merge_configs(custom_config_path: Option<&Path>, cli: &CliOverrides) -> Result<AppConfig> {
  let mut table = read_table(&default_config_path())?;

  if let Some(path) = custom_config_path {
    let custom = read_table(path)?;
    merge_tables(&mut table, custom);
  }

  let mut config: AppConfig = toml::Value::Table(table).try_into()?;
  apply_cli_overrides(&mut config, cli);
  validate_config(&config)?;

  Ok(config)
}
