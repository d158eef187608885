use clap::Parser;
use segseq::simulator::config::{load_and_merge_configs, CliOverrides};
use segseq::simulator::utils::log::init_log;
use segseq::simulator::Simulator;
use std::path::PathBuf;

/// segseq - cycle model of a vector segment-operation sequencer
#[derive(Parser, Debug)]
#[command(name = "segseq")]
#[command(version = "0.1.0")]
#[command(about = "Runs a workload through the segment sequencer cycle model", long_about = None)]
struct Args {
  /// Configuration file merged on top of the defaults
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Enable step mode (interactive stepping)
  #[arg(short, long)]
  step: bool,

  /// Quiet mode (warnings and errors only)
  #[arg(short, long)]
  quiet: bool,

  /// Output trace file path (JSON lines)
  #[arg(long, value_name = "FILE")]
  trace_file: Option<String>,

  /// Give up after this many cycles
  #[arg(long, value_name = "N")]
  max_cycles: Option<u64>,

  /// Build the sequencer without segment support (pure pass-through)
  #[arg(long)]
  no_segment_support: bool,
}

fn main() -> segseq::Result<()> {
  init_log();

  let args = Args::parse();

  let cli = CliOverrides {
    quiet: args.quiet,
    step: args.step,
    trace_file: args.trace_file,
    max_cycles: args.max_cycles,
    no_segment_support: args.no_segment_support,
  };
  let app_config = load_and_merge_configs(args.config.as_deref(), &cli)?;

  let mut simulator = Simulator::from_app_config(&app_config)?;
  simulator.run()
}
