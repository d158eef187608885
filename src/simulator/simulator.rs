use log::info;
use std::path::Path;

use super::config::AppConfig;
use super::sim::mode::{SimConfig, StepMode};
use super::sim::records::TraceWriter;
use super::sim::shell::{Command, Shell};
use super::utils::log::set_quiet;
use super::utils::report::print_simulation_report;
use crate::arch::ara::{AraTop, CycleTrace};
use crate::error::{Result, SimError};

pub struct Simulator {
  config: SimConfig,
  top: AraTop,
  trace: Option<TraceWriter>,
}

impl Simulator {
  pub fn new(config: SimConfig, top: AraTop) -> Result<Self> {
    let trace = match &config.trace_file {
      Some(path) => Some(TraceWriter::create(Path::new(path))?),
      None => None,
    };
    Ok(Self { config, top, trace })
  }

  /// Build the top and queue the configured workload
  pub fn from_app_config(app_config: &AppConfig) -> Result<Self> {
    let mut top = AraTop::new(
      "ara_top",
      app_config.sequencer.to_config(),
      app_config.backend.to_config(),
    );
    for entry in &app_config.workload {
      top.push(entry.to_instruction());
    }
    info!(
      "segment support {}, {} instruction(s) queued",
      if app_config.sequencer.segment_support { "enabled" } else { "disabled" },
      app_config.workload.len()
    );
    Self::new(SimConfig::from_app_config(app_config), top)
  }

  pub fn top(&self) -> &AraTop {
    &self.top
  }

  pub fn run(&mut self) -> Result<()> {
    set_quiet(self.config.quiet);
    let result = match self.config.step_mode {
      StepMode::Continuous => self.run_continuous(),
      StepMode::Step => self.run_step_mode(),
    };
    if let Some(trace) = &mut self.trace {
      trace.flush()?;
    }
    print_simulation_report(&self.top);
    result
  }

  fn run_step_mode(&mut self) -> Result<()> {
    let mut shell = Shell::new()?;
    println!("Step mode - Enter to step, 'si N' to step N cycles, 'p' to print, 'c' to continue, 'q' to quit");
    loop {
      match shell.read_command()? {
        Command::Step(n) => {
          for _ in 0..n {
            let trace = self.step()?;
            print_trace(&trace);
          }
        },
        Command::Print => self.print_status(),
        Command::Continue => return self.run_continuous(),
        Command::Quit => return Ok(()),
      }
    }
  }

  fn run_continuous(&mut self) -> Result<()> {
    while !self.top.is_quiescent() {
      if self.top.cycle() >= self.config.max_cycles {
        return Err(SimError::CycleLimit(self.config.max_cycles));
      }
      self.step()?;
    }
    info!("quiescent after {} cycles", self.top.cycle());
    Ok(())
  }

  fn step(&mut self) -> Result<CycleTrace> {
    let trace = self.top.tick();
    if let Some(writer) = &mut self.trace {
      writer.record(&trace)?;
    }
    Ok(trace)
  }

  fn print_status(&self) {
    let seq = &self.top.sequencer;
    println!(
      "cycle={} state={:?} field={} segment={} pending={} backend_idle={}",
      self.top.cycle(),
      seq.state(),
      seq.field(),
      seq.segment(),
      self.top.frontend.pending(),
      self.top.backend.is_idle()
    );
  }
}

fn print_trace(trace: &CycleTrace) {
  let mut line = format!("[{:>6}] {:?}", trace.cycle, trace.state);
  if let Some(req) = &trace.to_backend {
    line.push_str(&format!(" -> backend vl={} vstart={} vs1={} vd={}", req.vl, req.vstart, req.vs1, req.vd));
  }
  if let Some(resp) = &trace.to_frontend {
    line.push_str(&format!(" -> frontend error={} result={:#x}", resp.error, resp.result));
  }
  if trace.load_complete {
    line.push_str(" load_complete");
  }
  if trace.store_complete {
    line.push_str(" store_complete");
  }
  println!("{}", line);
}
