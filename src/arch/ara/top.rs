//! Top module - connects the dispatcher, the segment sequencer and the backend

use serde::Serialize;

use super::backend::{Backend, BackendConfig};
use super::bundles::{AraReq, AraResp};
use super::frontend::{Frontend, Instruction};
use super::segment_sequencer::{SegmentSequencer, SeqState, SequencerConfig};
use crate::builtin::Module;

/// What crossed the sequencer's boundaries in one cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleTrace {
  pub cycle: u64,
  pub state: SeqState,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub to_backend: Option<AraReq>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub to_frontend: Option<AraResp>,
  pub load_complete: bool,
  pub store_complete: bool,
}

impl CycleTrace {
  /// Nothing happened this cycle
  pub fn is_quiet(&self) -> bool {
    self.to_backend.is_none() && self.to_frontend.is_none() && !self.load_complete && !self.store_complete
  }
}

pub struct AraTop {
  name: String,
  cycle: u64,

  pub frontend: Frontend,
  pub sequencer: SegmentSequencer,
  pub backend: Backend,
}

impl AraTop {
  pub fn new(name: impl Into<String>, seq_config: SequencerConfig, backend_config: BackendConfig) -> Self {
    Self {
      name: name.into(),
      cycle: 0,
      frontend: Frontend::new("dispatcher"),
      sequencer: SegmentSequencer::new("segment_sequencer", seq_config),
      backend: Backend::new("backend", backend_config),
    }
  }

  pub fn push(&mut self, inst: Instruction) -> u64 {
    self.frontend.push(inst)
  }

  pub fn cycle(&self) -> u64 {
    self.cycle
  }

  /// Nothing queued, nothing in flight, sequencer idle
  pub fn is_quiescent(&self) -> bool {
    self.frontend.is_done() && self.sequencer.state() == SeqState::Idle && self.backend.is_idle()
  }

  /// Run one clock cycle and report the boundary traffic
  pub fn tick(&mut self) -> CycleTrace {
    let state = self.sequencer.state();
    self.run();

    let to_backend = if self.sequencer.be_out.req.valid && self.sequencer.be_in.req_ready {
      Some(self.sequencer.be_out.req.value.clone())
    } else {
      None
    };
    let fe_out = &self.sequencer.fe_out;
    CycleTrace {
      cycle: self.cycle - 1,
      state,
      to_backend,
      to_frontend: fe_out.resp.fire().cloned(),
      load_complete: fe_out.load_complete,
      store_complete: fe_out.store_complete,
    }
  }
}

impl Module for AraTop {
  fn run(&mut self) {
    // Backend and dispatcher drive registered outputs; the sequencer sits
    // between them as combinational logic with a few registers.

    // 1. Sequencer sees this cycle's registered outputs of both neighbours
    self.sequencer.fe_in = self.frontend.output.clone();
    self.sequencer.be_in = self.backend.output.clone();
    self.sequencer.run();

    // 2. Wiring: sequencer outputs -> neighbours
    self.frontend.connect(&self.sequencer.fe_out);
    self.backend.connect(&self.sequencer.be_out);

    // 3. Neighbours latch what they received
    self.backend.run();
    self.frontend.run();

    self.cycle += 1;
  }

  fn reset(&mut self) {
    self.frontend.reset();
    self.sequencer.reset();
    self.backend.reset();
    self.cycle = 0;
  }

  fn name(&self) -> &str {
    &self.name
  }
}
