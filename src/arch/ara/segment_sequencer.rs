//! Segment sequencer
//!
//! Sits between the dispatcher and the backend. A segmented memory
//! operation (`nf + 1` interleaved fields per index) is broken into
//! `(vl - vstart) * (nf + 1)` single-field, single-segment micro-ops that
//! the backend executes one at a time. The dispatcher only ever sees one
//! response and one load/store-complete for the whole instruction.
//! Everything else passes straight through.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::bundles::{vreg_offset, AraReq, AraResp, BackendIn, BackendOut, FrontendIn, FrontendOut, NF_MAX};
use super::counter::{FieldCounter, SegmentCounter};
use crate::builtin::{Module, Wire};

/// Bit width of the `nf` instruction field
const NF_WIDTH: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeqState {
  Idle,
  /// Issuing micro-ops
  Decomposing,
  /// Last micro-op answered, waiting for the backend to go idle
  Draining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerConfig {
  /// When false the sequencer is plain wiring
  pub segment_support: bool,
  /// Bit width of `vstart`
  pub vstart_width: u32,
}

impl Default for SequencerConfig {
  fn default() -> Self {
    Self {
      segment_support: true,
      vstart_width: 64,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequencerStats {
  pub accepted: u64,
  pub micro_ops: u64,
  pub errors_forwarded: u64,
  pub completions: u64,
}

/// Consolidated answer held across `Draining`
#[derive(Debug, Clone, PartialEq, Eq)]
struct BufferedResp {
  /// Invalid when an error was already forwarded
  resp: Wire<AraResp>,
  is_vload: bool,
}

/// Register updates decided by one combinational evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
struct Latch {
  field_clear: bool,
  field_advance: bool,
  seg_load: Option<u64>,
  seg_advance: bool,
  in_flight: bool,
  error_forwarded: bool,
  capture: Option<BufferedResp>,
  release: bool,
  // bookkeeping only
  accepted: Option<AraReq>,
  issued: bool,
  /// An error reaches the dispatcher this cycle
  error_pulse: bool,
}

/// Outputs of one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeqOutputs {
  pub fe: FrontendOut,
  pub be: BackendOut,
}

/// Result of `comb`: what the sequencer drives this cycle and where it goes next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
  pub outputs: SeqOutputs,
  pub next_state: SeqState,
  latch: Latch,
}

#[derive(Debug, Clone)]
pub struct SegmentSequencer {
  name: String,
  config: SequencerConfig,

  // Inputs
  pub fe_in: FrontendIn,
  pub be_in: BackendIn,

  // Outputs
  pub fe_out: FrontendOut,
  pub be_out: BackendOut,

  // Registers
  state: SeqState,
  field_cnt: FieldCounter,
  seg_cnt: SegmentCounter,
  in_flight: bool,
  error_forwarded: bool,
  resp_buf: Option<BufferedResp>,

  stats: SequencerStats,
}

impl SegmentSequencer {
  pub fn new(name: impl Into<String>, config: SequencerConfig) -> Self {
    Self {
      name: name.into(),
      config,
      fe_in: FrontendIn::default(),
      be_in: BackendIn::default(),
      fe_out: FrontendOut::default(),
      be_out: BackendOut::default(),
      state: SeqState::Idle,
      field_cnt: FieldCounter::new(NF_WIDTH),
      seg_cnt: SegmentCounter::new(config.vstart_width),
      in_flight: false,
      error_forwarded: false,
      resp_buf: None,
      stats: SequencerStats::default(),
    }
  }

  pub fn state(&self) -> SeqState {
    self.state
  }

  pub fn config(&self) -> &SequencerConfig {
    &self.config
  }

  pub fn stats(&self) -> &SequencerStats {
    &self.stats
  }

  pub fn field(&self) -> u8 {
    self.field_cnt.value()
  }

  pub fn segment(&self) -> u64 {
    self.seg_cnt.value()
  }

  pub fn segment_micro_op_on(&self) -> bool {
    self.state != SeqState::Idle
  }

  /// True when the request starts a new segmented operation.
  /// Anything the counters cannot sweep to the end passes through.
  fn accepts(&self, fe: &FrontendIn) -> bool {
    let req = &fe.req.value;
    self.config.segment_support
      && fe.req.valid
      && fe.flags.is_segment_mem_op
      && !fe.flags.illegal_insn
      && req.nf != 0
      && req.nf <= NF_MAX
      && req.vstart < req.vl
      && self.seg_cnt.reaches(req.vl)
  }

  /// Micro-op for the current (segment, field) of `orig`
  fn micro_op(&self, orig: &AraReq) -> AraReq {
    let field = self.field_cnt.value();
    AraReq {
      vl: 1,
      vstart: self.seg_cnt.value(),
      vs1: vreg_offset(orig.vs1, field),
      vd: vreg_offset(orig.vd, field),
      ..orig.clone()
    }
  }

  fn hold(&self) -> Latch {
    Latch {
      field_clear: false,
      field_advance: false,
      seg_load: None,
      seg_advance: false,
      in_flight: self.in_flight,
      error_forwarded: self.error_forwarded,
      capture: None,
      release: false,
      accepted: None,
      issued: false,
      error_pulse: false,
    }
  }

  /// Combinational evaluation of one cycle. Does not touch any register.
  pub fn comb(&self, fe: &FrontendIn, be: &BackendIn) -> Step {
    let mut fe_out = FrontendOut {
      req_ready: be.req_ready,
      resp: be.resp.clone(),
      load_complete: be.load_complete,
      store_complete: be.store_complete,
      segment_micro_op_on: self.segment_micro_op_on(),
    };
    let mut be_out = BackendOut { req: fe.req.clone() };
    let mut next_state = self.state;
    let mut latch = self.hold();

    match self.state {
      SeqState::Idle => {
        if self.accepts(fe) {
          // First micro-op goes out on the accepting cycle
          next_state = SeqState::Decomposing;
          latch.field_clear = true;
          latch.seg_load = Some(fe.req.value.vstart);
          latch.error_forwarded = false;
          latch.accepted = Some(fe.req.value.clone());
          be_out.req.value.vl = 1;
          fe_out.req_ready = false;
          if be.req_ready {
            latch.in_flight = true;
            latch.issued = true;
          }
        }
      },
      SeqState::Decomposing => {
        let orig = &fe.req.value;
        fe_out.req_ready = false;
        fe_out.resp.clear();
        fe_out.load_complete = false;
        fe_out.store_complete = false;

        be_out.req = Wire {
          value: self.micro_op(orig),
          valid: fe.req.valid && !self.in_flight,
        };
        let issue = be_out.req.valid && be.req_ready;
        latch.issued = issue;
        latch.in_flight = (self.in_flight && !be.resp.valid) || issue;

        if be.resp.valid {
          let segment_done = self.field_cnt.wraps(orig.nf, true);
          latch.field_advance = true;
          latch.field_clear = segment_done;
          latch.seg_advance = segment_done;

          let error = be.resp.value.error;
          if error && !self.error_forwarded {
            fe_out.resp = be.resp.clone();
            latch.error_forwarded = true;
            latch.error_pulse = true;
          }

          let last = segment_done && self.seg_cnt.is_last(orig.vl);
          if last {
            let resp = if latch.error_forwarded {
              Wire::new(be.resp.value.clone())
            } else {
              be.resp.clone()
            };
            latch.capture = Some(BufferedResp {
              resp,
              is_vload: fe.flags.is_vload,
            });
            next_state = SeqState::Draining;
          }
        }
      },
      SeqState::Draining => {
        be_out.req.clear();
        fe_out.req_ready = false;
        fe_out.resp.clear();
        fe_out.load_complete = false;
        fe_out.store_complete = false;

        if be.idle {
          if let Some(buf) = &self.resp_buf {
            fe_out.resp = buf.resp.clone();
            fe_out.load_complete = buf.is_vload;
            fe_out.store_complete = !buf.is_vload;
          }
          // Retire the original instruction at the dispatcher
          fe_out.req_ready = true;
          latch.release = true;
          next_state = SeqState::Idle;
        }
      },
    }

    Step {
      outputs: SeqOutputs { fe: fe_out, be: be_out },
      next_state,
      latch,
    }
  }

  /// Commit the register updates of `step`
  pub fn latch(&mut self, step: &Step) {
    let latch = &step.latch;

    self.field_cnt.step(latch.field_clear, latch.field_advance);
    self.seg_cnt.step(latch.seg_load, latch.seg_advance);
    self.in_flight = latch.in_flight;
    self.error_forwarded = latch.error_forwarded;
    if let Some(buf) = &latch.capture {
      self.resp_buf = Some(buf.clone());
    }
    if latch.release {
      self.resp_buf = None;
      self.error_forwarded = false;
      self.stats.completions += 1;
    }

    if let Some(req) = &latch.accepted {
      self.stats.accepted += 1;
      info!(
        "[{}] segmented op accepted: op={:?}, nf={}, vl={}, vstart={}",
        self.name, req.op, req.nf, req.vl, req.vstart
      );
    }
    if latch.issued {
      self.stats.micro_ops += 1;
      let req = &step.outputs.be.req.value;
      debug!(
        "[{}] micro-op issued: vstart={}, vs1={}, vd={}",
        self.name, req.vstart, req.vs1, req.vd
      );
    }
    if latch.error_pulse {
      self.stats.errors_forwarded += 1;
      warn!("[{}] micro-op error forwarded: {:?}", self.name, step.outputs.fe.resp.value);
    }
    if latch.release {
      info!(
        "[{}] segmented op released: load_complete={}, store_complete={}",
        self.name, step.outputs.fe.load_complete, step.outputs.fe.store_complete
      );
    }
    if self.state != step.next_state {
      debug!("[{}] {:?} -> {:?}", self.name, self.state, step.next_state);
    }

    self.state = step.next_state;
  }

  /// One full clock tick on explicit inputs
  pub fn tick(&mut self, fe: &FrontendIn, be: &BackendIn) -> SeqOutputs {
    let step = self.comb(fe, be);
    self.latch(&step);
    step.outputs
  }
}

impl Module for SegmentSequencer {
  fn run(&mut self) {
    let step = self.comb(&self.fe_in, &self.be_in);
    self.latch(&step);
    self.fe_out = step.outputs.fe;
    self.be_out = step.outputs.be;
  }

  fn reset(&mut self) {
    self.fe_in = FrontendIn::default();
    self.be_in = BackendIn::default();
    self.fe_out = FrontendOut::default();
    self.be_out = BackendOut::default();
    self.state = SeqState::Idle;
    self.field_cnt.clear();
    self.seg_cnt.reset();
    self.in_flight = false;
    self.error_forwarded = false;
    self.resp_buf = None;
  }

  fn name(&self) -> &str {
    &self.name
  }
}
