//! Stand-in for the vector backend (lanes + VLSU)
//!
//! Executes every accepted request after a fixed latency, in order, and
//! reports an idle level once all work has retired. Only the handshake is
//! modelled; no data moves.

use std::collections::{HashSet, VecDeque};

use log::trace;

use super::bundles::{AraReq, AraResp, BackendIn, BackendOut, VecOp};
use crate::builtin::{Module, Wire};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
  /// Cycles from acceptance to response
  pub latency: u32,
  /// Cycles between the last retirement and the idle level
  pub idle_delay: u32,
  /// Requests that may be outstanding at once
  pub queue_depth: usize,
  /// Global request indices that answer with an error
  pub error_at: Vec<u64>,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      latency: 1,
      idle_delay: 0,
      queue_depth: 1,
      error_at: Vec::new(),
    }
  }
}

#[derive(Debug, Clone)]
struct InFlight {
  req: AraReq,
  index: u64,
  remaining: u32,
}

#[derive(Debug, Clone)]
pub struct Backend {
  name: String,
  config: BackendConfig,
  error_at: HashSet<u64>,

  // Input
  pub req_in: Wire<AraReq>,

  // Registered outputs, valid from the start of the cycle
  pub output: BackendIn,

  queue: VecDeque<InFlight>,
  drain: u32,
  accepted: u64,
  issued: Vec<AraReq>,
}

impl Backend {
  pub fn new(name: impl Into<String>, config: BackendConfig) -> Self {
    let error_at = config.error_at.iter().copied().collect();
    let mut backend = Self {
      name: name.into(),
      config,
      error_at,
      req_in: Wire::default(),
      output: BackendIn::default(),
      queue: VecDeque::new(),
      drain: 0,
      accepted: 0,
      issued: Vec::new(),
    };
    backend.output = backend.drive();
    backend
  }

  /// Every request accepted so far, in order
  pub fn issued(&self) -> &[AraReq] {
    &self.issued
  }

  pub fn is_idle(&self) -> bool {
    self.queue.is_empty() && self.drain == 0
  }

  /// Outputs as a function of the registers only
  fn drive(&self) -> BackendIn {
    let mut out = BackendIn {
      req_ready: self.queue.len() < self.config.queue_depth,
      idle: self.is_idle(),
      ..BackendIn::default()
    };

    if let Some(head) = self.queue.front() {
      if head.remaining == 0 {
        let error = self.error_at.contains(&head.index);
        out.resp.set(AraResp {
          result: head.req.scalar_op,
          error,
          error_vl: if error { head.req.vstart } else { 0 },
        });
        out.load_complete = head.req.op == VecOp::Load;
        out.store_complete = head.req.op == VecOp::Store;
      }
    }

    // The head retiring this cycle frees a slot
    if out.resp.valid {
      out.req_ready = true;
    }
    out
  }

  /// Sample the sequencer's request for this cycle
  pub fn connect(&mut self, from_seq: &BackendOut) {
    self.req_in = from_seq.req.clone();
  }
}

impl Module for Backend {
  fn run(&mut self) {
    let retiring = self.output.resp.valid;
    if retiring {
      if let Some(done) = self.queue.pop_front() {
        trace!("[{}] retire #{}: {:?}", self.name, done.index, done.req.op);
      }
      self.drain = self.config.idle_delay;
    } else if self.queue.is_empty() && self.drain > 0 {
      self.drain -= 1;
    }

    for inflight in self.queue.iter_mut() {
      inflight.remaining = inflight.remaining.saturating_sub(1);
    }

    if self.output.req_ready {
      if let Some(req) = self.req_in.fire() {
        trace!(
          "[{}] accept #{}: vl={}, vstart={}, vs1={}, vd={}",
          self.name, self.accepted, req.vl, req.vstart, req.vs1, req.vd
        );
        self.queue.push_back(InFlight {
          req: req.clone(),
          index: self.accepted,
          remaining: self.config.latency.saturating_sub(1),
        });
        self.issued.push(req.clone());
        self.accepted += 1;
        self.drain = self.config.idle_delay;
      }
    }

    self.req_in.clear();
    self.output = self.drive();
  }

  fn reset(&mut self) {
    self.req_in = Wire::default();
    self.queue.clear();
    self.drain = 0;
    self.accepted = 0;
    self.issued.clear();
    self.output = self.drive();
  }

  fn name(&self) -> &str {
    &self.name
  }
}
