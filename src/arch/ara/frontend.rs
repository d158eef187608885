//! Stand-in for the dispatcher
//!
//! Presents a queue of decoded vector instructions one at a time and keeps
//! a log of what comes back.

use std::collections::VecDeque;

use log::debug;
use serde::{Deserialize, Serialize};

use super::bundles::{AraReq, AraResp, FrontendIn, FrontendOut, ReqFlags, VecOp};
use crate::builtin::{Module, Wire};

/// A decoded instruction: the request plus the decoder's side-band flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
  pub req: AraReq,
  pub flags: ReqFlags,
}

impl Instruction {
  /// Segmented load/store with `nf + 1` fields
  pub fn segmented(op: VecOp, nf: u8, vl: u64, vstart: u64, vs1: u8, vd: u8) -> Self {
    Self {
      req: AraReq {
        op,
        vl,
        vstart,
        nf,
        vs1,
        vd,
        ..AraReq::default()
      },
      flags: ReqFlags {
        is_segment_mem_op: true,
        illegal_insn: false,
        is_vload: op == VecOp::Load,
      },
    }
  }

  /// Anything the sequencer should not touch
  pub fn plain(op: VecOp, vl: u64, vs1: u8, vd: u8) -> Self {
    Self {
      req: AraReq {
        op,
        vl,
        vs1,
        vd,
        ..AraReq::default()
      },
      flags: ReqFlags {
        is_segment_mem_op: false,
        illegal_insn: false,
        is_vload: op == VecOp::Load,
      },
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrontendEvent {
  Retired { cycle: u64, id: u64 },
  Response { cycle: u64, resp: AraResp },
  LoadComplete { cycle: u64 },
  StoreComplete { cycle: u64 },
}

#[derive(Debug, Clone)]
pub struct Frontend {
  name: String,

  // Input from the sequencer
  pub input: FrontendOut,

  // Registered output
  pub output: FrontendIn,

  queue: VecDeque<Instruction>,
  /// Non-segmented requests still waiting for their response
  outstanding: usize,
  next_id: u64,
  cycle: u64,
  events: Vec<FrontendEvent>,
}

impl Frontend {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      input: FrontendOut::default(),
      output: FrontendIn::default(),
      queue: VecDeque::new(),
      outstanding: 0,
      next_id: 0,
      cycle: 0,
      events: Vec::new(),
    }
  }

  /// Queue an instruction; its `req.id` is replaced by a sequence number
  pub fn push(&mut self, mut inst: Instruction) -> u64 {
    let id = self.next_id;
    inst.req.id = id;
    self.next_id += 1;
    self.queue.push_back(inst);
    self.output = self.drive();
    id
  }

  pub fn events(&self) -> &[FrontendEvent] {
    &self.events
  }

  pub fn pending(&self) -> usize {
    self.queue.len()
  }

  pub fn is_done(&self) -> bool {
    self.queue.is_empty() && self.outstanding == 0
  }

  /// A segmented instruction waits for every older response
  fn drive(&self) -> FrontendIn {
    match self.queue.front() {
      Some(head) if !head.flags.is_segment_mem_op || self.outstanding == 0 => FrontendIn {
        req: Wire::driven(head.req.clone()),
        flags: head.flags,
      },
      _ => FrontendIn::default(),
    }
  }

  /// Sample the sequencer's answer for this cycle
  pub fn connect(&mut self, from_seq: &FrontendOut) {
    self.input = from_seq.clone();
  }
}

impl Module for Frontend {
  fn run(&mut self) {
    let input = &self.input;

    if let Some(resp) = input.resp.fire() {
      debug!("[{}] response: {:?}", self.name, resp);
      self.events.push(FrontendEvent::Response {
        cycle: self.cycle,
        resp: resp.clone(),
      });
      if !input.segment_micro_op_on {
        self.outstanding = self.outstanding.saturating_sub(1);
      }
    }
    if input.load_complete {
      self.events.push(FrontendEvent::LoadComplete { cycle: self.cycle });
    }
    if input.store_complete {
      self.events.push(FrontendEvent::StoreComplete { cycle: self.cycle });
    }

    if self.output.req.valid && input.req_ready {
      if let Some(inst) = self.queue.pop_front() {
        debug!("[{}] retired request #{}", self.name, inst.req.id);
        self.events.push(FrontendEvent::Retired {
          cycle: self.cycle,
          id: inst.req.id,
        });
        if !input.segment_micro_op_on {
          self.outstanding += 1;
        }
      }
    }

    self.cycle += 1;
    self.output = self.drive();
  }

  fn reset(&mut self) {
    self.input = FrontendOut::default();
    self.queue.clear();
    self.outstanding = 0;
    self.cycle = 0;
    self.events.clear();
    self.output = self.drive();
  }

  fn name(&self) -> &str {
    &self.name
  }
}
