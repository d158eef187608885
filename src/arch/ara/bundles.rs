//! Signal bundles between the dispatcher, the segment sequencer and the backend

use serde::{Deserialize, Serialize};

use crate::builtin::Wire;

/// Vector register indices are 5 bits wide
pub const VREG_MASK: u8 = 0x1f;

/// `nf` is a 3-bit field of the instruction encoding
pub const NF_MAX: u8 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VecOp {
  Load,
  Store,
  #[default]
  Other,
}

/// Request toward the vector backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AraReq {
  pub op: VecOp,
  pub vl: u64,
  pub vstart: u64,
  pub nf: u8,
  pub vs1: u8,
  pub vd: u8,

  // Carried through untouched
  pub vs2: u8,
  pub scalar_op: u64,
  pub eew: u8,
  pub vm: bool,
  pub id: u64,
}

/// Answer of the backend to one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AraResp {
  pub result: u64,
  pub error: bool,
  pub error_vl: u64,
}

/// Decoder side-band flags that travel with a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReqFlags {
  pub is_segment_mem_op: bool,
  pub illegal_insn: bool,
  pub is_vload: bool,
}

/// Dispatcher -> sequencer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontendIn {
  pub req: Wire<AraReq>,
  pub flags: ReqFlags,
}

/// Sequencer -> dispatcher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontendOut {
  pub req_ready: bool,
  pub resp: Wire<AraResp>,
  pub load_complete: bool,
  pub store_complete: bool,
  pub segment_micro_op_on: bool,
}

/// Sequencer -> backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendOut {
  pub req: Wire<AraReq>,
}

/// Backend -> sequencer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendIn {
  pub req_ready: bool,
  pub resp: Wire<AraResp>,
  pub load_complete: bool,
  pub store_complete: bool,
  /// Every unit of the backend has retired its work
  pub idle: bool,
}

/// Add a field offset to a register index with 5-bit wrap-around
pub fn vreg_offset(base: u8, offset: u8) -> u8 {
  base.wrapping_add(offset) & VREG_MASK
}
