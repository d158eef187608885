use segseq::arch::ara::{
  AraReq, AraTop, Backend, BackendConfig, BackendOut, CycleTrace, Frontend, FrontendEvent, FrontendOut, Instruction,
  SeqState, SequencerConfig, VecOp,
};
use segseq::builtin::Module;

const CYCLE_CAP: usize = 10_000;

fn backend(latency: u32, idle_delay: u32, queue_depth: usize, error_at: Vec<u64>) -> BackendConfig {
  BackendConfig {
    latency,
    idle_delay,
    queue_depth,
    error_at,
  }
}

fn run_top(top: &mut AraTop) -> Vec<CycleTrace> {
  let mut traces = Vec::new();
  for _ in 0..CYCLE_CAP {
    if top.is_quiescent() {
      return traces;
    }
    traces.push(top.tick());
  }
  panic!("top did not settle within {} cycles", CYCLE_CAP);
}

/// Same dispatcher and backend, wired to each other with no sequencer in between
fn run_direct(insts: &[Instruction], config: BackendConfig) -> (Vec<FrontendEvent>, Vec<AraReq>) {
  let mut fe = Frontend::new("dispatcher");
  let mut be = Backend::new("backend", config);
  for inst in insts {
    fe.push(inst.clone());
  }

  for _ in 0..CYCLE_CAP {
    if fe.is_done() && be.is_idle() {
      return (fe.events().to_vec(), be.issued().to_vec());
    }
    let to_backend = BackendOut {
      req: fe.output.req.clone(),
    };
    let from_backend = be.output.clone();
    let to_frontend = FrontendOut {
      req_ready: from_backend.req_ready,
      resp: from_backend.resp,
      load_complete: from_backend.load_complete,
      store_complete: from_backend.store_complete,
      segment_micro_op_on: false,
    };
    be.connect(&to_backend);
    fe.connect(&to_frontend);
    be.run();
    fe.run();
  }
  panic!("direct wiring did not settle within {} cycles", CYCLE_CAP);
}

fn responses(top: &AraTop) -> Vec<(u64, segseq::arch::ara::AraResp)> {
  top
    .frontend
    .events()
    .iter()
    .filter_map(|e| match e {
      FrontendEvent::Response { cycle, resp } => Some((*cycle, resp.clone())),
      _ => None,
    })
    .collect()
}

fn completions(top: &AraTop) -> Vec<FrontendEvent> {
  top
    .frontend
    .events()
    .iter()
    .filter(|e| matches!(e, FrontendEvent::LoadComplete { .. } | FrontendEvent::StoreComplete { .. }))
    .cloned()
    .collect()
}

fn plain_workload() -> Vec<Instruction> {
  vec![
    Instruction::plain(VecOp::Load, 16, 0, 4),
    Instruction::plain(VecOp::Other, 8, 4, 6),
    Instruction::plain(VecOp::Store, 16, 0, 6),
    Instruction::plain(VecOp::Other, 1, 1, 2),
    Instruction::plain(VecOp::Load, 3, 0, 9),
  ]
}

#[test]
fn test_pass_through_matches_direct_wiring() {
  let config = backend(2, 1, 2, vec![3]);
  let insts = plain_workload();

  let (direct_events, direct_issued) = run_direct(&insts, config.clone());

  let mut top = AraTop::new("ara_top", SequencerConfig::default(), config);
  for inst in &insts {
    top.push(inst.clone());
  }
  let traces = run_top(&mut top);

  assert!(traces.iter().all(|t| t.state == SeqState::Idle));
  assert_eq!(top.frontend.events(), direct_events.as_slice());
  assert_eq!(top.backend.issued(), direct_issued.as_slice());
  assert_eq!(top.sequencer.stats().accepted, 0);
}

#[test]
fn test_disabled_segment_support_is_pure_wiring() {
  let config = backend(1, 0, 1, Vec::new());
  let insts = vec![
    Instruction::segmented(VecOp::Load, 1, 2, 0, 4, 8),
    Instruction::plain(VecOp::Other, 4, 1, 2),
    Instruction::segmented(VecOp::Store, 3, 5, 1, 0, 16),
  ];

  let (direct_events, direct_issued) = run_direct(&insts, config.clone());

  let seq_config = SequencerConfig {
    segment_support: false,
    ..SequencerConfig::default()
  };
  let mut top = AraTop::new("ara_top", seq_config, config);
  for inst in &insts {
    top.push(inst.clone());
  }
  let traces = run_top(&mut top);

  assert!(traces.iter().all(|t| t.state == SeqState::Idle));
  assert_eq!(top.frontend.events(), direct_events.as_slice());
  assert_eq!(top.backend.issued(), direct_issued.as_slice());
}

#[test]
fn test_undecomposable_segmented_ops_are_pure_wiring() {
  let config = backend(2, 1, 1, Vec::new());
  let insts = vec![
    Instruction::segmented(VecOp::Load, 0, 4, 0, 4, 8),
    Instruction::segmented(VecOp::Store, 8, 1, 0, 0, 16),
    Instruction::segmented(VecOp::Load, 2, 3, 3, 1, 2),
  ];

  let (direct_events, direct_issued) = run_direct(&insts, config.clone());

  let mut top = AraTop::new("ara_top", SequencerConfig::default(), config);
  for inst in &insts {
    top.push(inst.clone());
  }
  let traces = run_top(&mut top);

  assert!(traces.iter().all(|t| t.state == SeqState::Idle));
  assert_eq!(top.frontend.events(), direct_events.as_slice());
  assert_eq!(top.backend.issued(), direct_issued.as_slice());
  assert_eq!(top.backend.issued()[0].vl, 4);
  assert_eq!(top.sequencer.stats().accepted, 0);
}

#[test]
fn test_two_field_scenario() {
  let mut top = AraTop::new("ara_top", SequencerConfig::default(), backend(1, 0, 1, Vec::new()));
  top.push(Instruction::segmented(VecOp::Load, 1, 2, 0, 4, 8));

  let traces = run_top(&mut top);

  let micro_ops: Vec<(u64, u64, u8, u8)> = traces
    .iter()
    .filter_map(|t| t.to_backend.as_ref())
    .map(|r| (r.vl, r.vstart, r.vs1, r.vd))
    .collect();
  assert_eq!(micro_ops, vec![(1, 0, 4, 8), (1, 0, 5, 9), (1, 1, 4, 8), (1, 1, 5, 9)]);

  assert_eq!(responses(&top).len(), 1);
  assert_eq!(completions(&top).len(), 1);
  assert!(matches!(completions(&top)[0], FrontendEvent::LoadComplete { .. }));

  let last = traces.last().unwrap();
  assert_eq!(last.state, SeqState::Draining);
  assert!(last.to_frontend.is_some());
  assert!(last.load_complete);
  assert!(!last.store_complete);
  assert_eq!(top.sequencer.state(), SeqState::Idle);
}

#[test]
fn test_decomposition_count_and_indices() {
  for &(nf, vl, vstart) in &[(1u8, 1u64, 0u64), (2, 4, 0), (7, 3, 1), (3, 9, 8), (4, 6, 2)] {
    let mut top = AraTop::new("ara_top", SequencerConfig::default(), backend(2, 3, 2, Vec::new()));
    top.push(Instruction::segmented(VecOp::Store, nf, vl, vstart, 3, 16));
    run_top(&mut top);

    let fields = nf as u64 + 1;
    let issued = top.backend.issued();
    assert_eq!(issued.len() as u64, (vl - vstart) * fields, "nf={} vl={} vstart={}", nf, vl, vstart);

    for (k, req) in issued.iter().enumerate() {
      let k = k as u64;
      let segment = k / fields;
      let field = (k % fields) as u8;
      assert_eq!(req.vl, 1);
      assert_eq!(req.vstart, vstart + segment);
      assert_eq!(req.vs1, 3 + field);
      assert_eq!(req.vd, 16 + field);
      assert_eq!(req.nf, nf);
      assert_eq!(req.op, VecOp::Store);
    }

    assert_eq!(completions(&top).len(), 1);
    assert!(matches!(completions(&top)[0], FrontendEvent::StoreComplete { .. }));
  }
}

#[test]
fn test_register_index_wraps_at_five_bits() {
  let mut top = AraTop::new("ara_top", SequencerConfig::default(), backend(1, 0, 1, Vec::new()));
  top.push(Instruction::segmented(VecOp::Load, 2, 1, 0, 30, 31));
  run_top(&mut top);

  let regs: Vec<(u8, u8)> = top.backend.issued().iter().map(|r| (r.vs1, r.vd)).collect();
  assert_eq!(regs, vec![(30, 31), (31, 0), (0, 1)]);
}

#[test]
fn test_one_micro_op_outstanding() {
  let latency = 3;
  let mut top = AraTop::new("ara_top", SequencerConfig::default(), backend(latency, 0, 4, Vec::new()));
  top.push(Instruction::segmented(VecOp::Load, 3, 4, 0, 0, 8));

  let traces = run_top(&mut top);
  let issue_cycles: Vec<u64> = traces.iter().filter(|t| t.to_backend.is_some()).map(|t| t.cycle).collect();

  assert_eq!(issue_cycles.len(), 16);
  for pair in issue_cycles.windows(2) {
    assert!(pair[1] - pair[0] > latency as u64);
  }
}

#[test]
fn test_completion_waits_for_backend_idle() {
  let idle_delay = 3;
  let mut top = AraTop::new("ara_top", SequencerConfig::default(), backend(1, idle_delay, 1, Vec::new()));
  top.push(Instruction::segmented(VecOp::Store, 1, 2, 0, 0, 4));

  let traces = run_top(&mut top);

  let draining = traces.iter().filter(|t| t.state == SeqState::Draining).count();
  assert_eq!(draining as u32, idle_delay + 1);

  let last_issue = traces.iter().filter(|t| t.to_backend.is_some()).map(|t| t.cycle).max().unwrap();
  let done: Vec<&CycleTrace> = traces.iter().filter(|t| t.store_complete || t.load_complete).collect();
  assert_eq!(done.len(), 1);
  assert!(done[0].store_complete);
  assert!(done[0].cycle > last_issue);
  assert!(done[0].to_frontend.is_some());
}

#[test]
fn test_early_error_forwarded_immediately() {
  // nf=1, vl=3, vstart=1: micro-op 2 is segment 2, field 0
  let mut top = AraTop::new("ara_top", SequencerConfig::default(), backend(1, 0, 1, vec![2]));
  top.push(Instruction::segmented(VecOp::Load, 1, 3, 1, 0, 8));

  let traces = run_top(&mut top);

  assert_eq!(top.backend.issued().len(), 4);

  let resps = responses(&top);
  assert_eq!(resps.len(), 1);
  assert!(resps[0].1.error);
  assert_eq!(resps[0].1.error_vl, 2);

  // Forwarded while still decomposing, not at release
  let forwarded = traces.iter().find(|t| t.to_frontend.is_some()).unwrap();
  assert_eq!(forwarded.state, SeqState::Decomposing);
  assert!(!forwarded.load_complete);

  assert_eq!(completions(&top).len(), 1);
  assert_eq!(top.sequencer.stats().errors_forwarded, 1);
}

#[test]
fn test_only_first_error_forwarded() {
  let mut top = AraTop::new("ara_top", SequencerConfig::default(), backend(2, 1, 1, vec![0, 3, 5]));
  top.push(Instruction::segmented(VecOp::Store, 2, 2, 0, 0, 8));

  run_top(&mut top);

  assert_eq!(top.backend.issued().len(), 6);
  let resps = responses(&top);
  assert_eq!(resps.len(), 1);
  assert!(resps[0].1.error);
  assert_eq!(resps[0].1.error_vl, 0);
  assert_eq!(completions(&top).len(), 1);
}

#[test]
fn test_error_state_cleared_between_instructions() {
  let mut top = AraTop::new("ara_top", SequencerConfig::default(), backend(1, 0, 1, vec![1]));
  top.push(Instruction::segmented(VecOp::Load, 1, 1, 0, 0, 8));
  top.push(Instruction::segmented(VecOp::Store, 1, 1, 0, 0, 8));

  run_top(&mut top);

  let resps = responses(&top);
  assert_eq!(resps.len(), 2);
  assert!(resps[0].1.error);
  assert!(!resps[1].1.error);

  let done = completions(&top);
  assert_eq!(done.len(), 2);
  assert!(matches!(done[0], FrontendEvent::LoadComplete { .. }));
  assert!(matches!(done[1], FrontendEvent::StoreComplete { .. }));
  assert_eq!(top.sequencer.stats().completions, 2);
}

#[test]
fn test_mixed_workload() {
  let mut top = AraTop::new("ara_top", SequencerConfig::default(), backend(2, 1, 2, Vec::new()));
  top.push(Instruction::plain(VecOp::Load, 8, 0, 2));
  top.push(Instruction::segmented(VecOp::Load, 1, 2, 0, 4, 8));
  top.push(Instruction::plain(VecOp::Other, 8, 8, 10));
  top.push(Instruction::segmented(VecOp::Store, 2, 3, 1, 0, 12));
  top.push(Instruction::plain(VecOp::Store, 8, 0, 2));

  run_top(&mut top);

  // 1 + 4 + 1 + 6 + 1 backend requests
  assert_eq!(top.backend.issued().len(), 13);
  assert_eq!(responses(&top).len(), 5);

  let done = completions(&top);
  assert_eq!(done.len(), 4);
  assert!(matches!(done[0], FrontendEvent::LoadComplete { .. }));
  assert!(matches!(done[1], FrontendEvent::LoadComplete { .. }));
  assert!(matches!(done[2], FrontendEvent::StoreComplete { .. }));
  assert!(matches!(done[3], FrontendEvent::StoreComplete { .. }));

  let retired: Vec<u64> = top
    .frontend
    .events()
    .iter()
    .filter_map(|e| match e {
      FrontendEvent::Retired { id, .. } => Some(*id),
      _ => None,
    })
    .collect();
  assert_eq!(retired, vec![0, 1, 2, 3, 4]);
  assert_eq!(top.sequencer.stats().accepted, 2);
  assert_eq!(top.sequencer.stats().micro_ops, 10);
}

#[test]
fn test_reset_mid_operation() {
  let mut top = AraTop::new("ara_top", SequencerConfig::default(), backend(1, 0, 1, Vec::new()));
  top.push(Instruction::segmented(VecOp::Load, 3, 4, 0, 0, 8));

  for _ in 0..7 {
    top.tick();
  }
  assert_eq!(top.sequencer.state(), SeqState::Decomposing);

  top.reset();
  assert_eq!(top.sequencer.state(), SeqState::Idle);
  assert_eq!(top.sequencer.field(), 0);
  assert_eq!(top.sequencer.segment(), 0);
  assert!(top.is_quiescent());

  top.reset();
  assert_eq!(top.sequencer.state(), SeqState::Idle);

  // Fully usable afterwards
  top.push(Instruction::segmented(VecOp::Store, 1, 2, 0, 4, 8));
  run_top(&mut top);
  assert_eq!(top.backend.issued().len(), 4);
  assert_eq!(completions(&top).len(), 1);
}
