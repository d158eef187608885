use log::info;

use crate::arch::ara::{AraTop, FrontendEvent};

pub fn print_simulation_report(top: &AraTop) {
  let stats = top.sequencer.stats();

  info!("--- Simulation Report ---");
  info!("cycles:                {}", top.cycle());
  info!("segmented ops:         {}", stats.accepted);
  info!("micro-ops issued:      {}", stats.micro_ops);
  info!("errors forwarded:      {}", stats.errors_forwarded);
  info!("completions released:  {}", stats.completions);
  info!("backend requests:      {}", top.backend.issued().len());

  for event in top.frontend.events() {
    match event {
      FrontendEvent::Retired { cycle, id } => info!("  [{:>6}] retired #{}", cycle, id),
      FrontendEvent::Response { cycle, resp } => info!(
        "  [{:>6}] response result={:#x} error={} error_vl={}",
        cycle, resp.result, resp.error, resp.error_vl
      ),
      FrontendEvent::LoadComplete { cycle } => info!("  [{:>6}] load complete", cycle),
      FrontendEvent::StoreComplete { cycle } => info!("  [{:>6}] store complete", cycle),
    }
  }
  info!("--- End Report ---");
}
