pub mod arch;
pub mod builtin;
pub mod error;
pub mod simulator;

pub use arch::ara::{AraTop, SegmentSequencer, SeqState, SequencerConfig};
pub use error::{Result, SimError};
pub use simulator::sim::mode::{SimConfig, StepMode};
pub use simulator::utils::log;
