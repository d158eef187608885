pub mod backend;
pub mod bundles;
pub mod counter;
pub mod frontend;
pub mod segment_sequencer;
pub mod top;

pub use backend::{Backend, BackendConfig};
pub use bundles::{AraReq, AraResp, BackendIn, BackendOut, FrontendIn, FrontendOut, ReqFlags, VecOp};
pub use frontend::{Frontend, FrontendEvent, Instruction};
pub use segment_sequencer::{SegmentSequencer, SeqState, SequencerConfig, SequencerStats};
pub use top::{AraTop, CycleTrace};
