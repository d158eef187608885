use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::arch::ara::CycleTrace;
use crate::error::Result;

/// JSON-lines trace of the sequencer's boundary traffic
pub struct TraceWriter {
  writer: BufWriter<File>,
}

impl TraceWriter {
  pub fn create(path: &Path) -> Result<Self> {
    let file = File::create(path)?;
    Ok(Self {
      writer: BufWriter::new(file),
    })
  }

  /// Quiet cycles are skipped
  pub fn record(&mut self, trace: &CycleTrace) -> Result<()> {
    if trace.is_quiet() {
      return Ok(());
    }
    serde_json::to_writer(&mut self.writer, trace)?;
    writeln!(self.writer)?;
    Ok(())
  }

  pub fn flush(&mut self) -> Result<()> {
    self.writer.flush()?;
    Ok(())
  }
}
