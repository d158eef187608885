//! Field and segment-index counters of the segment sequencer
//!
//! Both are plain registers: the sequencer computes the control pulses of a
//! cycle first and applies them with `step` when it latches.

fn mask(width: u32) -> u64 {
  if width >= 64 {
    u64::MAX
  } else {
    (1u64 << width) - 1
  }
}

/// Counts the field of the current segment, `0..=nf`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldCounter {
  value: u8,
  width: u32,
}

impl FieldCounter {
  /// `width` is the bit width of `nf`
  pub fn new(width: u32) -> Self {
    Self { value: 0, width }
  }

  pub fn value(&self) -> u8 {
    self.value
  }

  pub fn clear(&mut self) {
    self.value = 0;
  }

  pub fn advance(&mut self) {
    self.value = (self.value.wrapping_add(1) as u64 & mask(self.width)) as u8;
  }

  /// Apply one cycle of control. Clear wins over advance.
  pub fn step(&mut self, clear: bool, advance: bool) {
    if clear {
      self.clear();
    } else if advance {
      self.advance();
    }
  }

  /// Segment-complete pulse: advancing while the last field is being processed
  pub fn wraps(&self, nf: u8, advance: bool) -> bool {
    advance && self.value == nf
  }
}

/// Counts segments from `vstart` up to `vl`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentCounter {
  value: u64,
  width: u32,
}

impl SegmentCounter {
  /// `width` is the bit width of `vstart`
  pub fn new(width: u32) -> Self {
    Self { value: 0, width }
  }

  pub fn value(&self) -> u64 {
    self.value
  }

  /// Value after one more segment
  pub fn next(&self) -> u64 {
    self.value.wrapping_add(1) & mask(self.width)
  }

  /// `value` fits in the counter without truncation
  pub fn holds(&self, value: u64) -> bool {
    value & !mask(self.width) == 0
  }

  /// The counter can run from any start up to `vl` before wrapping
  pub fn reaches(&self, vl: u64) -> bool {
    self.width >= 64 || vl <= 1u64 << self.width
  }

  /// Advancing now finishes an operation of length `vl`.
  /// A `vl` of exactly `2^width` ends on the wrap back to zero.
  pub fn is_last(&self, vl: u64) -> bool {
    self.next() == vl & mask(self.width)
  }

  pub fn load(&mut self, value: u64) {
    self.value = value & mask(self.width);
  }

  pub fn advance(&mut self) {
    self.value = self.next();
  }

  /// Apply one cycle of control. Load wins over advance.
  pub fn step(&mut self, load: Option<u64>, advance: bool) {
    if let Some(value) = load {
      self.load(value);
    } else if advance {
      self.advance();
    }
  }

  /// Only used by reset; a new operation always loads
  pub(crate) fn reset(&mut self) {
    self.value = 0;
  }
}
