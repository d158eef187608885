/// Common interface of every cycle-stepped component
pub trait Module {
  /// Evaluate one clock tick
  fn run(&mut self);

  /// Synchronous reset
  fn reset(&mut self);

  fn name(&self) -> &str;
}
