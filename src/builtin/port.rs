//! Port and signal types for module interconnection

/// A wire/signal that carries data between modules.
/// Every wire carries its own valid bit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wire<T: Clone> {
  pub value: T,
  pub valid: bool,
}

impl<T: Clone> Wire<T> {
  pub fn new(value: T) -> Self {
    Self { value, valid: false }
  }

  /// A wire driven with `value`
  pub fn driven(value: T) -> Self {
    Self { value, valid: true }
  }

  pub fn set(&mut self, value: T) {
    self.value = value;
    self.valid = true;
  }

  pub fn clear(&mut self) {
    self.valid = false;
  }

  /// Value of the wire, only if it is driven this cycle
  pub fn fire(&self) -> Option<&T> {
    if self.valid {
      Some(&self.value)
    } else {
      None
    }
  }
}

impl<T: Clone + Default> Default for Wire<T> {
  fn default() -> Self {
    Self {
      value: T::default(),
      valid: false,
    }
  }
}
