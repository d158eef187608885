use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to parse TOML config: {0}")]
  Toml(#[from] toml::de::Error),

  #[error("failed to write trace: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid config: {0}")]
  Config(String),

  #[error("simulation did not settle within {0} cycles")]
  CycleLimit(u64),

  #[error("step shell error: {0}")]
  Shell(#[from] rustyline::error::ReadlineError),
}

pub type Result<T> = std::result::Result<T, SimError>;
