// errors.rs
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
  #[error("validation error: {0}")]
  ValidationError(String),
  #[error("serialization error: {0}")]
  SerializationError(String),
  #[error("unrecognized document layout: {0}")]
  UnknownFormat(String),
}

impl From<serde_json::Error> for DomainError {
  fn from(e: serde_json::Error) -> Self {
    Self::SerializationError(e.to_string())
  }
}

pub type Result<T> = std::result::Result<T, DomainError>;
