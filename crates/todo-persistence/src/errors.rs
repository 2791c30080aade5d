use idm::IdmError;
use thiserror::Error;
use todo_domain::DomainError;

/// Errores de la capa de persistencia en fichero.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
  #[error("i/o error: {0}")]
  Io(String),
  #[error(transparent)]
  Domain(#[from] DomainError),
  #[error(transparent)]
  Idm(#[from] IdmError),
  #[error("configuration error: {0}")]
  Config(String),
}

impl From<std::io::Error> for StoreError {
  fn from(e: std::io::Error) -> Self {
    Self::Io(e.to_string())
  }
}

impl From<StoreError> for IdmError {
  fn from(e: StoreError) -> Self {
    match e {
      StoreError::Idm(inner) => inner,
      other => IdmError::Adapter(other.to_string()),
    }
  }
}

impl StoreError {
  /// Errores causados por la entrada del usuario (no por el disco).
  pub fn is_user_error(&self) -> bool {
    match self {
      StoreError::Idm(e) => e.is_user_error(),
      StoreError::Domain(DomainError::ValidationError(_)) => true,
      StoreError::Config(_) => true,
      _ => false,
    }
  }
}

pub type Result<T> = std::result::Result<T, StoreError>;
