// Archivo: config.rs
// Propósito: configuración leída del entorno (y de `.env` si existe).
use crate::document_store::DocumentStore;
use crate::errors::{Result, StoreError};
use crate::file;
use std::path::PathBuf;
use std::sync::Arc;
use todo_domain::DocumentFormat;

pub const ENV_FILE: &str = "TODO_FILE";
pub const ENV_FORMAT: &str = "TODO_FORMAT";
pub const ENV_WORKFLOW: &str = "TODO_WORKFLOW";
pub const ENV_WORKFLOW_FILE: &str = "TODO_WORKFLOW_FILE";

pub const DEFAULT_FILE: &str = ".todo.json";
pub const DEFAULT_WORKFLOW: &str = "todo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
  /// Documento JSON.
  pub file: PathBuf,
  /// Layout para documentos nuevos; uno existente conserva el suyo.
  pub format: DocumentFormat,
  /// Nombre del preset de workflow.
  pub workflow: String,
  /// Configuración JSON que sustituye al preset.
  pub workflow_file: Option<PathBuf>,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self { file: PathBuf::from(DEFAULT_FILE),
           format: DocumentFormat::default(),
           workflow: DEFAULT_WORKFLOW.to_string(),
           workflow_file: None }
  }
}

fn non_empty(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl StoreConfig {
  /// Lee `TODO_FILE`, `TODO_FORMAT`, `TODO_WORKFLOW` y `TODO_WORKFLOW_FILE`.
  pub fn from_env() -> Result<Self> {
    dotenvy::dotenv().ok();
    let defaults = Self::default();
    let format = match non_empty(ENV_FORMAT) {
      Some(raw) => raw.parse::<DocumentFormat>()
                      .map_err(|e| StoreError::Config(format!("{}: {}", ENV_FORMAT, e)))?,
      None => defaults.format,
    };
    Ok(Self { file: non_empty(ENV_FILE).map(PathBuf::from).unwrap_or(defaults.file),
              format,
              workflow: non_empty(ENV_WORKFLOW).unwrap_or(defaults.workflow),
              workflow_file: non_empty(ENV_WORKFLOW_FILE).map(PathBuf::from) })
  }

  pub fn open(&self) -> Result<Arc<dyn DocumentStore>> {
    file::open(&self.file, self.format)
  }

  /// `open` indicando si el documento venía en un formato heredado.
  pub fn open_migrating(&self) -> Result<(Arc<dyn DocumentStore>, bool)> {
    file::open_migrating(&self.file, self.format)
  }
}

/// Abre el documento configurado en el entorno.
pub fn new_from_env() -> Result<Arc<dyn DocumentStore>> {
  StoreConfig::from_env()?.open()
}
