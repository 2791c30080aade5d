use crate::errors::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Layout de un documento en disco.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
  /// `{"items": [...]}` con puntero al padre.
  #[default]
  Flat,
  /// `{"todos": [...]}` con hijos anidados (o un array desnudo, heredado).
  Tree,
}

impl DocumentFormat {
  /// Detecta el layout de un documento ya parseado.
  pub fn detect(value: &Value) -> Result<Self, DomainError> {
    match value {
      Value::Array(_) => Ok(DocumentFormat::Tree),
      Value::Object(map) if map.contains_key("items") => Ok(DocumentFormat::Flat),
      Value::Object(map) if map.contains_key("todos") => Ok(DocumentFormat::Tree),
      Value::Object(_) => Err(DomainError::UnknownFormat("expected an 'items' or 'todos' key".to_string())),
      _ => Err(DomainError::UnknownFormat("expected a JSON object or array".to_string())),
    }
  }
}

impl fmt::Display for DocumentFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      DocumentFormat::Flat => "flat",
      DocumentFormat::Tree => "tree",
    };
    write!(f, "{}", s)
  }
}

impl FromStr for DocumentFormat {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "flat" => Ok(DocumentFormat::Flat),
      "tree" => Ok(DocumentFormat::Tree),
      other => Err(DomainError::UnknownFormat(format!("'{}' (expected 'flat' or 'tree')", other))),
    }
  }
}
