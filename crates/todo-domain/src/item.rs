// item.rs
use crate::errors::{DomainError, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Dimensión que reflejaba el antiguo campo escalar `status`.
pub const COMPLETION_DIMENSION: &str = "completion";

/// Genera un UID nuevo (uuid v4 en texto).
pub fn new_uid() -> String {
  Uuid::new_v4().to_string()
}

/// Item del documento con puntero a su padre (`None` = nivel raíz).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
  uid: String,
  parent: Option<String>,
  text: String,
  modified: DateTime<Utc>,
  statuses: BTreeMap<String, String>,
}

impl Item {
  /// Item vacío (sin texto ni estados) bajo `parent`.
  pub fn new(parent: Option<&str>) -> Self {
    Self { uid: new_uid(),
           parent: parent.map(String::from),
           text: String::new(),
           modified: Utc::now(),
           statuses: BTreeMap::new() }
  }

  pub fn from_parts(uid: &str,
                    parent: Option<&str>,
                    text: &str,
                    modified: DateTime<Utc>,
                    statuses: BTreeMap<String, String>)
                    -> Self {
    Self { uid: uid.to_string(), parent: parent.map(String::from), text: text.to_string(), modified, statuses }
  }

  pub fn uid(&self) -> &str {
    &self.uid
  }

  pub fn parent(&self) -> Option<&str> {
    self.parent.as_deref()
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn modified(&self) -> DateTime<Utc> {
    self.modified
  }

  pub fn statuses(&self) -> &BTreeMap<String, String> {
    &self.statuses
  }

  pub fn status(&self, dimension: &str) -> Option<&str> {
    self.statuses.get(dimension).map(|s| s.as_str())
  }

  /// Valor escalar de compatibilidad: el de `completion`, si existe.
  pub fn legacy_status(&self) -> Option<&str> {
    self.status(COMPLETION_DIMENSION)
  }

  /// Reemplaza el texto. No admite texto vacío.
  pub fn set_text(&mut self, text: &str) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
      return Err(DomainError::ValidationError("item text cannot be empty".to_string()));
    }
    self.text = text.to_string();
    self.touch();
    Ok(())
  }

  pub fn set_status(&mut self, dimension: &str, value: &str) {
    self.statuses.insert(dimension.to_string(), value.to_string());
    self.touch();
  }

  /// Escribe varias dimensiones; las no mencionadas se conservan.
  pub fn set_statuses(&mut self, statuses: &BTreeMap<String, String>) {
    self.statuses.extend(statuses.iter().map(|(k, v)| (k.clone(), v.clone())));
    self.touch();
  }

  pub fn set_parent(&mut self, parent: Option<&str>) {
    self.parent = parent.map(String::from);
    self.touch();
  }

  pub fn touch(&mut self) {
    self.modified = Utc::now();
  }
}

impl fmt::Display for Item {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Item({}: {})", self.uid, self.text)
  }
}

/// Item con sus hijos anidados, tal como los guarda el formato de árbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
  pub item: Item,
  pub children: Vec<TreeNode>,
}

impl TreeNode {
  pub fn new(item: Item) -> Self {
    Self { item, children: Vec::new() }
  }

  /// Número de items del subárbol, incluido el propio nodo.
  pub fn size(&self) -> usize {
    1 + self.children.iter().map(|c| c.size()).sum::<usize>()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_text_is_rejected() {
    let mut item = Item::new(None);
    assert!(matches!(item.set_text("   "), Err(DomainError::ValidationError(_))));
    item.set_text("  buy milk ").unwrap();
    assert_eq!(item.text(), "buy milk");
  }

  #[test]
  fn legacy_status_reads_completion() {
    let mut item = Item::new(Some("p"));
    assert_eq!(item.legacy_status(), None);
    item.set_status("completion", "done");
    assert_eq!(item.legacy_status(), Some("done"));
    assert_eq!(item.parent(), Some("p"));
  }
}
