// records.rs
//
// Forma en disco de los dos layouts. Los registros antiguos pueden traer un
// campo escalar `status` y ningún mapa `statuses`, o no traer UID: ambas
// cosas se corrigen al leer y el escalar nunca se vuelve a escribir.
use crate::item::{new_uid, Item, TreeNode, COMPLETION_DIMENSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn now() -> DateTime<Utc> {
  Utc::now()
}

/// Registro del layout plano. `parent` vacío significa nivel raíz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatRecord {
  #[serde(default)]
  pub uid: String,
  #[serde(default)]
  pub parent: String,
  #[serde(default)]
  pub text: String,
  #[serde(default = "now")]
  pub modified: DateTime<Utc>,
  #[serde(default)]
  pub statuses: BTreeMap<String, String>,
  #[serde(default, skip_serializing)]
  pub status: Option<String>,
}

/// Registro del layout de árbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeRecord {
  #[serde(default)]
  pub uid: String,
  #[serde(default)]
  pub text: String,
  #[serde(default = "now")]
  pub modified: DateTime<Utc>,
  #[serde(default)]
  pub statuses: BTreeMap<String, String>,
  #[serde(default, skip_serializing)]
  pub status: Option<String>,
  #[serde(default)]
  pub children: Vec<TreeRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlatDocument {
  pub items: Vec<FlatRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeDocument {
  pub todos: Vec<TreeRecord>,
}

/// Migra el escalar heredado a `completion` (sin pisar un valor existente).
fn migrate(mut statuses: BTreeMap<String, String>, legacy: Option<String>) -> BTreeMap<String, String> {
  if let Some(value) = legacy.filter(|v| !v.trim().is_empty()) {
    statuses.entry(COMPLETION_DIMENSION.to_string()).or_insert(value);
  }
  statuses
}

fn uid_or_new(uid: String) -> String {
  if uid.trim().is_empty() {
    new_uid()
  } else {
    uid
  }
}

impl FlatRecord {
  /// `true` si al leerlo hay que asignar UID o mover el escalar `status`.
  pub fn is_legacy(&self) -> bool {
    self.uid.trim().is_empty() || self.status.is_some()
  }

  pub fn into_item(self) -> Item {
    let parent = Some(self.parent.as_str()).filter(|p| !p.is_empty());
    Item::from_parts(&uid_or_new(self.uid.clone()),
                     parent,
                     &self.text,
                     self.modified,
                     migrate(self.statuses, self.status))
  }

  pub fn from_item(item: &Item) -> Self {
    Self { uid: item.uid().to_string(),
           parent: item.parent().unwrap_or_default().to_string(),
           text: item.text().to_string(),
           modified: item.modified(),
           statuses: item.statuses().clone(),
           status: None }
  }
}

impl TreeRecord {
  /// Como `FlatRecord::is_legacy`, para el registro o cualquier descendiente.
  pub fn is_legacy(&self) -> bool {
    self.uid.trim().is_empty() || self.status.is_some() || self.children.iter().any(TreeRecord::is_legacy)
  }

  /// Convierte el registro (y su subárbol) en nodos con punteros al padre.
  pub fn into_node(self, parent: Option<&str>) -> TreeNode {
    let uid = uid_or_new(self.uid);
    let item = Item::from_parts(&uid, parent, &self.text, self.modified, migrate(self.statuses, self.status));
    let children = self.children.into_iter().map(|c| c.into_node(Some(uid.as_str()))).collect();
    TreeNode { item, children }
  }

  pub fn from_node(node: &TreeNode) -> Self {
    Self { uid: node.item.uid().to_string(),
           text: node.item.text().to_string(),
           modified: node.item.modified(),
           statuses: node.item.statuses().clone(),
           status: None,
           children: node.children.iter().map(TreeRecord::from_node).collect() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn legacy_scalar_moves_into_completion() {
    let rec: FlatRecord = serde_json::from_value(json!({"uid": "a", "text": "x", "status": "done"})).unwrap();
    let item = rec.into_item();
    assert_eq!(item.status("completion"), Some("done"));
    assert_eq!(item.parent(), None);

    let back = serde_json::to_value(FlatRecord::from_item(&item)).unwrap();
    assert!(back.get("status").is_none());
    assert_eq!(back["statuses"]["completion"], "done");
  }

  #[test]
  fn explicit_map_wins_over_scalar() {
    let rec: TreeRecord =
      serde_json::from_value(json!({"text": "x", "status": "done", "statuses": {"completion": "pending"}})).unwrap();
    let node = rec.into_node(None);
    assert_eq!(node.item.status("completion"), Some("pending"));
    assert!(!node.item.uid().is_empty());
  }

  #[test]
  fn legacy_records_are_detected_at_any_depth() {
    let current: TreeRecord = serde_json::from_value(json!({"uid": "a", "statuses": {"completion": "done"}})).unwrap();
    assert!(!current.is_legacy());
    let nested: TreeRecord = serde_json::from_value(json!({"uid": "a", "children": [{"text": "no uid"}]})).unwrap();
    assert!(nested.is_legacy());
    let flat: FlatRecord = serde_json::from_value(json!({"uid": "b", "status": "pending"})).unwrap();
    assert!(flat.is_legacy());
  }
}
