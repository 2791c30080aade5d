// document.rs
use crate::errors::{DomainError, Result};
use crate::format::DocumentFormat;
use crate::item::{Item, TreeNode};
use crate::records::{FlatDocument, FlatRecord, TreeDocument, TreeRecord};
use serde_json::Value;
use std::collections::HashSet;

/// Documento completo en memoria, en el layout con el que se leyó.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
  /// Items en orden de documento con puntero al padre.
  Flat(Vec<Item>),
  /// Bosque de nodos anidados.
  Tree(Vec<TreeNode>),
}

impl Document {
  pub fn empty(format: DocumentFormat) -> Self {
    match format {
      DocumentFormat::Flat => Document::Flat(Vec::new()),
      DocumentFormat::Tree => Document::Tree(Vec::new()),
    }
  }

  pub fn format(&self) -> DocumentFormat {
    match self {
      Document::Flat(_) => DocumentFormat::Flat,
      Document::Tree(_) => DocumentFormat::Tree,
    }
  }

  pub fn from_json_str(s: &str) -> Result<Self> {
    Ok(Self::from_json_str_migrating(s)?.0)
  }

  pub fn from_json_str_migrating(s: &str) -> Result<(Self, bool)> {
    let value: Value = serde_json::from_str(s)?;
    Self::from_value_migrating(value)
  }

  /// Interpreta un JSON ya parseado detectando el layout, migra los
  /// registros heredados y valida la estructura.
  pub fn from_value(value: Value) -> Result<Self> {
    Ok(Self::from_value_migrating(value)?.0)
  }

  /// Igual que `from_value`, indicando además si hubo que migrar algo
  /// (UIDs asignados, escalar `status`, array de árbol sin envoltorio). Un
  /// documento migrado debe guardarse para que los UIDs asignados persistan.
  pub fn from_value_migrating(value: Value) -> Result<(Self, bool)> {
    let (doc, migrated) = match DocumentFormat::detect(&value)? {
      DocumentFormat::Flat => {
        let flat: FlatDocument = serde_json::from_value(value)?;
        let migrated = flat.items.iter().any(FlatRecord::is_legacy);
        (Document::Flat(flat.items.into_iter().map(FlatRecord::into_item).collect()), migrated)
      }
      DocumentFormat::Tree => {
        let (records, bare): (Vec<TreeRecord>, bool) = match value {
          Value::Array(_) => (serde_json::from_value(value)?, true),
          other => (serde_json::from_value::<TreeDocument>(other)?.todos, false),
        };
        let migrated = bare || records.iter().any(TreeRecord::is_legacy);
        (Document::Tree(records.into_iter().map(|r| r.into_node(None)).collect()), migrated)
      }
    };
    doc.validate()?;
    Ok((doc, migrated))
  }

  pub fn to_value(&self) -> Result<Value> {
    let value = match self {
      Document::Flat(items) => {
        serde_json::to_value(FlatDocument { items: items.iter().map(FlatRecord::from_item).collect() })?
      }
      Document::Tree(nodes) => {
        serde_json::to_value(TreeDocument { todos: nodes.iter().map(TreeRecord::from_node).collect() })?
      }
    };
    Ok(value)
  }

  pub fn to_json_string(&self) -> Result<String> {
    Ok(serde_json::to_string_pretty(&self.to_value()?)?)
  }

  /// Todos los items en orden de documento (preorden en el árbol).
  pub fn items(&self) -> Vec<Item> {
    fn walk(nodes: &[TreeNode], out: &mut Vec<Item>) {
      for node in nodes {
        out.push(node.item.clone());
        walk(&node.children, out);
      }
    }
    match self {
      Document::Flat(items) => items.clone(),
      Document::Tree(nodes) => {
        let mut out = Vec::new();
        walk(nodes, &mut out);
        out
      }
    }
  }

  pub fn len(&self) -> usize {
    match self {
      Document::Flat(items) => items.len(),
      Document::Tree(nodes) => nodes.iter().map(|n| n.size()).sum(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// UIDs únicos y, en el layout plano, padres existentes y sin ciclos.
  pub fn validate(&self) -> Result<()> {
    let items = self.items();
    let mut seen = HashSet::new();
    for item in &items {
      if !seen.insert(item.uid()) {
        return Err(DomainError::ValidationError(format!("duplicate uid '{}'", item.uid())));
      }
    }
    if let Document::Flat(_) = self {
      for item in &items {
        let mut cursor = item.parent();
        let mut steps = 0;
        while let Some(parent) = cursor {
          if !seen.contains(parent) {
            return Err(DomainError::ValidationError(format!("item '{}' points to missing parent '{}'",
                                                            item.uid(),
                                                            parent)));
          }
          steps += 1;
          if steps > items.len() {
            return Err(DomainError::ValidationError(format!("parent cycle through '{}'", item.uid())));
          }
          cursor = items.iter().find(|i| i.uid() == parent).and_then(|i| i.parent());
        }
      }
    }
    Ok(())
  }
}
