// Archivo: flat_store.rs
// Propósito: adaptador sobre el layout plano (lista de items con puntero al
// padre). Cada operación estructural es una actualización de puntero; el
// orden de hermanos es el orden en la lista.
use crate::document_store::{is_live, parent_of_scope, scope_of, DocumentStore};
use crate::errors::{Result, StoreError};
use idm::{check_move_target, is_root, subtree, IdmError, ManagedStoreAdapter, StoreAdapter, LIFECYCLE_DIMENSION, ROOT_SCOPE};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use todo_domain::{Document, DocumentFormat, Item};
use todo_workflow::WorkflowStoreAdapter;

#[derive(Debug, Default)]
pub struct FlatStore {
  items: Mutex<Vec<Item>>,
}

impl FlatStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_items(items: Vec<Item>) -> Self {
    Self { items: Mutex::new(items) }
  }

  fn lock(&self) -> idm::Result<MutexGuard<'_, Vec<Item>>> {
    self.items
        .lock()
        .map_err(|e| IdmError::Adapter(format!("mutex poisoned: {:?}", e)))
  }

  fn with_item<T>(&self, uid: &str, f: impl FnOnce(&mut Item) -> T) -> idm::Result<T> {
    let mut items = self.lock()?;
    let item = items.iter_mut()
                    .find(|i| i.uid() == uid)
                    .ok_or_else(|| IdmError::ItemNotFound(uid.to_string()))?;
    Ok(f(item))
  }
}

fn exists(items: &[Item], uid: &str) -> bool {
  items.iter().any(|i| i.uid() == uid)
}

impl StoreAdapter for FlatStore {
  fn get_children(&self, scope: &str) -> idm::Result<Vec<String>> {
    let items = self.lock()?;
    if !is_root(scope) && !exists(&items, scope) {
      return Err(IdmError::ItemNotFound(scope.to_string()));
    }
    let parent = parent_of_scope(scope);
    Ok(items.iter()
            .filter(|i| i.parent() == parent && is_live(i))
            .map(|i| i.uid().to_string())
            .collect())
  }

  fn get_scopes(&self) -> idm::Result<Vec<String>> {
    let items = self.lock()?;
    let mut scopes = vec![ROOT_SCOPE.to_string()];
    scopes.extend(items.iter()
                       .filter(|p| items.iter().any(|c| c.parent() == Some(p.uid()) && is_live(c)))
                       .map(|p| p.uid().to_string()));
    Ok(scopes)
  }

  fn get_all_uids(&self) -> idm::Result<Vec<String>> {
    Ok(self.lock()?.iter().map(|i| i.uid().to_string()).collect())
  }

  fn get_parent(&self, uid: &str) -> idm::Result<String> {
    self.with_item(uid, |i| scope_of(i.parent()))
  }
}

impl ManagedStoreAdapter for FlatStore {
  fn add_item(&self, parent_scope: &str) -> idm::Result<String> {
    let mut items = self.lock()?;
    if !is_root(parent_scope) && !exists(&items, parent_scope) {
      return Err(IdmError::ParentNotFound(parent_scope.to_string()));
    }
    let item = Item::new(parent_of_scope(parent_scope));
    let uid = item.uid().to_string();
    items.push(item);
    log::debug!("flat store: added {} under {}", uid, parent_scope);
    Ok(uid)
  }

  fn remove_item(&self, uid: &str) -> idm::Result<()> {
    let mut items = self.lock()?;
    if !exists(&items, uid) {
      return Err(IdmError::ItemNotFound(uid.to_string()));
    }
    let doomed = subtree(uid, items.iter().map(|i| (i.uid(), i.parent().unwrap_or(ROOT_SCOPE))));
    items.retain(|i| !doomed.iter().any(|d| d == i.uid()));
    log::debug!("flat store: removed {} ({} items)", uid, doomed.len());
    Ok(())
  }

  fn move_item(&self, uid: &str, new_parent_scope: &str) -> idm::Result<()> {
    let mut items = self.lock()?;
    let pos = items.iter()
                   .position(|i| i.uid() == uid)
                   .ok_or_else(|| IdmError::ItemNotFound(uid.to_string()))?;
    check_move_target(uid, new_parent_scope, |scope| {
      items.iter().find(|i| i.uid() == scope).map(|i| scope_of(i.parent()))
    })?;
    let mut item = items.remove(pos);
    item.set_parent(parent_of_scope(new_parent_scope));
    items.push(item);
    Ok(())
  }

  fn set_status(&self, uid: &str, value: &str) -> idm::Result<()> {
    self.set_item_status(uid, LIFECYCLE_DIMENSION, value)
  }
}

impl WorkflowStoreAdapter for FlatStore {
  fn get_item_status(&self, uid: &str, dimension: &str) -> idm::Result<Option<String>> {
    self.with_item(uid, |i| i.status(dimension).map(String::from))
  }

  fn set_item_status(&self, uid: &str, dimension: &str, value: &str) -> idm::Result<()> {
    self.with_item(uid, |i| i.set_status(dimension, value))
  }

  fn get_all_statuses(&self, uid: &str) -> idm::Result<BTreeMap<String, String>> {
    self.with_item(uid, |i| i.statuses().clone())
  }

  fn set_statuses(&self, uid: &str, statuses: &BTreeMap<String, String>) -> idm::Result<()> {
    self.with_item(uid, |i| i.set_statuses(statuses))
  }
}

impl DocumentStore for FlatStore {
  fn item(&self, uid: &str) -> Result<Item> {
    Ok(self.with_item(uid, |i| i.clone())?)
  }

  fn set_text(&self, uid: &str, text: &str) -> Result<()> {
    self.with_item(uid, |i| i.set_text(text))??;
    Ok(())
  }

  fn swap(&self, uid_a: &str, uid_b: &str) -> Result<()> {
    let mut items = self.lock()?;
    let find = |uid: &str| {
      items.iter()
           .position(|i| i.uid() == uid)
           .ok_or_else(|| StoreError::Idm(IdmError::ItemNotFound(uid.to_string())))
    };
    let (a, b) = (find(uid_a)?, find(uid_b)?);
    if items[a].parent() != items[b].parent() {
      return Err(IdmError::InvalidMove { uid: uid_b.to_string(),
                                         reason: format!("{} and {} are not siblings", uid_a, uid_b) }.into());
    }
    items.swap(a, b);
    Ok(())
  }

  fn format(&self) -> DocumentFormat {
    DocumentFormat::Flat
  }

  fn to_document(&self) -> Result<Document> {
    Ok(Document::Flat(self.lock()?.clone()))
  }
}
