// Archivo: stubs.rs
// Propósito: adaptador de workflow en memoria para pruebas. La estructura
// (padres, orden, borrado lógico) la lleva `idm::InMemoryStore`; aquí sólo
// se añade el mapa de estados por item. No es durable.
//
// Permite además simular los hooks del adaptador: vetar un valor concreto
// (`reject_changes_to`), hacer fallar el hook posterior (`fail_post_hook`)
// y consultar el registro de cambios notificados (`changes`).
use crate::adapter::WorkflowStoreAdapter;
use idm::{IdmError, InMemoryStore, ManagedStoreAdapter, Result, StoreAdapter, LIFECYCLE_DIMENSION};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

type Statuses = BTreeMap<String, String>;

/// Cambio observado por `on_status_change`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedChange {
  pub uid: String,
  pub dimension: String,
  pub old: Option<String>,
  pub new: String,
}

#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
  tree: InMemoryStore,
  statuses: Mutex<HashMap<String, Statuses>>,
  rejected: Mutex<Vec<(String, String)>>,
  fail_post_hook: AtomicBool,
  changes: Mutex<Vec<ObservedChange>>,
}

impl InMemoryWorkflowStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserta un item con UID conocido y sin estados.
  pub fn insert(&self, parent_scope: &str, uid: &str) -> Result<()> {
    self.tree.insert(parent_scope, uid)?;
    self.lock()?.insert(uid.to_string(), Statuses::new());
    Ok(())
  }

  /// Hace que `validate_status_change` vete cualquier cambio a ese valor.
  pub fn reject_changes_to(&self, dimension: &str, value: &str) {
    guard(&self.rejected).push((dimension.to_string(), value.to_string()));
  }

  pub fn fail_post_hook(&self, fail: bool) {
    self.fail_post_hook.store(fail, Ordering::SeqCst);
  }

  /// Cambios notificados a `on_status_change`, en orden.
  pub fn changes(&self) -> Vec<ObservedChange> {
    guard(&self.changes).clone()
  }

  fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Statuses>>> {
    self.statuses
        .lock()
        .map_err(|e| IdmError::Adapter(format!("mutex poisoned: {:?}", e)))
  }

  fn with_statuses<T>(&self, uid: &str, f: impl FnOnce(&mut Statuses) -> T) -> Result<T> {
    let mut all = self.lock()?;
    let statuses = all.get_mut(uid)
                      .ok_or_else(|| IdmError::ItemNotFound(uid.to_string()))?;
    Ok(f(statuses))
  }
}

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
  m.lock().unwrap_or_else(|e| e.into_inner())
}

impl StoreAdapter for InMemoryWorkflowStore {
  fn get_children(&self, scope: &str) -> Result<Vec<String>> {
    self.tree.get_children(scope)
  }

  fn get_scopes(&self) -> Result<Vec<String>> {
    self.tree.get_scopes()
  }

  fn get_all_uids(&self) -> Result<Vec<String>> {
    self.tree.get_all_uids()
  }

  fn get_parent(&self, uid: &str) -> Result<String> {
    self.tree.get_parent(uid)
  }
}

impl ManagedStoreAdapter for InMemoryWorkflowStore {
  fn add_item(&self, parent_scope: &str) -> Result<String> {
    let uid = Uuid::new_v4().to_string();
    self.insert(parent_scope, &uid)?;
    Ok(uid)
  }

  fn remove_item(&self, uid: &str) -> Result<()> {
    self.tree.remove_item(uid)?;
    let remaining = self.tree.get_all_uids()?;
    self.lock()?.retain(|k, _| remaining.contains(k));
    Ok(())
  }

  fn move_item(&self, uid: &str, new_parent_scope: &str) -> Result<()> {
    self.tree.move_item(uid, new_parent_scope)
  }

  /// El borrado lógico lo aplica la estructura; el valor también queda
  /// visible como dimensión `lifecycle`.
  fn set_status(&self, uid: &str, value: &str) -> Result<()> {
    self.tree.set_status(uid, value)?;
    self.with_statuses(uid, |s| {
          s.insert(LIFECYCLE_DIMENSION.to_string(), value.to_string());
        })
  }
}

impl WorkflowStoreAdapter for InMemoryWorkflowStore {
  fn get_item_status(&self, uid: &str, dimension: &str) -> Result<Option<String>> {
    self.with_statuses(uid, |s| s.get(dimension).cloned())
  }

  fn set_item_status(&self, uid: &str, dimension: &str, value: &str) -> Result<()> {
    self.with_statuses(uid, |s| {
          s.insert(dimension.to_string(), value.to_string());
        })
  }

  fn get_all_statuses(&self, uid: &str) -> Result<BTreeMap<String, String>> {
    self.with_statuses(uid, |s| s.clone())
  }

  fn set_statuses(&self, uid: &str, statuses: &BTreeMap<String, String>) -> Result<()> {
    self.with_statuses(uid, |s| s.extend(statuses.iter().map(|(k, v)| (k.clone(), v.clone()))))
  }

  fn validate_status_change(&self, _uid: &str, dimension: &str, _old: Option<&str>, new: &str)
                            -> std::result::Result<(), String> {
    if guard(&self.rejected).iter().any(|(d, v)| d == dimension && v == new) {
      return Err(format!("'{}' is locked for {}", new, dimension));
    }
    Ok(())
  }

  fn on_status_change(&self, uid: &str, dimension: &str, old: Option<&str>, new: &str)
                      -> std::result::Result<(), String> {
    guard(&self.changes).push(ObservedChange { uid: uid.to_string(),
                                               dimension: dimension.to_string(),
                                               old: old.map(String::from),
                                               new: new.to_string() });
    if self.fail_post_hook.load(Ordering::SeqCst) {
      return Err("post hook failure".into());
    }
    Ok(())
  }
}
