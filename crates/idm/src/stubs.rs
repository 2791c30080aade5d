// Archivo: stubs.rs
// Propósito: adaptador en memoria para pruebas y wiring rápido.
//
// Guarda los items en una lista plana con puntero al padre. No es durable.
use crate::adapter::{ManagedStoreAdapter, StoreAdapter, LIFECYCLE_DELETED, ROOT_SCOPE};
use crate::errors::{IdmError, Result};
use crate::structure::{check_move_target, subtree};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StubItem {
    uid: String,
    parent: String,
    lifecycle: Option<String>,
}

// Minimal in-memory adapter (flat list + parent pointer)
#[derive(Debug, Default)]
pub struct InMemoryStore {
    items: Mutex<Vec<StubItem>>,
}

impl InMemoryStore {
    /// Crea un adaptador vacío.
    pub fn new() -> Self {
        Self { items: Mutex::new(Vec::new()) }
    }

    /// Inserta un item con UID conocido (útil para escenarios de prueba
    /// deterministas). Falla si el padre no existe.
    pub fn insert(&self, parent_scope: &str, uid: &str) -> Result<()> {
        let mut items = self.lock()?;
        if parent_scope != ROOT_SCOPE && !items.iter().any(|i| i.uid == parent_scope) {
            return Err(IdmError::ParentNotFound(parent_scope.to_string()));
        }
        items.push(StubItem { uid: uid.to_string(),
                              parent: parent_scope.to_string(),
                              lifecycle: None });
        Ok(())
    }

    /// Valor heredado de ciclo de vida del item, si existe.
    pub fn lifecycle(&self, uid: &str) -> Result<Option<String>> {
        let items = self.lock()?;
        items.iter()
             .find(|i| i.uid == uid)
             .map(|i| i.lifecycle.clone())
             .ok_or_else(|| IdmError::ItemNotFound(uid.to_string()))
    }

    /// Helper para mapear `Mutex::lock()` en un `Result` con
    /// `IdmError::Adapter`.
    fn lock(&self) -> Result<MutexGuard<'_, Vec<StubItem>>> {
        self.items
            .lock()
            .map_err(|e| IdmError::Adapter(format!("mutex poisoned: {:?}", e)))
    }
}

fn is_visible(item: &StubItem) -> bool {
    item.lifecycle.as_deref() != Some(LIFECYCLE_DELETED)
}

impl StoreAdapter for InMemoryStore {
    fn get_children(&self, scope: &str) -> Result<Vec<String>> {
        let items = self.lock()?;
        if scope != ROOT_SCOPE && !items.iter().any(|i| i.uid == scope) {
            return Err(IdmError::ItemNotFound(scope.to_string()));
        }
        Ok(items.iter()
                .filter(|i| i.parent == scope && is_visible(i))
                .map(|i| i.uid.clone())
                .collect())
    }

    fn get_scopes(&self) -> Result<Vec<String>> {
        let items = self.lock()?;
        let mut scopes = vec![ROOT_SCOPE.to_string()];
        for item in items.iter() {
            if items.iter().any(|c| c.parent == item.uid && is_visible(c)) {
                scopes.push(item.uid.clone());
            }
        }
        Ok(scopes)
    }

    fn get_all_uids(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.iter().map(|i| i.uid.clone()).collect())
    }

    fn get_parent(&self, uid: &str) -> Result<String> {
        let items = self.lock()?;
        items.iter()
             .find(|i| i.uid == uid)
             .map(|i| i.parent.clone())
             .ok_or_else(|| IdmError::ItemNotFound(uid.to_string()))
    }
}

impl ManagedStoreAdapter for InMemoryStore {
    fn add_item(&self, parent_scope: &str) -> Result<String> {
        let uid = Uuid::new_v4().to_string();
        self.insert(parent_scope, &uid)?;
        Ok(uid)
    }

    /// Elimina el item y todos sus descendientes.
    fn remove_item(&self, uid: &str) -> Result<()> {
        let mut items = self.lock()?;
        if !items.iter().any(|i| i.uid == uid) {
            return Err(IdmError::ItemNotFound(uid.to_string()));
        }
        let doomed = subtree(uid, items.iter().map(|i| (i.uid.as_str(), i.parent.as_str())));
        items.retain(|i| !doomed.contains(&i.uid));
        Ok(())
    }

    fn move_item(&self, uid: &str, new_parent_scope: &str) -> Result<()> {
        let mut items = self.lock()?;
        let pos = items.iter()
                       .position(|i| i.uid == uid)
                       .ok_or_else(|| IdmError::ItemNotFound(uid.to_string()))?;
        check_move_target(uid, new_parent_scope, |scope| {
            items.iter().find(|i| i.uid == scope).map(|i| i.parent.clone())
        })?;
        let mut item = items.remove(pos);
        item.parent = new_parent_scope.to_string();
        items.push(item);
        Ok(())
    }

    fn set_status(&self, uid: &str, value: &str) -> Result<()> {
        let mut items = self.lock()?;
        let item = items.iter_mut()
                        .find(|i| i.uid == uid)
                        .ok_or_else(|| IdmError::ItemNotFound(uid.to_string()))?;
        item.lifecycle = Some(value.to_string());
        Ok(())
    }
}
