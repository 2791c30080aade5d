// Archivo: manager.rs
// Propósito: implementar `IdmManager`, capa orquestadora que muta a través
// del adaptador y después mantiene el `Registry` sincronizado
// reconstruyendo sólo los scopes afectados.
use crate::adapter::{ManagedStoreAdapter, LIFECYCLE_ACTIVE, LIFECYCLE_DELETED, ROOT_SCOPE};
use crate::errors::Result;
use crate::registry::Registry;
use std::sync::Arc;

/// Orquestador de identidades.
///
/// Responsabilidades:
/// - Construir el registro a partir de todos los scopes del adaptador.
/// - Delegar altas, movimientos y borrados en el adaptador.
/// - Reconstruir los scopes tocados para que los HIDs sigan siendo
///   canónicos (`1..n` sin huecos).
pub struct IdmManager<A>
    where A: ManagedStoreAdapter + ?Sized
{
    adapter: Arc<A>,
    registry: Registry,
}

impl<A> IdmManager<A> where A: ManagedStoreAdapter + ?Sized
{
    /// Crea el manager y reconstruye cada scope que reporta el adaptador.
    /// Devuelve el primer error encontrado.
    pub fn new(adapter: Arc<A>) -> Result<Self> {
        let registry = Registry::from_adapter(adapter.as_ref())?;
        Ok(Self { adapter, registry })
    }

    /// Registro actual (sólo lectura).
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Adaptador subyacente.
    pub fn adapter(&self) -> &Arc<A> {
        &self.adapter
    }

    /// Descarta el registro y lo reconstruye desde cero.
    pub fn refresh(&mut self) -> Result<()> {
        self.registry = Registry::from_adapter(self.adapter.as_ref())?;
        Ok(())
    }

    /// Alta de un item bajo `parent_scope`. Devuelve `(uid, hid)`.
    pub fn add(&mut self, parent_scope: &str) -> Result<(String, usize)> {
        let uid = self.adapter.add_item(parent_scope)?;
        let hid = self.registry.add(parent_scope, &uid);
        log::debug!("idm: added {} at {}#{}", uid, parent_scope, hid);
        Ok((uid, hid))
    }

    /// Mueve `uid` de `old_parent` a `new_parent` y reconstruye ambos scopes.
    pub fn move_item(&mut self, uid: &str, old_parent: &str, new_parent: &str) -> Result<()> {
        self.adapter.move_item(uid, new_parent)?;
        self.registry.rebuild_scope(self.adapter.as_ref(), old_parent)?;
        if old_parent != new_parent {
            self.registry.rebuild_scope(self.adapter.as_ref(), new_parent)?;
        }
        Ok(())
    }

    /// Borrado lógico: el item desaparece de la secuencia de `parent`.
    pub fn soft_delete(&mut self, uid: &str, parent: &str) -> Result<()> {
        self.adapter.set_status(uid, LIFECYCLE_DELETED)?;
        self.registry.rebuild_scope(self.adapter.as_ref(), parent)
    }

    /// Deshace un borrado lógico: el item reaparece en `parent`.
    pub fn restore(&mut self, uid: &str, parent: &str) -> Result<()> {
        self.adapter.set_status(uid, LIFECYCLE_ACTIVE)?;
        self.registry.rebuild_scope(self.adapter.as_ref(), parent)
    }

    /// Borrado permanente. Las secuencias activas no se tocan (el item ya
    /// no figuraba en ellas); sólo se descarta el scope propio del item.
    pub fn purge(&mut self, uid: &str) -> Result<()> {
        self.adapter.remove_item(uid)?;
        self.registry.remove_scope(uid);
        Ok(())
    }

    /// Resuelve una ruta desde la raíz.
    pub fn resolve(&self, path: &str) -> Result<String> {
        self.registry.resolve_position_path(ROOT_SCOPE, path)
    }

    /// Ruta de un UID desde la raíz.
    pub fn position_path(&self, uid: &str) -> Result<String> {
        self.registry.get_position_path(ROOT_SCOPE, uid, self.adapter.as_ref())
    }
}
