// Archivo: adapter.rs
// Propósito: extensión de `idm::ManagedStoreAdapter` con E/S de estados por
// dimensión, variantes en bloque, listados por contexto y los dos hooks de
// ciclo de vida de un cambio de estado.
use crate::visibility::ContextFilter;
use idm::ManagedStoreAdapter;
use std::collections::BTreeMap;

/// Contrato de almacenamiento que necesita el motor de workflow.
///
/// Los métodos con implementación por defecto sólo usan el contrato base;
/// un adaptador puede sobreescribirlos si tiene un camino más directo, pero
/// debe respetar la semántica de `ContextFilter::admits`.
pub trait WorkflowStoreAdapter: ManagedStoreAdapter {
  /// Valor guardado de la dimensión (sin aplicar defaults).
  fn get_item_status(&self, uid: &str, dimension: &str) -> idm::Result<Option<String>>;

  /// Escribe un valor en una dimensión.
  fn set_item_status(&self, uid: &str, dimension: &str, value: &str) -> idm::Result<()>;

  /// Mapa completo de estados guardados del item.
  fn get_all_statuses(&self, uid: &str) -> idm::Result<BTreeMap<String, String>>;

  /// Escribe varias dimensiones de una vez (las no mencionadas se conservan).
  fn set_statuses(&self, uid: &str, statuses: &BTreeMap<String, String>) -> idm::Result<()>;

  /// Items cuyo valor guardado en `dimension` es `value`.
  fn get_items_by_status(&self, dimension: &str, value: &str) -> idm::Result<Vec<String>> {
    let mut out = Vec::new();
    for uid in self.get_all_uids()? {
      match self.get_item_status(&uid, dimension) {
        Ok(Some(v)) if v == value => out.push(uid),
        Ok(_) => {}
        Err(e) => log::warn!("workflow: skipping {} while scanning '{}': {}", uid, dimension, e),
      }
    }
    Ok(out)
  }

  /// Hijos de `parent` visibles según el filtro. Un hijo cuyo estado no se
  /// puede leer se omite (y se registra) para no ocultar al resto.
  fn get_children_in_context(&self, parent: &str, filter: &ContextFilter) -> idm::Result<Vec<String>> {
    let children = self.get_children(parent)?;
    if filter.is_unrestricted() {
      return Ok(children);
    }
    Ok(retain_admitted(self, children, filter))
  }

  /// Todos los items del documento visibles según el filtro.
  fn get_all_items_in_context(&self, filter: &ContextFilter) -> idm::Result<Vec<String>> {
    let all = self.get_all_uids()?;
    if filter.is_unrestricted() {
      return Ok(all);
    }
    Ok(retain_admitted(self, all, filter))
  }

  /// Hook posterior a la escritura. No debe mutar el estado de workflow de
  /// otros items.
  fn on_status_change(&self, _uid: &str, _dimension: &str, _old: Option<&str>, _new: &str)
                      -> std::result::Result<(), String> {
    Ok(())
  }

  /// Veto previo a la escritura.
  fn validate_status_change(&self, _uid: &str, _dimension: &str, _old: Option<&str>, _new: &str)
                            -> std::result::Result<(), String> {
    Ok(())
  }
}

fn retain_admitted<A>(adapter: &A, uids: Vec<String>, filter: &ContextFilter) -> Vec<String>
  where A: WorkflowStoreAdapter + ?Sized
{
  uids.into_iter()
      .filter(|uid| match adapter.get_all_statuses(uid) {
        Ok(statuses) => filter.admits(&statuses),
        Err(e) => {
          log::warn!("workflow: dropping {} from context '{}': {}", uid, filter.context(), e);
          false
        }
      })
      .collect()
}
