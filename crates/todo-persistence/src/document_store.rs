// Archivo: document_store.rs
// Propósito: operaciones a nivel de documento que necesita la línea de
// comandos además de los contratos del motor (texto, intercambio de
// hermanos, volcado para guardar).
use crate::errors::Result;
use idm::{is_root, LIFECYCLE_DELETED, LIFECYCLE_DIMENSION, ROOT_SCOPE};
use todo_domain::{Document, DocumentFormat, Item};
use todo_workflow::WorkflowStoreAdapter;

/// Adaptador respaldado por un documento completo en memoria.
pub trait DocumentStore: WorkflowStoreAdapter {
  /// Copia del item.
  fn item(&self, uid: &str) -> Result<Item>;

  /// Reemplaza el texto del item (no vacío) y refresca `modified`.
  fn set_text(&self, uid: &str, text: &str) -> Result<()>;

  /// Intercambia las posiciones de dos hermanos.
  fn swap(&self, uid_a: &str, uid_b: &str) -> Result<()>;

  /// Layout con el que se guardará el documento.
  fn format(&self) -> DocumentFormat;

  /// Instantánea completa del documento.
  fn to_document(&self) -> Result<Document>;

  fn to_json(&self) -> Result<String> {
    Ok(self.to_document()?.to_json_string()?)
  }
}

/// Política de listado: los items borrados de forma lógica no cuentan como
/// hijos.
pub(crate) fn is_live(item: &Item) -> bool {
  item.status(LIFECYCLE_DIMENSION) != Some(LIFECYCLE_DELETED)
}

/// Scope del registro para el puntero al padre de un item.
pub(crate) fn scope_of(parent: Option<&str>) -> String {
  parent.unwrap_or(ROOT_SCOPE).to_string()
}

/// Puntero al padre para un scope del registro.
pub(crate) fn parent_of_scope(scope: &str) -> Option<&str> {
  if is_root(scope) {
    None
  } else {
    Some(scope)
  }
}
