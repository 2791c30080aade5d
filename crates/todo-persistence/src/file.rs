// Archivo: file.rs
// Propósito: carga y guardado del documento JSON y apertura del adaptador
// que corresponde a su layout.
use crate::document_store::DocumentStore;
use crate::errors::Result;
use crate::flat_store::FlatStore;
use crate::tree_store::TreeStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use todo_domain::{Document, DocumentFormat};

/// Lee el documento. Si el fichero no existe (o está vacío) se devuelve un
/// documento vacío con el layout indicado.
pub fn load_document(path: &Path, default_format: DocumentFormat) -> Result<Document> {
  Ok(load_document_migrating(path, default_format)?.0)
}

/// `load_document` indicando si el contenido leído se migró desde un
/// formato heredado.
pub fn load_document_migrating(path: &Path, default_format: DocumentFormat) -> Result<(Document, bool)> {
  if !path.exists() {
    log::info!("store: {} does not exist yet, starting an empty {} document", path.display(), default_format);
    return Ok((Document::empty(default_format), false));
  }
  let raw = std::fs::read_to_string(path)?;
  if raw.trim().is_empty() {
    return Ok((Document::empty(default_format), false));
  }
  let (doc, migrated) = Document::from_json_str_migrating(&raw)?;
  if migrated {
    log::info!("store: {} uses a legacy layout, it will be rewritten on save", path.display());
  }
  log::debug!("store: loaded {} items ({}) from {}", doc.len(), doc.format(), path.display());
  Ok((doc, migrated))
}

fn tmp_path(path: &Path) -> PathBuf {
  let mut tmp = path.as_os_str().to_owned();
  tmp.push(".tmp");
  PathBuf::from(tmp)
}

/// Escribe el documento completo en `<path>.tmp` y lo renombra sobre el
/// destino. Crea los directorios que falten.
pub fn save_document(path: &Path, doc: &Document) -> Result<()> {
  if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
    std::fs::create_dir_all(dir)?;
  }
  let json = doc.to_json_string()?;
  let tmp = tmp_path(path);
  std::fs::write(&tmp, json)?;
  std::fs::rename(&tmp, path)?;
  log::debug!("store: saved {} items to {}", doc.len(), path.display());
  Ok(())
}

/// Adaptador en memoria para el layout del documento.
pub fn open_store(doc: Document) -> Arc<dyn DocumentStore> {
  match doc {
    Document::Flat(items) => Arc::new(FlatStore::from_items(items)),
    Document::Tree(roots) => Arc::new(TreeStore::from_nodes(roots)),
  }
}

/// `load_document` + `open_store`.
pub fn open(path: &Path, default_format: DocumentFormat) -> Result<Arc<dyn DocumentStore>> {
  Ok(open_migrating(path, default_format)?.0)
}

/// `open` indicando si el documento se migró al leerlo.
pub fn open_migrating(path: &Path, default_format: DocumentFormat) -> Result<(Arc<dyn DocumentStore>, bool)> {
  let (doc, migrated) = load_document_migrating(path, default_format)?;
  Ok((open_store(doc), migrated))
}

/// Guarda el estado actual del adaptador conservando su layout.
pub fn save_store(path: &Path, store: &dyn DocumentStore) -> Result<()> {
  save_document(path, &store.to_document()?)
}
