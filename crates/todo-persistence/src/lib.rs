//! Persistencia en fichero JSON para los documentos de tareas.
//! Expone los dos adaptadores de referencia (`FlatStore` y `TreeStore`),
//! ambos con el contrato completo del motor más las operaciones de
//! documento (`DocumentStore`), y las funciones de carga y guardado
//! atómico. `new_from_env` abre el documento configurado en el entorno.

mod config;
mod document_store;
mod errors;
pub mod file;
mod flat_store;
mod tree_store;

pub use config::{new_from_env, StoreConfig, DEFAULT_FILE, DEFAULT_WORKFLOW, ENV_FILE, ENV_FORMAT, ENV_WORKFLOW,
                 ENV_WORKFLOW_FILE};
pub use document_store::DocumentStore;
pub use errors::{Result, StoreError};
pub use file::{load_document, load_document_migrating, open, open_migrating, open_store, save_document, save_store};
pub use flat_store::FlatStore;
pub use tree_store::TreeStore;
