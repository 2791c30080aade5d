//! todo-domain: modelo de items y formas en disco
//!
//! Define el `Item` (texto, marca de modificación y mapa de estados), los
//! dos layouts de documento (plano con puntero al padre y árbol anidado),
//! la detección de layout y la migración de registros heredados.

mod document;
mod errors;
mod format;
mod item;
mod records;

pub use document::Document;
pub use errors::{DomainError, Result};
pub use format::DocumentFormat;
pub use item::{new_uid, Item, TreeNode, COMPLETION_DIMENSION};
// Re-export record shapes so persistence and tests can build raw documents
pub use records::{FlatDocument, FlatRecord, TreeDocument, TreeRecord};
