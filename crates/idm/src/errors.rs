// Archivo: errors.rs
// Propósito: definir los errores del gestor de identidades y el alias
// Result<T> usado por las APIs del crate. Los mensajes están pensados para
// mostrarse tal cual en la línea de comandos.
use thiserror::Error;

/// Errores del gestor de identidades.
///
/// - Familia "no encontrado": `ItemNotFound`, `ScopeNotFound`,
///   `ParentNotFound`, `UidNotReachable`, `HidOutOfRange`,
///   `PathNotResolvable`.
/// - Familia de forma: `InvalidPathSyntax`, `InvalidMove`.
/// - `Adapter`: error opaco del almacenamiento, se propaga sin enmascarar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdmError {
    /// El UID referenciado no existe en el documento.
    #[error("item not found: {0}")]
    ItemNotFound(String),
    /// El scope no está registrado.
    #[error("scope not found: {0}")]
    ScopeNotFound(String),
    /// El nuevo padre de un alta o movimiento no existe.
    #[error("parent not found: {0}")]
    ParentNotFound(String),
    /// El UID no es descendiente del scope inicial.
    #[error("item {uid} is not reachable from scope '{scope}'")]
    UidNotReachable { uid: String, scope: String },
    /// HID fuera de `1..=len` dentro del scope.
    #[error("position {hid} is out of range in scope '{scope}' ({len} items)")]
    HidOutOfRange { scope: String, hid: usize, len: usize },
    /// Algún HID intermedio de la ruta no existe; `prefix` es la porción
    /// de la ruta resuelta hasta el fallo (incluido).
    #[error("no item found at position '{prefix}'")]
    PathNotResolvable { prefix: String },
    /// Componente de ruta vacío, no entero o no positivo.
    #[error("invalid position path '{path}': {reason}")]
    InvalidPathSyntax { path: String, reason: String },
    /// Movimiento que crearía un ciclo.
    #[error("cannot move {uid}: {reason}")]
    InvalidMove { uid: String, reason: String },
    /// Error del adaptador de almacenamiento.
    #[error("storage error: {0}")]
    Adapter(String),
}

impl IdmError {
    /// `true` para cualquier variante de la familia "no encontrado".
    pub fn is_not_found(&self) -> bool {
        matches!(self,
                 IdmError::ItemNotFound(_)
                 | IdmError::ScopeNotFound(_)
                 | IdmError::ParentNotFound(_)
                 | IdmError::UidNotReachable { .. }
                 | IdmError::HidOutOfRange { .. }
                 | IdmError::PathNotResolvable { .. })
    }

    /// Errores atribuibles a la entrada del usuario (todo salvo `Adapter`).
    pub fn is_user_error(&self) -> bool {
        !matches!(self, IdmError::Adapter(_))
    }
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, IdmError>;
