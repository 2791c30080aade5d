// Archivo: adapter.rs
// Propósito: definir el contrato `StoreAdapter` (lecturas) y su extensión
// `ManagedStoreAdapter` (mutaciones). Es la única superficie a través de la
// cual el registro y el motor de workflow ven los datos; las
// implementaciones concretas (árbol de registros, lista plana, memoria)
// viven fuera de este módulo.
use crate::errors::Result;

/// Centinela del scope raíz.
pub const ROOT_SCOPE: &str = "root";

/// Dimensión heredada de un solo valor usada por el borrado lógico.
pub const LIFECYCLE_DIMENSION: &str = "lifecycle";
/// Valor de `LIFECYCLE_DIMENSION` para items visibles.
pub const LIFECYCLE_ACTIVE: &str = "active";
/// Valor de `LIFECYCLE_DIMENSION` para items borrados lógicamente.
pub const LIFECYCLE_DELETED: &str = "deleted";

/// `true` si `scope` es el centinela raíz.
pub fn is_root(scope: &str) -> bool {
    scope == ROOT_SCOPE
}

/// Contrato mínimo (sólo lectura) del almacenamiento.
///
/// `get_children` define la política de visibilidad del adaptador: sólo los
/// hijos que devuelve reciben HID. El orden devuelto es el orden canónico.
pub trait StoreAdapter: Send + Sync {
    /// Hijos del scope en orden canónico.
    fn get_children(&self, scope: &str) -> Result<Vec<String>>;

    /// El centinela raíz más cada UID con al menos un hijo.
    fn get_scopes(&self) -> Result<Vec<String>>;

    /// Todos los UIDs del documento.
    fn get_all_uids(&self) -> Result<Vec<String>>;

    /// Scope padre del UID (`ROOT_SCOPE` para items de primer nivel).
    /// Falla con `ItemNotFound` si el UID no existe.
    fn get_parent(&self, uid: &str) -> Result<String>;
}

/// Extensión con mutaciones.
///
/// Errores esperados: `ItemNotFound` si el UID no existe, `ParentNotFound`
/// si el scope destino no existe, `InvalidMove` para ciclos.
pub trait ManagedStoreAdapter: StoreAdapter {
    /// Crea un item al final de los hijos de `parent_scope` y devuelve su UID.
    fn add_item(&self, parent_scope: &str) -> Result<String>;

    /// Elimina el item (y su subárbol) de forma permanente.
    fn remove_item(&self, uid: &str) -> Result<()>;

    /// Re-asigna el padre del item. El item queda al final de los hijos del
    /// nuevo padre.
    fn move_item(&self, uid: &str, new_parent_scope: &str) -> Result<()>;

    /// Escribe la dimensión heredada `LIFECYCLE_DIMENSION`.
    fn set_status(&self, uid: &str, value: &str) -> Result<()>;
}
