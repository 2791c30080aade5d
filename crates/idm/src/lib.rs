//! Crate `idm`: gestor de identidades para documentos jerárquicos
//!
//! Este crate traduce entre identificadores estables (UID) y posiciones
//! efímeras, legibles por humanos (HID, 1-based y relativas a su padre).
//! Define el contrato de acceso a datos `StoreAdapter` (y su extensión con
//! mutaciones `ManagedStoreAdapter`), el `Registry` en memoria que asigna
//! HIDs por scope y el orquestador `IdmManager` que mantiene el registro
//! sincronizado tras cada mutación. Incluye un adaptador en memoria
//! (`InMemoryStore`) útil para pruebas.
//!
//! Diseño resumido:
//! - El registro nunca reordena: el orden canónico lo dicta el adaptador.
//! - Las rutas (`1.2.3`) se resuelven scope a scope: cada HID se interpreta
//!   dentro del scope producido por el anterior.
//! - Tras mover o borrar, el manager reconstruye los scopes afectados en
//!   lugar de editar las secuencias a mano.
//!
//! Ejemplo rápido:
//! ```rust
//! use idm::stubs::InMemoryStore;
//! use idm::{IdmManager, ROOT_SCOPE};
//! use std::sync::Arc;
//! let store = Arc::new(InMemoryStore::new());
//! let mut idm = IdmManager::new(store).unwrap();
//! let (uid, hid) = idm.add(ROOT_SCOPE).unwrap();
//! assert_eq!(hid, 1);
//! assert_eq!(idm.resolve("1").unwrap(), uid);
//! ```
pub mod adapter;
pub mod errors;
pub mod manager;
pub mod registry;
pub mod structure;
pub mod stubs;

pub use adapter::*;
pub use errors::*;
pub use manager::*;
pub use registry::*;
pub use structure::*;
pub use stubs::*;
