// Archivo: registry.rs
// Propósito: mapa en memoria `scope -> secuencia ordenada de UIDs`. Cada
// secuencia es la asignación canónica de HIDs de ese scope (posición + 1).
use crate::adapter::{StoreAdapter, ROOT_SCOPE};
use crate::errors::{IdmError, Result};
use std::collections::HashMap;

/// Registro de scopes.
///
/// No posee items: sólo secuencias de UIDs. El orden es el que entrega el
/// adaptador; el registro nunca reordena.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    scopes: HashMap<String, Vec<String>>,
}

impl Registry {
    /// Crea un registro vacío.
    pub fn new() -> Self {
        Self { scopes: HashMap::new() }
    }

    /// Construye un registro con todos los scopes que reporta el adaptador.
    /// Propaga el primer error encontrado.
    pub fn from_adapter<A>(adapter: &A) -> Result<Self>
        where A: StoreAdapter + ?Sized
    {
        let mut registry = Self::new();
        for scope in adapter.get_scopes()? {
            registry.rebuild_scope(adapter, &scope)?;
        }
        Ok(registry)
    }

    /// Reemplaza la secuencia del scope por `adapter.get_children(scope)`.
    /// Idempotente; es la primitiva de recuperación.
    pub fn rebuild_scope<A>(&mut self, adapter: &A, scope: &str) -> Result<()>
        where A: StoreAdapter + ?Sized
    {
        let children = adapter.get_children(scope)?;
        log::debug!("registry: rebuild scope {} ({} items)", scope, children.len());
        self.set_scope(scope, children);
        Ok(())
    }

    /// Instala una secuencia ya calculada para el scope.
    pub fn set_scope(&mut self, scope: &str, uids: Vec<String>) {
        self.scopes.insert(scope.to_string(), uids);
    }

    /// Añade `uid` al final del scope y devuelve su HID.
    pub fn add(&mut self, scope: &str, uid: &str) -> usize {
        let seq = self.scopes.entry(scope.to_string()).or_default();
        seq.push(uid.to_string());
        seq.len()
    }

    /// Quita `uid` del scope conservando el orden relativo del resto.
    /// Quitar un UID ausente no tiene efecto.
    pub fn remove(&mut self, scope: &str, uid: &str) {
        if let Some(seq) = self.scopes.get_mut(scope) {
            seq.retain(|u| u != uid);
        }
    }

    /// Elimina el scope completo (p. ej. al purgar un subárbol).
    pub fn remove_scope(&mut self, scope: &str) {
        self.scopes.remove(scope);
    }

    /// Secuencia registrada para el scope, si existe.
    pub fn scope(&self, scope: &str) -> Option<&[String]> {
        self.scopes.get(scope).map(|v| v.as_slice())
    }

    /// Número de scopes registrados.
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// HID del UID dentro del scope, si está registrado.
    pub fn hid_of(&self, scope: &str, uid: &str) -> Option<usize> {
        self.scopes
            .get(scope)
            .and_then(|seq| seq.iter().position(|u| u == uid))
            .map(|idx| idx + 1)
    }

    /// Resuelve un HID (1-based) dentro del scope.
    pub fn resolve_hid(&self, scope: &str, hid: usize) -> Result<String> {
        let seq = self.scopes
                      .get(scope)
                      .ok_or_else(|| IdmError::ScopeNotFound(scope.to_string()))?;
        if hid == 0 || hid > seq.len() {
            return Err(IdmError::HidOutOfRange { scope: scope.to_string(),
                                                 hid,
                                                 len: seq.len() });
        }
        Ok(seq[hid - 1].clone())
    }

    /// Resuelve una ruta `a.b.c` a partir de `start_scope`.
    ///
    /// Cada componente debe ser un entero positivo (`InvalidPathSyntax`).
    /// Si algún HID no existe se devuelve `PathNotResolvable` con el prefijo
    /// de la ruta hasta el componente que falló.
    pub fn resolve_position_path(&self, start_scope: &str, path: &str) -> Result<String> {
        let hids = parse_position_path(path)?;
        let mut scope = start_scope.to_string();
        let mut resolved: Vec<String> = Vec::with_capacity(hids.len());
        for hid in hids {
            resolved.push(hid.to_string());
            let uid = self.resolve_hid(&scope, hid)
                          .map_err(|_| IdmError::PathNotResolvable { prefix: resolved.join(".") })?;
            scope = uid;
        }
        Ok(scope)
    }

    /// Inverso de `resolve_position_path`: sube desde `uid` hasta
    /// `start_scope` usando `adapter.get_parent` y recoge el HID de cada
    /// nivel en la secuencia registrada del padre.
    pub fn get_position_path<A>(&self, start_scope: &str, uid: &str, adapter: &A) -> Result<String>
        where A: StoreAdapter + ?Sized
    {
        let unreachable = || IdmError::UidNotReachable { uid: uid.to_string(),
                                                         scope: start_scope.to_string() };
        if uid == start_scope {
            return Err(unreachable());
        }

        let mut hids: Vec<usize> = Vec::new();
        let mut current = uid.to_string();
        // Cota: nunca hay más niveles que scopes registrados.
        for _ in 0..=self.scopes.len() {
            let parent = adapter.get_parent(&current)?;
            let hid = self.hid_of(&parent, &current).ok_or_else(unreachable)?;
            hids.push(hid);
            if parent == start_scope {
                hids.reverse();
                let parts: Vec<String> = hids.iter().map(|h| h.to_string()).collect();
                return Ok(parts.join("."));
            }
            if parent == ROOT_SCOPE {
                return Err(unreachable());
            }
            current = parent;
        }
        Err(unreachable())
    }

    /// Concatena las secuencias de los scopes indicados, en ese orden.
    /// Los scopes desconocidos se omiten.
    pub fn get_uids(&self, scopes: &[&str]) -> Vec<String> {
        scopes.iter()
              .filter_map(|s| self.scopes.get(*s))
              .flat_map(|seq| seq.iter().cloned())
              .collect()
    }
}

/// Divide una ruta en HIDs validando cada componente.
pub fn parse_position_path(path: &str) -> Result<Vec<usize>> {
    let trimmed = path.trim();
    let invalid = |reason: String| IdmError::InvalidPathSyntax { path: path.to_string(), reason };
    if trimmed.is_empty() {
        return Err(invalid("empty path".into()));
    }
    trimmed.split('.')
           .map(|part| match part.parse::<usize>() {
               Ok(0) => Err(invalid(format!("'{}' is not a positive position", part))),
               Ok(n) => Ok(n),
               Err(_) => Err(invalid(format!("'{}' is not a positive integer", part))),
           })
           .collect()
}
