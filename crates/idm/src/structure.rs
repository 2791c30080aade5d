// Archivo: structure.rs
// Propósito: reglas estructurales comunes a los adaptadores de lista plana
// con puntero al padre (el stub en memoria, el de workflow y el almacén
// plano): subárbol afectado por un borrado y validación del destino de un
// movimiento.
use crate::adapter::is_root;
use crate::errors::{IdmError, Result};

/// `uid` seguido de todos sus descendientes, en anchura.
///
/// `links` enumera pares `(uid, scope del padre)` de todo el documento.
pub fn subtree<'a, I>(uid: &str, links: I) -> Vec<String>
    where I: IntoIterator<Item = (&'a str, &'a str)>
{
    let links: Vec<(&str, &str)> = links.into_iter().collect();
    let mut out = vec![uid.to_string()];
    let mut idx = 0;
    while idx < out.len() {
        let current = out[idx].clone();
        idx += 1;
        out.extend(links.iter()
                        .filter(|(_, parent)| *parent == current)
                        .map(|(child, _)| child.to_string()));
    }
    out
}

/// Valida que `new_parent_scope` existe y no es `uid` ni un descendiente
/// suyo. `parent_of` devuelve el scope del padre, o `None` si el UID no
/// existe.
pub fn check_move_target<F>(uid: &str, new_parent_scope: &str, parent_of: F) -> Result<()>
    where F: Fn(&str) -> Option<String>
{
    let mut cursor = new_parent_scope.to_string();
    while !is_root(&cursor) {
        if cursor == uid {
            return Err(IdmError::InvalidMove { uid: uid.to_string(),
                                               reason: "target is the item itself or one of its descendants".into() });
        }
        cursor = parent_of(&cursor).ok_or_else(|| IdmError::ParentNotFound(new_parent_scope.to_string()))?;
    }
    Ok(())
}
