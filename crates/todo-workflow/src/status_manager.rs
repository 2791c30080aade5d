// Archivo: status_manager.rs
// Propósito: núcleo del motor de workflow. Lee y escribe estados validando
// dimensiones y transiciones, responde visibilidad por contexto (con
// caché), resuelve rutas relativas a un contexto y dispara las
// auto-transiciones tras cada escritura.
use crate::adapter::WorkflowStoreAdapter;
use crate::config::{AutoTrigger, StatusDimension, WorkflowConfig};
use crate::errors::{Result, WorkflowError};
use idm::{Registry, ROOT_SCOPE};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Contexto por defecto: sólo los items visibles en él reciben HID en la
/// línea de comandos.
pub const ACTIVE_CONTEXT: &str = "active";
/// Contexto convencional sin reglas.
pub const ALL_CONTEXT: &str = "all";

type VisibilityCache = HashMap<String, HashMap<String, bool>>;

/// Motor de estados sobre un `WorkflowStoreAdapter`.
///
/// Posee únicamente la configuración y la caché de visibilidad; todo lo que
/// reporta sale en vivo del adaptador.
///
/// Orden fijo dentro de `set_status`: validar -> escribir -> invalidar
/// caché -> hook posterior -> cascada propia -> cascada del padre.
pub struct StatusManager<A>
  where A: WorkflowStoreAdapter + ?Sized
{
  pub(crate) adapter: Arc<A>,
  pub(crate) config: WorkflowConfig,
  visibility_cache: Mutex<VisibilityCache>,
  /// UIDs con un `set_status` en curso (guarda de reentrada).
  in_flight: Mutex<HashSet<String>>,
}

/// Marca un UID como "en curso" mientras vive.
struct InFlight<'a> {
  set: &'a Mutex<HashSet<String>>,
  uid: String,
}

impl Drop for InFlight<'_> {
  fn drop(&mut self) {
    self.set.lock().unwrap_or_else(|e| e.into_inner()).remove(&self.uid);
  }
}

impl<A> StatusManager<A> where A: WorkflowStoreAdapter + ?Sized
{
  /// Valida la configuración y construye el motor. Los errores de
  /// configuración sólo pueden aparecer aquí.
  pub fn new(adapter: Arc<A>, config: WorkflowConfig) -> Result<Self> {
    config.validate()?;
    Ok(Self { adapter,
              config,
              visibility_cache: Mutex::new(HashMap::new()),
              in_flight: Mutex::new(HashSet::new()) })
  }

  pub fn config(&self) -> &WorkflowConfig {
    &self.config
  }

  pub fn adapter(&self) -> &Arc<A> {
    &self.adapter
  }

  /// Dimensión declarada o `UnknownDimension`.
  pub fn dimension(&self, name: &str) -> Result<&StatusDimension> {
    self.config
        .dimension(name)
        .ok_or_else(|| WorkflowError::UnknownDimension(name.to_string()))
  }

  fn checked_value(&self, dimension: &str, value: &str) -> Result<&StatusDimension> {
    let dim = self.dimension(dimension)?;
    if !dim.allows(value) {
      return Err(WorkflowError::InvalidValue { dimension: dimension.to_string(), value: value.to_string() });
    }
    Ok(dim)
  }

  // ---- get / set ----

  /// Valor de la dimensión; si el item no tiene valor se usa el default.
  pub fn get_status(&self, uid: &str, dimension: &str) -> Result<String> {
    let dim = self.dimension(dimension)?;
    match self.adapter.get_item_status(uid, dimension)? {
      Some(v) => Ok(v),
      None => dim.default_value
                 .clone()
                 .ok_or_else(|| WorkflowError::NoStatusValue { uid: uid.to_string(),
                                                               dimension: dimension.to_string() }),
    }
  }

  /// Estados efectivos de todas las dimensiones configuradas.
  pub fn get_statuses(&self, uid: &str) -> Result<BTreeMap<String, String>> {
    let stored = self.adapter.get_all_statuses(uid)?;
    let mut out = BTreeMap::new();
    for dim in &self.config.dimensions {
      if let Some(v) = stored.get(&dim.name).or(dim.default_value.as_ref()) {
        out.insert(dim.name.clone(), v.clone());
      }
    }
    Ok(out)
  }

  /// Escribe los defaults de las dimensiones que el item aún no tiene.
  /// No ejecuta hooks ni cascadas.
  pub fn initialize_defaults(&self, uid: &str) -> Result<()> {
    let missing = self.missing_defaults(uid, &BTreeMap::new())?;
    if !missing.is_empty() {
      self.adapter.set_statuses(uid, &missing)?;
      self.clear_visibility_cache();
    }
    Ok(())
  }

  fn missing_defaults(&self, uid: &str, writing: &BTreeMap<String, String>) -> Result<BTreeMap<String, String>> {
    let stored = self.adapter.get_all_statuses(uid)?;
    Ok(self.config
           .defaults()
           .into_iter()
           .filter(|(dim, _)| !stored.contains_key(dim) && !writing.contains_key(dim))
           .collect())
  }

  fn enter(&self, uid: &str) -> Option<InFlight<'_>> {
    let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
    if !set.insert(uid.to_string()) {
      return None;
    }
    Some(InFlight { set: &self.in_flight, uid: uid.to_string() })
  }

  /// Escribe un estado sin consultar las reglas de transición (sí valida
  /// dimensión, valor y el hook `validate_status_change`).
  ///
  /// Si `on_status_change` falla el cambio ya está aplicado y se devuelve
  /// `PostHookFailed`. Una reentrada para el mismo UID dentro de la misma
  /// pila de llamadas no tiene efecto.
  pub fn set_status(&self, uid: &str, dimension: &str, value: &str) -> Result<()> {
    self.checked_value(dimension, value)?;
    let Some(_guard) = self.enter(uid) else {
      log::debug!("workflow: ignoring re-entrant set_status on {}", uid);
      return Ok(());
    };

    let old = self.adapter.get_item_status(uid, dimension)?;
    self.adapter
        .validate_status_change(uid, dimension, old.as_deref(), value)
        .map_err(|reason| WorkflowError::ValidatorRejected { uid: uid.to_string(),
                                                             dimension: dimension.to_string(),
                                                             old: old.clone(),
                                                             new: value.to_string(),
                                                             reason })?;

    let mut writes = BTreeMap::from([(dimension.to_string(), value.to_string())]);
    let missing = self.missing_defaults(uid, &writes)?;
    if missing.is_empty() {
      self.adapter.set_item_status(uid, dimension, value)?;
    } else {
      writes.extend(missing);
      self.adapter.set_statuses(uid, &writes)?;
    }
    self.clear_visibility_cache();
    log::debug!("workflow: {} {} {:?} -> {}", uid, dimension, old, value);

    self.adapter
        .on_status_change(uid, dimension, old.as_deref(), value)
        .map_err(|reason| WorkflowError::PostHookFailed { uid: uid.to_string(),
                                                          dimension: dimension.to_string(),
                                                          old: old.clone(),
                                                          new: value.to_string(),
                                                          reason })?;

    self.cascade(uid)
  }

  /// Escribe varias dimensiones. Valida todas las entradas antes de tocar
  /// nada; los hooks posteriores sólo se invocan para las dimensiones cuyo
  /// valor cambió.
  pub fn set_multiple_statuses(&self, uid: &str, statuses: &BTreeMap<String, String>) -> Result<()> {
    for (dimension, value) in statuses {
      self.checked_value(dimension, value)?;
    }
    let Some(_guard) = self.enter(uid) else {
      log::debug!("workflow: ignoring re-entrant set_multiple_statuses on {}", uid);
      return Ok(());
    };

    let before = self.adapter.get_all_statuses(uid)?;
    let changed: Vec<(&String, &String)> =
      statuses.iter().filter(|(dim, value)| before.get(*dim) != Some(*value)).collect();
    for (dimension, value) in &changed {
      let old = before.get(*dimension).map(|s| s.as_str());
      self.adapter
          .validate_status_change(uid, dimension, old, value)
          .map_err(|reason| WorkflowError::ValidatorRejected { uid: uid.to_string(),
                                                               dimension: dimension.to_string(),
                                                               old: old.map(String::from),
                                                               new: value.to_string(),
                                                               reason })?;
    }

    let mut writes = statuses.clone();
    writes.extend(self.missing_defaults(uid, statuses)?);
    if !writes.is_empty() {
      self.adapter.set_statuses(uid, &writes)?;
    }
    self.clear_visibility_cache();

    for (dimension, value) in &changed {
      let old = before.get(*dimension).map(|s| s.as_str());
      self.adapter
          .on_status_change(uid, dimension, old, value)
          .map_err(|reason| WorkflowError::PostHookFailed { uid: uid.to_string(),
                                                            dimension: dimension.to_string(),
                                                            old: old.map(String::from),
                                                            new: value.to_string(),
                                                            reason })?;
    }

    self.cascade(uid)
  }

  /// Cascada propia y después la del padre (de abajo hacia arriba).
  fn cascade(&self, uid: &str) -> Result<()> {
    self.trigger_auto_transitions(&AutoTrigger::StatusChange, uid)?;
    let parent = self.adapter.get_parent(uid)?;
    if parent != ROOT_SCOPE {
      self.trigger_auto_transitions(&AutoTrigger::ChildStatusChange, &parent)?;
    }
    Ok(())
  }

  // ---- transiciones ----

  /// Comprueba que el cambio a `new_value` está permitido.
  ///
  /// Sin reglas para la dimensión todo está permitido. Con reglas, alguna
  /// regla con `from` igual al valor actual debe listar `new_value`; si esa
  /// regla tiene validador, su error se devuelve tal cual.
  pub fn can_transition(&self, uid: &str, dimension: &str, new_value: &str) -> Result<()> {
    self.checked_value(dimension, new_value)?;
    let current = self.get_status(uid, dimension)?;
    let rules = self.config.transition_rules(dimension);
    if rules.is_empty() {
      return Ok(());
    }
    let rule = rules.iter()
                    .find(|r| r.allows(&current, new_value))
                    .ok_or_else(|| WorkflowError::TransitionForbidden { from: current.clone(),
                                                                        to: new_value.to_string(),
                                                                        dimension: dimension.to_string() })?;
    if let Some(validator) = &rule.validator {
      validator(uid, &current, new_value)?;
    }
    Ok(())
  }

  /// `can_transition` seguido de `set_status`.
  pub fn transition(&self, uid: &str, dimension: &str, new_value: &str) -> Result<()> {
    self.can_transition(uid, dimension, new_value)?;
    self.set_status(uid, dimension, new_value)
  }

  /// Valores alcanzables desde el valor actual (todos si la dimensión no
  /// tiene reglas). No ejecuta validadores.
  pub fn allowed_transitions(&self, uid: &str, dimension: &str) -> Result<Vec<String>> {
    let dim = self.dimension(dimension)?;
    let current = self.get_status(uid, dimension)?;
    let rules = self.config.transition_rules(dimension);
    if rules.is_empty() {
      return Ok(dim.values.iter().filter(|v| **v != current).cloned().collect());
    }
    let mut out: Vec<String> = Vec::new();
    for rule in rules.iter().filter(|r| r.from == current) {
      for to in &rule.to {
        if !out.contains(to) {
          out.push(to.clone());
        }
      }
    }
    Ok(out)
  }

  // ---- visibilidad ----

  fn cache(&self) -> MutexGuard<'_, VisibilityCache> {
    self.visibility_cache.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Vacía la caché de visibilidad completa.
  pub fn clear_visibility_cache(&self) {
    self.cache().clear();
  }

  /// Resultado memoizado, si existe.
  pub fn cached_visibility(&self, uid: &str, context: &str) -> Option<bool> {
    self.cache().get(context).and_then(|m| m.get(uid)).copied()
  }

  /// Visibilidad del item en el contexto (memoizada por contexto y UID).
  pub fn is_visible_in_context(&self, uid: &str, context: &str) -> Result<bool> {
    if let Some(hit) = self.cached_visibility(uid, context) {
      return Ok(hit);
    }
    let filter = self.config.context_filter(context);
    let visible = if filter.is_unrestricted() {
      // still surface ItemNotFound for unknown uids
      self.adapter.get_parent(uid)?;
      true
    } else {
      filter.admits(&self.adapter.get_all_statuses(uid)?)
    };
    self.cache().entry(context.to_string()).or_default().insert(uid.to_string(), visible);
    Ok(visible)
  }

  /// Hijos de `parent` visibles en el contexto.
  pub fn get_children_in_context(&self, parent: &str, context: &str) -> Result<Vec<String>> {
    let filter = self.config.context_filter(context);
    if filter.is_unrestricted() {
      return Ok(self.adapter.get_children(parent)?);
    }
    Ok(self.adapter.get_children_in_context(parent, &filter)?)
  }

  /// Todos los items del documento visibles en el contexto.
  pub fn get_all_items_in_context(&self, context: &str) -> Result<Vec<String>> {
    Ok(self.adapter.get_all_items_in_context(&self.config.context_filter(context))?)
  }

  // ---- rutas por contexto ----

  /// Registro desechable cuyo listado de hijos es el del contexto.
  pub fn context_registry(&self, context: &str) -> Result<Registry> {
    let mut registry = Registry::new();
    for scope in self.adapter.get_scopes()? {
      let children = self.get_children_in_context(&scope, context)?;
      registry.set_scope(&scope, children);
    }
    Ok(registry)
  }

  /// Resuelve una ruta contando sólo los items visibles en el contexto.
  pub fn resolve_position_path_in_context(&self, start_scope: &str, path: &str, context: &str) -> Result<String> {
    let registry = self.context_registry(context)?;
    Ok(registry.resolve_position_path(start_scope, path)?)
  }

  /// Ruta del item relativa al contexto. Falla con `NotVisible` si el item
  /// no es visible en él.
  pub fn get_position_path_in_context(&self, start_scope: &str, uid: &str, context: &str) -> Result<String> {
    if !self.is_visible_in_context(uid, context)? {
      return Err(WorkflowError::NotVisible { uid: uid.to_string(), context: context.to_string() });
    }
    let registry = self.context_registry(context)?;
    Ok(registry.get_position_path(start_scope, uid, self.adapter.as_ref())?)
  }
}
