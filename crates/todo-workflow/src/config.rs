// Archivo: config.rs
// Propósito: descripción declarativa del workflow (dimensiones de estado,
// reglas de visibilidad por contexto, reglas de transición por dimensión y
// reglas de auto-transición) y su validación.
use crate::errors::{Result, WorkflowError};
use crate::visibility::ContextFilter;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Eje de estado con un conjunto enumerado de valores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDimension {
  pub name: String,
  pub values: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_value: Option<String>,
}

impl StatusDimension {
  pub fn new(name: &str, values: &[&str]) -> Self {
    Self { name: name.to_string(), values: values.iter().map(|v| v.to_string()).collect(), default_value: None }
  }

  pub fn with_default(mut self, value: &str) -> Self {
    self.default_value = Some(value.to_string());
    self
  }

  /// `true` si `value` pertenece a la dimensión.
  pub fn allows(&self, value: &str) -> bool {
    self.values.iter().any(|v| v == value)
  }
}

/// Filtro de un contexto sobre una dimensión.
///
/// Coincide cuando el item tiene valor para la dimensión, el valor no está
/// en `exclude` y está en `include` (o `include` está vacío).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityRule {
  #[serde(default)]
  pub context: String,
  pub dimension: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub include: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub exclude: Vec<String>,
}

impl VisibilityRule {
  pub fn new(context: &str, dimension: &str) -> Self {
    Self { context: context.to_string(), dimension: dimension.to_string(), include: Vec::new(), exclude: Vec::new() }
  }

  pub fn include(mut self, values: &[&str]) -> Self {
    self.include.extend(values.iter().map(|v| v.to_string()));
    self
  }

  pub fn exclude(mut self, values: &[&str]) -> Self {
    self.exclude.extend(values.iter().map(|v| v.to_string()));
    self
  }

  /// Evalúa la regla contra un mapa `dimension -> valor`. Las exclusiones
  /// dominan a las inclusiones.
  pub fn matches(&self, statuses: &BTreeMap<String, String>) -> bool {
    let Some(value) = statuses.get(&self.dimension) else {
      return false;
    };
    if self.exclude.iter().any(|v| v == value) {
      return false;
    }
    self.include.is_empty() || self.include.iter().any(|v| v == value)
  }
}

/// Validador opcional de una regla de transición: recibe `(uid, from, to)`.
/// Su error se devuelve tal cual al llamador.
pub type TransitionValidator = Arc<dyn Fn(&str, &str, &str) -> Result<()> + Send + Sync>;

/// Cambio legal de valor dentro de una dimensión.
#[derive(Clone, Serialize, Deserialize)]
pub struct TransitionRule {
  #[serde(default)]
  pub dimension: String,
  pub from: String,
  pub to: Vec<String>,
  #[serde(skip)]
  pub validator: Option<TransitionValidator>,
}

impl TransitionRule {
  pub fn new(dimension: &str, from: &str, to: &[&str]) -> Self {
    Self { dimension: dimension.to_string(),
           from: from.to_string(),
           to: to.iter().map(|v| v.to_string()).collect(),
           validator: None }
  }

  pub fn with_validator<F>(mut self, f: F) -> Self
    where F: Fn(&str, &str, &str) -> Result<()> + Send + Sync + 'static
  {
    self.validator = Some(Arc::new(f));
    self
  }

  pub fn allows(&self, from: &str, to: &str) -> bool {
    self.from == from && self.to.iter().any(|v| v == to)
  }
}

impl fmt::Debug for TransitionRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TransitionRule")
     .field("dimension", &self.dimension)
     .field("from", &self.from)
     .field("to", &self.to)
     .field("validator", &self.validator.as_ref().map(|_| "<fn>"))
     .finish()
  }
}

/// Evento que dispara una auto-transición.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AutoTrigger {
  StatusChange,
  ChildStatusChange,
  Other(String),
}

/// Condición evaluada sobre el item (normalmente sobre sus hijos).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AutoCondition {
  AllChildrenStatusEquals,
  Other(String),
}

/// Acción aplicada cuando la condición se cumple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AutoAction {
  SetStatus,
  Other(String),
}

impl AutoTrigger {
  pub fn as_str(&self) -> &str {
    match self {
      AutoTrigger::StatusChange => "status_change",
      AutoTrigger::ChildStatusChange => "child_status_change",
      AutoTrigger::Other(s) => s,
    }
  }
}

impl AutoCondition {
  pub fn as_str(&self) -> &str {
    match self {
      AutoCondition::AllChildrenStatusEquals => "all_children_status_equals",
      AutoCondition::Other(s) => s,
    }
  }
}

impl AutoAction {
  pub fn as_str(&self) -> &str {
    match self {
      AutoAction::SetStatus => "set_status",
      AutoAction::Other(s) => s,
    }
  }
}

impl From<String> for AutoTrigger {
  fn from(s: String) -> Self {
    match s.as_str() {
      "status_change" => AutoTrigger::StatusChange,
      "child_status_change" => AutoTrigger::ChildStatusChange,
      _ => AutoTrigger::Other(s),
    }
  }
}

impl From<String> for AutoCondition {
  fn from(s: String) -> Self {
    match s.as_str() {
      "all_children_status_equals" => AutoCondition::AllChildrenStatusEquals,
      _ => AutoCondition::Other(s),
    }
  }
}

impl From<String> for AutoAction {
  fn from(s: String) -> Self {
    match s.as_str() {
      "set_status" => AutoAction::SetStatus,
      _ => AutoAction::Other(s),
    }
  }
}

impl From<AutoTrigger> for String {
  fn from(v: AutoTrigger) -> Self {
    v.as_str().to_string()
  }
}

impl From<AutoCondition> for String {
  fn from(v: AutoCondition) -> Self {
    v.as_str().to_string()
  }
}

impl From<AutoAction> for String {
  fn from(v: AutoAction) -> Self {
    v.as_str().to_string()
  }
}

/// Regla reactiva de propagación de estados.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoTransitionRule {
  pub trigger: AutoTrigger,
  pub condition: AutoCondition,
  #[serde(default)]
  pub condition_value: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub target_dimension: Option<String>,
  pub action: AutoAction,
  #[serde(default)]
  pub action_value: String,
}

impl AutoTransitionRule {
  /// "Cuando todos los hijos tienen `child_value` en `dimension`, poner el
  /// padre a `parent_value`."
  pub fn all_children_to(dimension: &str, child_value: &str, parent_value: &str) -> Self {
    Self { trigger: AutoTrigger::StatusChange,
           condition: AutoCondition::AllChildrenStatusEquals,
           condition_value: child_value.to_string(),
           target_dimension: Some(dimension.to_string()),
           action: AutoAction::SetStatus,
           action_value: parent_value.to_string() }
  }
}

/// Descripción completa de un workflow.
///
/// Se valida una sola vez al construir el `StatusManager`; a partir de ahí
/// se trata como inmutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
  pub dimensions: Vec<StatusDimension>,
  #[serde(default)]
  pub visibility: IndexMap<String, Vec<VisibilityRule>>,
  #[serde(default)]
  pub transitions: IndexMap<String, Vec<TransitionRule>>,
  #[serde(default)]
  pub auto_transitions: Vec<AutoTransitionRule>,
}

impl WorkflowConfig {
  pub fn new(dimensions: Vec<StatusDimension>) -> Self {
    Self { dimensions, ..Default::default() }
  }

  /// Declara un contexto (sin reglas todavía: todo es visible).
  pub fn with_context(mut self, context: &str) -> Self {
    self.visibility.entry(context.to_string()).or_default();
    self
  }

  pub fn with_visibility_rule(mut self, rule: VisibilityRule) -> Self {
    self.visibility.entry(rule.context.clone()).or_default().push(rule);
    self
  }

  pub fn with_transition(mut self, rule: TransitionRule) -> Self {
    self.transitions.entry(rule.dimension.clone()).or_default().push(rule);
    self
  }

  pub fn with_auto_transition(mut self, rule: AutoTransitionRule) -> Self {
    self.auto_transitions.push(rule);
    self
  }

  pub fn dimension(&self, name: &str) -> Option<&StatusDimension> {
    self.dimensions.iter().find(|d| d.name == name)
  }

  /// Contextos declarados, en orden de declaración.
  pub fn contexts(&self) -> Vec<&str> {
    self.visibility.keys().map(|k| k.as_str()).collect()
  }

  pub fn visibility_rules(&self, context: &str) -> &[VisibilityRule] {
    self.visibility.get(context).map(|v| v.as_slice()).unwrap_or(&[])
  }

  pub fn transition_rules(&self, dimension: &str) -> &[TransitionRule] {
    self.transitions.get(dimension).map(|v| v.as_slice()).unwrap_or(&[])
  }

  /// Mapa `dimension -> default` de las dimensiones que declaran default.
  pub fn defaults(&self) -> BTreeMap<String, String> {
    self.dimensions
        .iter()
        .filter_map(|d| d.default_value.as_ref().map(|v| (d.name.clone(), v.clone())))
        .collect()
  }

  /// Filtro listo para entregar al adaptador.
  pub fn context_filter(&self, context: &str) -> ContextFilter {
    ContextFilter::new(context, self.visibility_rules(context).to_vec(), self.defaults())
  }

  /// Nombres de trigger/condición/acción que el motor no conoce. Se cargan
  /// igualmente y se omiten en tiempo de ejecución.
  pub fn unknown_rule_names(&self) -> Vec<String> {
    let mut out = Vec::new();
    for rule in &self.auto_transitions {
      if let AutoTrigger::Other(s) = &rule.trigger {
        out.push(format!("trigger '{}'", s));
      }
      if let AutoCondition::Other(s) = &rule.condition {
        out.push(format!("condition '{}'", s));
      }
      if let AutoAction::Other(s) = &rule.action {
        out.push(format!("action '{}'", s));
      }
    }
    out
  }

  /// Completa `context`/`dimension` de las reglas a partir de la clave del
  /// mapa cuando vienen vacíos (formato serializado compacto).
  pub fn normalize(&mut self) {
    for (context, rules) in self.visibility.iter_mut() {
      for rule in rules.iter_mut().filter(|r| r.context.is_empty()) {
        rule.context = context.clone();
      }
    }
    for (dimension, rules) in self.transitions.iter_mut() {
      for rule in rules.iter_mut().filter(|r| r.dimension.is_empty()) {
        rule.dimension = dimension.clone();
      }
    }
  }

  /// Valida la configuración completa. Falla con `ConfigInvalid`.
  pub fn validate(&self) -> Result<()> {
    let invalid = |msg: String| Err(WorkflowError::ConfigInvalid(msg));

    let mut seen = HashSet::new();
    for dim in &self.dimensions {
      if dim.name.trim().is_empty() {
        return invalid("dimension name cannot be empty".into());
      }
      if !seen.insert(dim.name.as_str()) {
        return invalid(format!("duplicate dimension '{}'", dim.name));
      }
      if dim.values.is_empty() {
        return invalid(format!("dimension '{}' has no values", dim.name));
      }
      let mut values = HashSet::new();
      for v in &dim.values {
        if !values.insert(v.as_str()) {
          return invalid(format!("dimension '{}' lists value '{}' twice", dim.name, v));
        }
      }
      if let Some(default) = &dim.default_value {
        if !dim.allows(default) {
          return invalid(format!("default '{}' is not a value of dimension '{}'", default, dim.name));
        }
      }
    }

    for (context, rules) in &self.visibility {
      for rule in rules {
        if rule.context != *context {
          return invalid(format!("visibility rule for '{}' is filed under context '{}'", rule.context, context));
        }
        if self.dimension(&rule.dimension).is_none() {
          return invalid(format!("context '{}' references unknown dimension '{}'", context, rule.dimension));
        }
      }
    }

    for (dimension, rules) in &self.transitions {
      let Some(dim) = self.dimension(dimension) else {
        return invalid(format!("transition rules reference unknown dimension '{}'", dimension));
      };
      for rule in rules {
        if rule.dimension != *dimension {
          return invalid(format!("transition rule for '{}' is filed under dimension '{}'", rule.dimension, dimension));
        }
        if !dim.allows(&rule.from) {
          return invalid(format!("transition from unknown value '{}' in dimension '{}'", rule.from, dimension));
        }
        if let Some(bad) = rule.to.iter().find(|v| !dim.allows(v)) {
          return invalid(format!("transition to unknown value '{}' in dimension '{}'", bad, dimension));
        }
      }
    }

    for rule in &self.auto_transitions {
      let Some(target) = &rule.target_dimension else {
        continue;
      };
      let Some(dim) = self.dimension(target) else {
        return invalid(format!("auto-transition targets unknown dimension '{}'", target));
      };
      if rule.action == AutoAction::SetStatus && !dim.allows(&rule.action_value) {
        return invalid(format!("auto-transition sets unknown value '{}' on dimension '{}'", rule.action_value, target));
      }
    }

    for name in self.unknown_rule_names() {
      log::warn!("workflow: auto-transition uses unknown {}; the rule will be skipped", name);
    }
    Ok(())
  }

  /// Carga una configuración desde JSON, la normaliza y la valida.
  pub fn from_json_str(s: &str) -> Result<Self> {
    let mut config: WorkflowConfig =
      serde_json::from_str(s).map_err(|e| WorkflowError::ConfigInvalid(format!("cannot parse workflow: {}", e)))?;
    config.normalize();
    config.validate()?;
    Ok(config)
  }

  /// Igual que `from_json_str` leyendo de un fichero.
  pub fn from_path(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
                                              WorkflowError::ConfigInvalid(format!("cannot read {}: {}",
                                                                                   path.display(),
                                                                                   e))
                                            })?;
    Self::from_json_str(&raw)
  }
}
