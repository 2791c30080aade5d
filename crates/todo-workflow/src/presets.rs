// Archivo: presets.rs
// Propósito: biblioteca de configuraciones listas para usar.
//
// Todas declaran un contexto `active` (el que numeran los comandos) y un
// contexto `all` sin reglas.
use crate::config::{AutoTransitionRule, StatusDimension, TransitionRule, VisibilityRule, WorkflowConfig};
use crate::status_manager::{ACTIVE_CONTEXT, ALL_CONTEXT};
use indexmap::IndexMap;
use once_cell::sync::Lazy;

/// Preset usado cuando no se indica otro.
pub const DEFAULT_PRESET: &str = "todo";

type Builder = fn() -> WorkflowConfig;

static PRESETS: Lazy<IndexMap<&'static str, Builder>> = Lazy::new(|| {
  let mut m: IndexMap<&'static str, Builder> = IndexMap::new();
  m.insert("todo", todo);
  m.insert("todo-priority", todo_priority);
  m.insert("cms", cms);
  m.insert("issues", issues);
  m.insert("kanban", kanban);
  m
});

/// Nombres disponibles, en orden de registro.
pub fn names() -> Vec<&'static str> {
  PRESETS.keys().copied().collect()
}

/// Configuración nueva del preset, o `None` si el nombre no existe.
pub fn by_name(name: &str) -> Option<WorkflowConfig> {
  PRESETS.get(name).map(|build| build())
}

/// Lista de tareas: `completion` pendiente/hecha y cierre del padre cuando
/// todos sus hijos están hechos.
pub fn todo() -> WorkflowConfig {
  WorkflowConfig::new(vec![StatusDimension::new("completion", &["pending", "done"]).with_default("pending")])
    .with_visibility_rule(VisibilityRule::new(ACTIVE_CONTEXT, "completion").include(&["pending"]))
    .with_visibility_rule(VisibilityRule::new("completed", "completion").include(&["done"]))
    .with_context(ALL_CONTEXT)
    .with_auto_transition(AutoTransitionRule::all_children_to("completion", "done", "done"))
}

/// `todo` más una dimensión de prioridad.
pub fn todo_priority() -> WorkflowConfig {
  let mut config = todo();
  config.dimensions
        .push(StatusDimension::new("priority", &["low", "medium", "high"]).with_default("medium"));
  config.with_visibility_rule(VisibilityRule::new("high_priority", "priority").include(&["high"]))
        .with_visibility_rule(VisibilityRule::new("high_priority", "completion").include(&["pending"]))
}

/// Publicación de contenidos: borrador -> revisión -> publicado -> archivado.
pub fn cms() -> WorkflowConfig {
  let dim = "publication";
  WorkflowConfig::new(vec![StatusDimension::new(dim, &["draft", "review", "published", "archived"]).with_default("draft")])
    .with_visibility_rule(VisibilityRule::new("public", dim).include(&["published"]))
    .with_visibility_rule(VisibilityRule::new(ACTIVE_CONTEXT, dim).exclude(&["archived"]))
    .with_context(ALL_CONTEXT)
    .with_transition(TransitionRule::new(dim, "draft", &["review"]))
    .with_transition(TransitionRule::new(dim, "review", &["draft", "published"]))
    .with_transition(TransitionRule::new(dim, "published", &["archived", "draft"]))
    .with_transition(TransitionRule::new(dim, "archived", &["draft"]))
}

/// Seguimiento de incidencias con estado y severidad.
pub fn issues() -> WorkflowConfig {
  let open = ["open", "in_progress"];
  WorkflowConfig::new(vec![StatusDimension::new("state", &["open", "in_progress", "resolved", "closed"]).with_default("open"),
                           StatusDimension::new("severity", &["low", "medium", "high", "critical"]).with_default("medium"),])
    .with_visibility_rule(VisibilityRule::new(ACTIVE_CONTEXT, "state").include(&open))
    .with_visibility_rule(VisibilityRule::new("critical", "severity").include(&["critical"]))
    .with_visibility_rule(VisibilityRule::new("critical", "state").include(&open))
    .with_context(ALL_CONTEXT)
    .with_transition(TransitionRule::new("state", "open", &["in_progress", "closed"]))
    .with_transition(TransitionRule::new("state", "in_progress", &["open", "resolved"]))
    .with_transition(TransitionRule::new("state", "resolved", &["closed", "open"]))
    .with_transition(TransitionRule::new("state", "closed", &["open"]))
    .with_auto_transition(AutoTransitionRule::all_children_to("state", "closed", "closed"))
}

/// Tablero por columnas.
pub fn kanban() -> WorkflowConfig {
  let dim = "column";
  WorkflowConfig::new(vec![StatusDimension::new(dim, &["backlog", "todo", "doing", "review", "done"]).with_default("backlog")])
    .with_visibility_rule(VisibilityRule::new(ACTIVE_CONTEXT, dim).exclude(&["done"]))
    .with_visibility_rule(VisibilityRule::new("board", dim).exclude(&["backlog", "done"]))
    .with_context(ALL_CONTEXT)
    .with_auto_transition(AutoTransitionRule::all_children_to(dim, "done", "done"))
}
