// Archivo: visibility.rs
// Propósito: semántica única de visibilidad por contexto, compartida por el
// `StatusManager` y por los listados contextuales de los adaptadores.
//
// Un contexto sin reglas admite todo. Con reglas, un item es visible sólo si
// TODAS las reglas del contexto coinciden (conjunción), evaluadas sobre sus
// estados efectivos: los valores guardados completados con los defaults de
// cada dimensión.
use crate::config::VisibilityRule;
use std::collections::BTreeMap;

/// Filtro de un contexto, autocontenido para poder entregarse al adaptador.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextFilter {
  context: String,
  rules: Vec<VisibilityRule>,
  defaults: BTreeMap<String, String>,
}

impl ContextFilter {
  pub fn new(context: &str, rules: Vec<VisibilityRule>, defaults: BTreeMap<String, String>) -> Self {
    Self { context: context.to_string(), rules, defaults }
  }

  pub fn context(&self) -> &str {
    &self.context
  }

  pub fn rules(&self) -> &[VisibilityRule] {
    &self.rules
  }

  /// `true` si el contexto no tiene reglas.
  pub fn is_unrestricted(&self) -> bool {
    self.rules.is_empty()
  }

  /// Estados guardados completados con los defaults.
  pub fn effective(&self, stored: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut out = self.defaults.clone();
    out.extend(stored.iter().map(|(k, v)| (k.clone(), v.clone())));
    out
  }

  /// Decide si un item con esos estados guardados es visible.
  pub fn admits(&self, stored: &BTreeMap<String, String>) -> bool {
    if self.is_unrestricted() {
      return true;
    }
    let statuses = self.effective(stored);
    self.rules.iter().all(|rule| rule.matches(&statuses))
  }
}
