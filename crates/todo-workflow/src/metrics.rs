// Archivo: metrics.rs
// Propósito: conteos agregados de un subárbol por dimensión/valor y por
// contexto. Todo se calcula en vivo contra el adaptador.
use crate::adapter::WorkflowStoreAdapter;
use crate::errors::Result;
use crate::status_manager::StatusManager;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Resultado de `StatusManager::get_metrics`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowMetrics {
  pub scope: String,
  pub total_items: usize,
  /// `dimension -> valor -> cantidad`, sobre estados efectivos.
  pub by_dimension: BTreeMap<String, BTreeMap<String, usize>>,
  /// Items del subárbol visibles en cada contexto declarado.
  pub by_context: BTreeMap<String, usize>,
}

impl<A> StatusManager<A> where A: WorkflowStoreAdapter + ?Sized
{
  /// Métricas de todos los descendientes de `scope` (sin incluirlo).
  ///
  /// Sólo el listado de `scope` propaga errores; los fallos en niveles más
  /// profundos se registran y esa rama se omite.
  pub fn get_metrics(&self, scope: &str) -> Result<WorkflowMetrics> {
    let mut visited: Vec<String> = Vec::new();
    let mut pending = self.adapter.get_children(scope)?;
    while let Some(uid) = pending.pop() {
      match self.adapter.get_children(&uid) {
        Ok(children) => pending.extend(children),
        Err(e) => log::warn!("workflow: metrics skips children of {}: {}", uid, e),
      }
      visited.push(uid);
    }

    let mut metrics = WorkflowMetrics { scope: scope.to_string(),
                                        total_items: visited.len(),
                                        ..Default::default() };
    for dim in &self.config.dimensions {
      let counts = metrics.by_dimension.entry(dim.name.clone()).or_default();
      for value in &dim.values {
        counts.insert(value.clone(), 0);
      }
    }
    for uid in &visited {
      let statuses = match self.get_statuses(uid) {
        Ok(s) => s,
        Err(e) => {
          log::warn!("workflow: metrics skips statuses of {}: {}", uid, e);
          continue;
        }
      };
      for (dim, value) in statuses {
        *metrics.by_dimension.entry(dim).or_default().entry(value).or_insert(0) += 1;
      }
    }

    let subtree: HashSet<&str> = visited.iter().map(|s| s.as_str()).collect();
    for context in self.config.contexts() {
      let visible = self.get_all_items_in_context(context)?;
      let count = visible.iter().filter(|uid| subtree.contains(uid.as_str())).count();
      metrics.by_context.insert(context.to_string(), count);
    }
    Ok(metrics)
  }
}
