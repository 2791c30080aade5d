// Archivo: auto_transitions.rs
// Propósito: evaluación de las reglas reactivas (auto-transiciones). Se
// invocan desde `StatusManager::set_status` tras cada escritura; la cascada
// sube por el árbol porque cada escritura vuelve a disparar al padre.
use crate::adapter::WorkflowStoreAdapter;
use crate::config::{AutoAction, AutoCondition, AutoTransitionRule, AutoTrigger};
use crate::errors::Result;
use crate::status_manager::StatusManager;

impl<A> StatusManager<A> where A: WorkflowStoreAdapter + ?Sized
{
  /// Evalúa, en orden de configuración, las reglas que responden a
  /// `trigger` sobre el item `uid`.
  ///
  /// Las reglas `status_change` también responden a `child_status_change`:
  /// el cambio de un hijo es lo que puede completar su condición.
  pub fn trigger_auto_transitions(&self, trigger: &AutoTrigger, uid: &str) -> Result<()> {
    let rules: Vec<AutoTransitionRule> = self.config
                                             .auto_transitions
                                             .iter()
                                             .filter(|r| fires_on(&r.trigger, trigger))
                                             .cloned()
                                             .collect();
    for rule in &rules {
      self.execute_auto_transition(rule, uid)?;
    }
    Ok(())
  }

  /// Aplica una regla si su condición se cumple. Las reglas con nombres
  /// desconocidos se omiten.
  pub fn execute_auto_transition(&self, rule: &AutoTransitionRule, uid: &str) -> Result<()> {
    let Some(dimension) = rule.target_dimension.as_deref() else {
      log::debug!("workflow: auto-transition without target dimension skipped");
      return Ok(());
    };

    let holds = match &rule.condition {
      AutoCondition::AllChildrenStatusEquals => self.all_children_hold(uid, dimension, &rule.condition_value)?,
      AutoCondition::Other(name) => {
        log::debug!("workflow: skipping unknown condition '{}'", name);
        false
      }
    };
    if !holds {
      return Ok(());
    }

    match &rule.action {
      AutoAction::SetStatus => {
        if self.adapter.get_item_status(uid, dimension)?.as_deref() == Some(rule.action_value.as_str()) {
          return Ok(());
        }
        log::info!("workflow: auto-transition sets {} '{}' on {}", dimension, rule.action_value, uid);
        self.set_status(uid, dimension, &rule.action_value)
      }
      AutoAction::Other(name) => {
        log::debug!("workflow: skipping unknown action '{}'", name);
        Ok(())
      }
    }
  }

  /// `true` si el item tiene hijos y todos guardan `value` en la dimensión.
  /// Un hijo sin valor guardado, o ilegible, no cumple.
  fn all_children_hold(&self, uid: &str, dimension: &str, value: &str) -> Result<bool> {
    let children = self.adapter.get_children(uid)?;
    if children.is_empty() {
      return Ok(false);
    }
    Ok(children.iter().all(|child| match self.adapter.get_item_status(child, dimension) {
                          Ok(Some(v)) => v == value,
                          Ok(None) => false,
                          Err(e) => {
                            log::warn!("workflow: cannot read {} of {}: {}", dimension, child, e);
                            false
                          }
                        }))
  }
}

fn fires_on(rule_trigger: &AutoTrigger, incoming: &AutoTrigger) -> bool {
  rule_trigger == incoming
  || (*rule_trigger == AutoTrigger::StatusChange && *incoming == AutoTrigger::ChildStatusChange)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_change_rules_also_fire_for_children() {
    assert!(fires_on(&AutoTrigger::StatusChange, &AutoTrigger::StatusChange));
    assert!(fires_on(&AutoTrigger::StatusChange, &AutoTrigger::ChildStatusChange));
    assert!(fires_on(&AutoTrigger::ChildStatusChange, &AutoTrigger::ChildStatusChange));
    assert!(!fires_on(&AutoTrigger::ChildStatusChange, &AutoTrigger::StatusChange));
    assert!(!fires_on(&AutoTrigger::Other("x".into()), &AutoTrigger::StatusChange));
  }
}
