use idm::{IdmError, ROOT_SCOPE};
use std::collections::BTreeMap;
use std::sync::Arc;
use todo_workflow::stubs::{InMemoryWorkflowStore, ObservedChange};
use todo_workflow::{presets, AutoAction, AutoCondition, AutoTransitionRule, AutoTrigger, StatusDimension, StatusManager,
                    TransitionRule, WorkflowConfig, WorkflowError, WorkflowStoreAdapter};

fn tree(edges: &[(&str, &str)]) -> Arc<InMemoryWorkflowStore> {
  let store = Arc::new(InMemoryWorkflowStore::new());
  for (parent, uid) in edges {
    store.insert(parent, uid).unwrap();
  }
  store
}

fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
  pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn parent_completes_when_last_child_completes() {
  let store = tree(&[(ROOT_SCOPE, "P"), ("P", "C1"), ("P", "C2")]);
  let manager = StatusManager::new(store.clone(), presets::todo()).unwrap();
  manager.set_status("C1", "completion", "pending").unwrap();
  manager.set_status("C2", "completion", "pending").unwrap();

  manager.set_status("C1", "completion", "done").unwrap();
  assert_eq!(manager.get_status("P", "completion").unwrap(), "pending");

  manager.set_status("C2", "completion", "done").unwrap();
  assert_eq!(manager.get_status("P", "completion").unwrap(), "done");
}

#[test]
fn completion_cascades_through_several_levels() {
  let store = tree(&[(ROOT_SCOPE, "G"), ("G", "P"), ("P", "C")]);
  let manager = StatusManager::new(store.clone(), presets::todo()).unwrap();

  manager.set_status("C", "completion", "done").unwrap();

  assert_eq!(store.get_item_status("P", "completion").unwrap().as_deref(), Some("done"));
  assert_eq!(store.get_item_status("G", "completion").unwrap().as_deref(), Some("done"));
}

#[test]
fn children_without_stored_value_block_the_cascade() {
  // C2 only has the default, which does not count as "done" nor as stored
  let store = tree(&[(ROOT_SCOPE, "P"), ("P", "C1"), ("P", "C2")]);
  let manager = StatusManager::new(store.clone(), presets::todo()).unwrap();
  manager.set_status("C1", "completion", "done").unwrap();
  assert_eq!(store.get_item_status("P", "completion").unwrap(), None);
}

#[test]
fn active_context_hides_completed_children() {
  let store = tree(&[(ROOT_SCOPE, "P"), ("P", "C1"), ("P", "C2")]);
  let manager = StatusManager::new(store.clone(), presets::todo()).unwrap();
  manager.set_status("C1", "completion", "pending").unwrap();
  manager.set_status("C2", "completion", "done").unwrap();

  assert_eq!(manager.get_children_in_context("P", "active").unwrap(), vec!["C1"]);
  assert_eq!(manager.get_children_in_context("P", "all").unwrap(), vec!["C1", "C2"]);
  assert!(manager.is_visible_in_context("C1", "active").unwrap());
  assert!(!manager.is_visible_in_context("C2", "active").unwrap());
}

#[test]
fn unknown_context_admits_everything() {
  let store = tree(&[(ROOT_SCOPE, "A")]);
  let manager = StatusManager::new(store, presets::todo()).unwrap();
  assert!(manager.is_visible_in_context("A", "no-such-context").unwrap());
  assert_eq!(manager.is_visible_in_context("ghost", "all").unwrap_err(),
             WorkflowError::Idm(IdmError::ItemNotFound("ghost".into())));
}

#[test]
fn cms_requires_review_before_publishing() {
  let store = tree(&[(ROOT_SCOPE, "doc")]);
  let manager = StatusManager::new(store, presets::cms()).unwrap();

  let err = manager.transition("doc", "publication", "published").unwrap_err();
  assert_eq!(err,
             WorkflowError::TransitionForbidden { from: "draft".into(),
                                                  to: "published".into(),
                                                  dimension: "publication".into() });

  manager.transition("doc", "publication", "review").unwrap();
  manager.transition("doc", "publication", "published").unwrap();
  assert_eq!(manager.get_status("doc", "publication").unwrap(), "published");
  assert_eq!(manager.allowed_transitions("doc", "publication").unwrap(), vec!["archived", "draft"]);
}

#[test]
fn dimensions_without_rules_allow_any_value() {
  let store = tree(&[(ROOT_SCOPE, "A")]);
  let manager = StatusManager::new(store, presets::kanban()).unwrap();
  manager.transition("A", "column", "done").unwrap();
  manager.transition("A", "column", "backlog").unwrap();
  assert_eq!(manager.allowed_transitions("A", "column").unwrap(), vec!["todo", "doing", "review", "done"]);
}

#[test]
fn set_status_validates_dimension_and_value() {
  let store = tree(&[(ROOT_SCOPE, "A")]);
  let manager = StatusManager::new(store, presets::todo()).unwrap();
  assert_eq!(manager.set_status("A", "colour", "red").unwrap_err(),
             WorkflowError::UnknownDimension("colour".into()));
  assert_eq!(manager.set_status("A", "completion", "maybe").unwrap_err(),
             WorkflowError::InvalidValue { dimension: "completion".into(), value: "maybe".into() });
  assert!(manager.set_status("ghost", "completion", "done").unwrap_err().is_user_error());
}

#[test]
fn rule_validator_error_is_returned_verbatim() {
  let config = presets::todo().with_transition(TransitionRule::new("completion", "pending", &["done"]).with_validator(|uid, _, _| {
                                  Err(WorkflowError::TransitionRejected(format!("{} still has open work", uid)))
                                }));
  let store = tree(&[(ROOT_SCOPE, "A")]);
  let manager = StatusManager::new(store.clone(), config).unwrap();

  assert_eq!(manager.transition("A", "completion", "done").unwrap_err(),
             WorkflowError::TransitionRejected("A still has open work".into()));
  assert_eq!(store.get_item_status("A", "completion").unwrap(), None);
  // set_status bypasses transition rules
  manager.set_status("A", "completion", "done").unwrap();
}

#[test]
fn legacy_item_gets_defaults_on_first_write() {
  let store = tree(&[(ROOT_SCOPE, "old")]);
  let manager = StatusManager::new(store.clone(), presets::todo_priority()).unwrap();

  assert_eq!(manager.get_status("old", "completion").unwrap(), "pending");
  assert!(store.get_all_statuses("old").unwrap().is_empty());

  manager.set_status("old", "priority", "medium").unwrap();
  assert_eq!(store.get_all_statuses("old").unwrap(),
             map(&[("completion", "pending"), ("priority", "medium")]));
}

#[test]
fn initialize_defaults_skips_hooks() {
  let store = tree(&[(ROOT_SCOPE, "A")]);
  let manager = StatusManager::new(store.clone(), presets::issues()).unwrap();
  manager.initialize_defaults("A").unwrap();
  assert_eq!(store.get_all_statuses("A").unwrap(), map(&[("severity", "medium"), ("state", "open")]));
  assert!(store.changes().is_empty());
}

#[test]
fn validator_veto_leaves_state_untouched() {
  let store = tree(&[(ROOT_SCOPE, "A")]);
  store.reject_changes_to("completion", "done");
  let manager = StatusManager::new(store.clone(), presets::todo()).unwrap();

  let err = manager.set_status("A", "completion", "done").unwrap_err();
  assert!(matches!(err, WorkflowError::ValidatorRejected { ref dimension, old: None, .. } if dimension == "completion"));
  assert_eq!(store.get_item_status("A", "completion").unwrap(), None);
  assert!(store.changes().is_empty());
}

#[test]
fn post_hook_failure_keeps_the_write_and_stops_the_cascade() {
  let store = tree(&[(ROOT_SCOPE, "P"), ("P", "C")]);
  let manager = StatusManager::new(store.clone(), presets::todo()).unwrap();
  store.fail_post_hook(true);

  let err = manager.set_status("C", "completion", "done").unwrap_err();
  assert!(matches!(err, WorkflowError::PostHookFailed { .. }));
  assert!(!err.is_user_error());
  assert_eq!(store.get_item_status("C", "completion").unwrap().as_deref(), Some("done"));
  assert_eq!(store.get_item_status("P", "completion").unwrap(), None);
}

#[test]
fn post_hook_sees_old_and_new_values() {
  let store = tree(&[(ROOT_SCOPE, "A")]);
  let manager = StatusManager::new(store.clone(), presets::todo()).unwrap();
  manager.set_status("A", "completion", "done").unwrap();
  manager.set_status("A", "completion", "pending").unwrap();

  assert_eq!(store.changes(),
             vec![ObservedChange { uid: "A".into(), dimension: "completion".into(), old: None, new: "done".into() },
                  ObservedChange { uid: "A".into(),
                                   dimension: "completion".into(),
                                   old: Some("done".into()),
                                   new: "pending".into() },]);
}

#[test]
fn bulk_write_validates_everything_first_and_notifies_only_changes() {
  let store = tree(&[(ROOT_SCOPE, "A")]);
  let manager = StatusManager::new(store.clone(), presets::todo_priority()).unwrap();
  manager.set_status("A", "priority", "high").unwrap();
  let before = store.changes().len();

  let bad = map(&[("completion", "done"), ("priority", "urgent")]);
  assert!(matches!(manager.set_multiple_statuses("A", &bad), Err(WorkflowError::InvalidValue { .. })));
  assert_eq!(store.get_item_status("A", "completion").unwrap().as_deref(), Some("pending"));

  manager.set_multiple_statuses("A", &map(&[("completion", "done"), ("priority", "high")])).unwrap();
  let changes = store.changes();
  assert_eq!(changes.len(), before + 1);
  assert_eq!(changes.last().map(|c| c.dimension.as_str()), Some("completion"));
  assert_eq!(manager.get_statuses("A").unwrap(), map(&[("completion", "done"), ("priority", "high")]));
}

#[test]
fn bulk_write_triggers_parent_cascade() {
  let store = tree(&[(ROOT_SCOPE, "P"), ("P", "C")]);
  let manager = StatusManager::new(store.clone(), presets::issues()).unwrap();
  manager.set_multiple_statuses("C", &map(&[("state", "closed"), ("severity", "low")])).unwrap();
  assert_eq!(manager.get_status("P", "state").unwrap(), "closed");
}

#[test]
fn visibility_cache_is_cleared_by_writes() {
  let store = tree(&[(ROOT_SCOPE, "A")]);
  let manager = StatusManager::new(store.clone(), presets::todo()).unwrap();

  assert!(manager.is_visible_in_context("A", "active").unwrap());
  assert_eq!(manager.cached_visibility("A", "active"), Some(true));

  manager.set_status("A", "completion", "done").unwrap();
  assert_eq!(manager.cached_visibility("A", "active"), None);
  assert!(!manager.is_visible_in_context("A", "active").unwrap());
  assert_eq!(manager.cached_visibility("A", "active"), Some(false));
}

#[test]
fn paths_are_relative_to_the_context() {
  let store = tree(&[(ROOT_SCOPE, "A"), (ROOT_SCOPE, "B"), (ROOT_SCOPE, "C"), ("C", "C1")]);
  let manager = StatusManager::new(store.clone(), presets::todo()).unwrap();
  manager.set_status("B", "completion", "done").unwrap();

  assert_eq!(manager.resolve_position_path_in_context(ROOT_SCOPE, "2", "active").unwrap(), "C");
  assert_eq!(manager.resolve_position_path_in_context(ROOT_SCOPE, "2", "all").unwrap(), "B");
  assert_eq!(manager.resolve_position_path_in_context(ROOT_SCOPE, "2.1", "active").unwrap(), "C1");
  assert_eq!(manager.get_position_path_in_context(ROOT_SCOPE, "C1", "active").unwrap(), "2.1");
  assert_eq!(manager.get_position_path_in_context(ROOT_SCOPE, "B", "all").unwrap(), "2");
  assert_eq!(manager.get_position_path_in_context(ROOT_SCOPE, "B", "active").unwrap_err(),
             WorkflowError::NotVisible { uid: "B".into(), context: "active".into() });
  assert_eq!(manager.resolve_position_path_in_context(ROOT_SCOPE, "3", "active").unwrap_err(),
             WorkflowError::Idm(IdmError::PathNotResolvable { prefix: "3".into() }));
}

#[test]
fn critical_context_requires_every_rule() {
  let store = tree(&[(ROOT_SCOPE, "a"), (ROOT_SCOPE, "b"), (ROOT_SCOPE, "c")]);
  let manager = StatusManager::new(store.clone(), presets::issues()).unwrap();
  manager.set_status("a", "severity", "critical").unwrap();
  manager.set_multiple_statuses("b", &map(&[("severity", "critical"), ("state", "closed")])).unwrap();

  assert_eq!(manager.get_all_items_in_context("critical").unwrap(), vec!["a"]);
  assert_eq!(manager.get_all_items_in_context("active").unwrap(), vec!["a", "c"]);
}

#[test]
fn re_entrant_write_on_the_same_item_is_ignored() {
  // parent moved back to "doing" while every child is done: the rule on the
  // parent would write the parent again from inside its own write
  let store = tree(&[(ROOT_SCOPE, "P"), ("P", "C")]);
  let manager = StatusManager::new(store.clone(), presets::kanban()).unwrap();
  manager.set_status("C", "column", "done").unwrap();
  assert_eq!(manager.get_status("P", "column").unwrap(), "done");

  manager.set_status("P", "column", "doing").unwrap();
  assert_eq!(manager.get_status("P", "column").unwrap(), "doing");
}

#[test]
fn converged_parent_is_not_written_again() {
  let store = tree(&[(ROOT_SCOPE, "P"), ("P", "C1"), ("P", "C2")]);
  let manager = StatusManager::new(store.clone(), presets::todo()).unwrap();
  manager.set_status("C1", "completion", "done").unwrap();
  manager.set_status("C2", "completion", "done").unwrap();
  assert_eq!(manager.get_status("P", "completion").unwrap(), "done");
  let settled = store.changes();

  manager.trigger_auto_transitions(&AutoTrigger::ChildStatusChange, "P").unwrap();
  manager.trigger_auto_transitions(&AutoTrigger::StatusChange, "P").unwrap();
  assert_eq!(store.changes(), settled);

  // rewriting a child with the same value reaches the parent but changes nothing there
  manager.set_status("C2", "completion", "done").unwrap();
  let after = store.changes();
  assert_eq!(after.len(), settled.len() + 1);
  assert_eq!(after.last().unwrap().uid, "C2");
  assert_eq!(manager.get_status("P", "completion").unwrap(), "done");
}

#[test]
fn rules_with_unknown_condition_or_action_are_skipped() {
  let unknown_condition = AutoTransitionRule { condition: AutoCondition::Other("most_children_status_equals".into()),
                                               ..AutoTransitionRule::all_children_to("completion", "done", "done") };
  let unknown_action = AutoTransitionRule { action: AutoAction::Other("notify_owner".into()),
                                            ..AutoTransitionRule::all_children_to("completion", "done", "done") };
  let config =
    WorkflowConfig::new(vec![StatusDimension::new("completion", &["pending", "done"]).with_default("pending")])
      .with_context("all")
      .with_auto_transition(unknown_condition)
      .with_auto_transition(unknown_action);
  assert_eq!(config.unknown_rule_names(),
             vec!["condition 'most_children_status_equals'".to_string(), "action 'notify_owner'".to_string()]);

  let store = tree(&[(ROOT_SCOPE, "P"), ("P", "C")]);
  let manager = StatusManager::new(store.clone(), config).unwrap();
  manager.set_status("C", "completion", "done").unwrap();

  assert_eq!(store.get_item_status("P", "completion").unwrap(), None);
  assert!(store.changes().iter().all(|c| c.uid == "C"));
}
