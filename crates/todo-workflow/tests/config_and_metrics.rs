use idm::ROOT_SCOPE;
use std::collections::BTreeMap;
use std::sync::Arc;
use todo_workflow::stubs::InMemoryWorkflowStore;
use todo_workflow::{presets, AutoTrigger, StatusDimension, StatusManager, VisibilityRule, WorkflowConfig, WorkflowError};

const TICKETS: &str = r#"{
  "dimensions": [
    { "name": "state", "values": ["open", "closed"], "default_value": "open" }
  ],
  "visibility": {
    "active": [ { "dimension": "state", "include": ["open"] } ],
    "all": []
  },
  "transitions": {
    "state": [ { "from": "open", "to": ["closed"] }, { "from": "closed", "to": ["open"] } ]
  },
  "auto_transitions": [
    { "trigger": "status_change", "condition": "all_children_status_equals", "condition_value": "closed",
      "target_dimension": "state", "action": "set_status", "action_value": "closed" },
    { "trigger": "on_tuesday", "condition": "all_children_status_equals", "condition_value": "open",
      "target_dimension": "state", "action": "set_status", "action_value": "closed" }
  ]
}"#;

fn invalid(result: Result<WorkflowConfig, WorkflowError>) -> String {
  match result {
    Err(WorkflowError::ConfigInvalid(msg)) => msg,
    other => panic!("expected ConfigInvalid, got {:?}", other.map(|_| ())),
  }
}

#[test]
fn json_configuration_loads_and_runs() {
  let config = WorkflowConfig::from_json_str(TICKETS).unwrap();
  assert_eq!(config.contexts(), vec!["active", "all"]);
  assert_eq!(config.visibility_rules("active")[0].context, "active");
  assert_eq!(config.transition_rules("state")[1].dimension, "state");
  assert_eq!(config.auto_transitions[1].trigger, AutoTrigger::Other("on_tuesday".into()));
  assert_eq!(config.unknown_rule_names(), vec!["trigger 'on_tuesday'"]);

  let store = Arc::new(InMemoryWorkflowStore::new());
  store.insert(ROOT_SCOPE, "epic").unwrap();
  store.insert("epic", "task").unwrap();
  let manager = StatusManager::new(store, config).unwrap();

  manager.transition("task", "state", "closed").unwrap();
  assert_eq!(manager.get_status("epic", "state").unwrap(), "closed");
  assert!(manager.get_children_in_context(ROOT_SCOPE, "active").unwrap().is_empty());
}

#[test]
fn configuration_round_trips_through_serde() {
  let original = presets::issues();
  let json = serde_json::to_string(&original).unwrap();
  let loaded = WorkflowConfig::from_json_str(&json).unwrap();
  assert_eq!(loaded.dimensions, original.dimensions);
  assert_eq!(loaded.contexts(), original.contexts());
  assert_eq!(loaded.auto_transitions, original.auto_transitions);
}

#[test]
fn configuration_loads_from_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("tickets.json");
  std::fs::write(&path, TICKETS).unwrap();
  let config = WorkflowConfig::from_path(&path).unwrap();
  assert_eq!(config.dimensions[0].name, "state");

  let missing = invalid(WorkflowConfig::from_path(&dir.path().join("nope.json")));
  assert!(missing.contains("cannot read"), "{}", missing);
}

#[test]
fn malformed_configurations_are_rejected() {
  assert!(invalid(WorkflowConfig::from_json_str("{ not json")).contains("cannot parse"));

  let bad_default = WorkflowConfig::new(vec![StatusDimension::new("state", &["open"]).with_default("closed")]);
  assert!(invalid(bad_default.validate().map(|_| WorkflowConfig::default())).contains("default 'closed'"));

  let duplicate = WorkflowConfig::new(vec![StatusDimension::new("a", &["x"]), StatusDimension::new("a", &["y"])]);
  assert!(invalid(duplicate.validate().map(|_| WorkflowConfig::default())).contains("duplicate dimension"));

  let empty = WorkflowConfig::new(vec![StatusDimension::new("a", &[])]);
  assert!(invalid(empty.validate().map(|_| WorkflowConfig::default())).contains("no values"));

  let ghost_rule = presets::todo().with_visibility_rule(VisibilityRule::new("active", "colour").include(&["red"]));
  let store = Arc::new(InMemoryWorkflowStore::new());
  assert!(matches!(StatusManager::new(store, ghost_rule), Err(WorkflowError::ConfigInvalid(_))));

  let bad_transition = r#"{"dimensions":[{"name":"s","values":["a","b"]}],"transitions":{"s":[{"from":"a","to":["c"]}]}}"#;
  assert!(invalid(WorkflowConfig::from_json_str(bad_transition)).contains("unknown value 'c'"));
}

#[test]
fn metrics_count_effective_statuses_and_contexts() {
  let store = Arc::new(InMemoryWorkflowStore::new());
  for (parent, uid) in [(ROOT_SCOPE, "A"), (ROOT_SCOPE, "B"), ("A", "A1"), ("A", "A2")] {
    store.insert(parent, uid).unwrap();
  }
  let manager = StatusManager::new(store, presets::todo_priority()).unwrap();
  manager.set_status("A1", "completion", "done").unwrap();
  manager.set_status("B", "priority", "high").unwrap();

  let metrics = manager.get_metrics(ROOT_SCOPE).unwrap();
  assert_eq!(metrics.total_items, 4);
  assert_eq!(metrics.by_dimension["completion"],
             BTreeMap::from([("pending".to_string(), 3), ("done".to_string(), 1)]));
  assert_eq!(metrics.by_dimension["priority"]["medium"], 3);
  assert_eq!(metrics.by_dimension["priority"]["high"], 1);
  assert_eq!(metrics.by_dimension["priority"]["low"], 0);
  assert_eq!(metrics.by_context["active"], 3);
  assert_eq!(metrics.by_context["completed"], 1);
  assert_eq!(metrics.by_context["all"], 4);
  assert_eq!(metrics.by_context["high_priority"], 1);

  let under_a = manager.get_metrics("A").unwrap();
  assert_eq!(under_a.scope, "A");
  assert_eq!(under_a.total_items, 2);
  assert_eq!(under_a.by_context["active"], 1);
  assert_eq!(under_a.by_context["high_priority"], 0);

  assert!(manager.get_metrics("ghost").is_err());
}
