use idm::{ManagedStoreAdapter, StoreAdapter, ROOT_SCOPE};
use serde_json::{json, Value};
use todo_domain::{Document, DocumentFormat};
use todo_persistence::{load_document, open, save_store, StoreConfig, StoreError, ENV_FILE, ENV_FORMAT, ENV_WORKFLOW};
use todo_workflow::WorkflowStoreAdapter;

fn read_json(path: &std::path::Path) -> Value {
  serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn missing_file_opens_empty_in_requested_layout() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("todo.json");
  let doc = load_document(&path, DocumentFormat::Tree).unwrap();
  assert_eq!(doc, Document::empty(DocumentFormat::Tree));

  let store = open(&path, DocumentFormat::Flat).unwrap();
  assert_eq!(store.format(), DocumentFormat::Flat);
  assert!(store.get_all_uids().unwrap().is_empty());
}

#[test]
fn save_is_atomic_and_creates_directories() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("nested").join("deeper").join("todo.json");
  let store = open(&path, DocumentFormat::Flat).unwrap();
  let uid = store.add_item(ROOT_SCOPE).unwrap();
  store.set_text(&uid, "first").unwrap();

  save_store(&path, store.as_ref()).unwrap();

  assert!(path.exists());
  assert!(!dir.path().join("nested").join("deeper").join("todo.json.tmp").exists());
  let raw = read_json(&path);
  assert_eq!(raw["items"][0]["uid"], uid.as_str());
  assert_eq!(raw["items"][0]["text"], "first");
  assert_eq!(raw["items"][0]["parent"], "");
}

#[test]
fn existing_layout_is_preserved_across_saves() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("legacy.json");
  let legacy = json!([
    {"uid": "p", "text": "trip", "status": "pending", "children": [
      {"uid": "c", "text": "book hotel", "status": "done"}
    ]}
  ]);
  std::fs::write(&path, legacy.to_string()).unwrap();

  // the requested layout only applies to new documents
  let store = open(&path, DocumentFormat::Flat).unwrap();
  assert_eq!(store.format(), DocumentFormat::Tree);
  assert_eq!(store.get_item_status("c", "completion").unwrap().as_deref(), Some("done"));
  assert_eq!(store.get_children("p").unwrap(), vec!["c"]);

  store.set_item_status("p", "completion", "done").unwrap();
  save_store(&path, store.as_ref()).unwrap();

  let raw = read_json(&path);
  assert_eq!(raw["todos"][0]["statuses"]["completion"], "done");
  assert!(raw["todos"][0].get("status").is_none());
  assert_eq!(raw["todos"][0]["children"][0]["uid"], "c");
}

#[test]
fn corrupt_documents_surface_as_storage_errors() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("broken.json");
  std::fs::write(&path, "{\"items\": [").unwrap();
  let err = open(&path, DocumentFormat::Flat).err().unwrap();
  assert!(matches!(err, StoreError::Domain(_)));
  assert!(!err.is_user_error());

  std::fs::write(&path, "   ").unwrap();
  assert!(open(&path, DocumentFormat::Flat).unwrap().get_all_uids().unwrap().is_empty());
}

#[test]
fn configuration_comes_from_the_environment() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("env.json");
  std::env::set_var(ENV_FILE, &path);
  std::env::set_var(ENV_FORMAT, "tree");
  std::env::set_var(ENV_WORKFLOW, "kanban");

  let config = StoreConfig::from_env().unwrap();
  assert_eq!(config.file, path);
  assert_eq!(config.format, DocumentFormat::Tree);
  assert_eq!(config.workflow, "kanban");
  assert_eq!(config.open().unwrap().format(), DocumentFormat::Tree);

  std::env::set_var(ENV_FORMAT, "yaml");
  assert!(matches!(StoreConfig::from_env(), Err(StoreError::Config(_))));

  for var in [ENV_FILE, ENV_FORMAT, ENV_WORKFLOW] {
    std::env::remove_var(var);
  }
}
