use idm::stubs::InMemoryStore;
use idm::{IdmError, IdmManager, ManagedStoreAdapter, StoreAdapter, LIFECYCLE_DELETED, ROOT_SCOPE};
use std::sync::Arc;

#[test]
fn add_assigns_sequential_hids() {
  let store = Arc::new(InMemoryStore::new());
  let mut idm = IdmManager::new(store.clone()).expect("manager");

  let (a, hid_a) = idm.add(ROOT_SCOPE).unwrap();
  let (b, hid_b) = idm.add(ROOT_SCOPE).unwrap();
  let (c, hid_c) = idm.add(&a).unwrap();
  assert_eq!((hid_a, hid_b, hid_c), (1, 2, 1));
  assert_eq!(idm.resolve("2").unwrap(), b);
  assert_eq!(idm.resolve("1.1").unwrap(), c);
  assert_eq!(idm.position_path(&c).unwrap(), "1.1");
}

#[test]
fn move_recomputes_hids_in_both_scopes() {
  // root -> [A, B], A -> [C]
  let store = Arc::new(InMemoryStore::new());
  store.insert(ROOT_SCOPE, "A").unwrap();
  store.insert(ROOT_SCOPE, "B").unwrap();
  store.insert("A", "C").unwrap();
  let mut idm = IdmManager::new(store.clone()).unwrap();
  assert_eq!(idm.resolve("1.1").unwrap(), "C");

  idm.move_item("C", "A", "B").unwrap();

  assert_eq!(idm.resolve("1.1").unwrap_err(), IdmError::PathNotResolvable { prefix: "1.1".into() });
  assert_eq!(idm.resolve("2.1").unwrap(), "C");
  assert_eq!(store.get_parent("C").unwrap(), "B");
}

#[test]
fn move_under_own_descendant_is_rejected() {
  let store = Arc::new(InMemoryStore::new());
  store.insert(ROOT_SCOPE, "A").unwrap();
  store.insert("A", "B").unwrap();
  let mut idm = IdmManager::new(store.clone()).unwrap();

  assert!(matches!(idm.move_item("A", ROOT_SCOPE, "B"), Err(IdmError::InvalidMove { .. })));
  assert!(matches!(idm.move_item("A", ROOT_SCOPE, "A"), Err(IdmError::InvalidMove { .. })));
  assert!(matches!(idm.move_item("A", ROOT_SCOPE, "ghost"), Err(IdmError::ParentNotFound(_))));
  assert!(matches!(idm.move_item("ghost", ROOT_SCOPE, "A"), Err(IdmError::ItemNotFound(_))));
}

#[test]
fn soft_delete_hides_and_restore_brings_back() {
  let store = Arc::new(InMemoryStore::new());
  store.insert(ROOT_SCOPE, "A").unwrap();
  store.insert(ROOT_SCOPE, "B").unwrap();
  store.insert(ROOT_SCOPE, "C").unwrap();
  let mut idm = IdmManager::new(store.clone()).unwrap();

  idm.soft_delete("A", ROOT_SCOPE).unwrap();
  assert_eq!(store.lifecycle("A").unwrap().as_deref(), Some(LIFECYCLE_DELETED));
  assert_eq!(idm.resolve("1").unwrap(), "B");
  assert_eq!(idm.resolve("2").unwrap(), "C");
  assert!(idm.position_path("A").is_err());

  idm.restore("A", ROOT_SCOPE).unwrap();
  assert_eq!(idm.resolve("1").unwrap(), "A");
}

#[test]
fn purge_removes_item_and_its_scope() {
  let store = Arc::new(InMemoryStore::new());
  store.insert(ROOT_SCOPE, "A").unwrap();
  store.insert("A", "A1").unwrap();
  store.insert(ROOT_SCOPE, "B").unwrap();
  let mut idm = IdmManager::new(store.clone()).unwrap();

  idm.soft_delete("A", ROOT_SCOPE).unwrap();
  idm.purge("A").unwrap();

  assert!(idm.registry().scope("A").is_none());
  assert_eq!(store.get_all_uids().unwrap(), vec!["B".to_string()]);
  assert!(matches!(store.remove_item("A"), Err(IdmError::ItemNotFound(_))));
  assert_eq!(idm.resolve("1").unwrap(), "B");
}

#[test]
fn refresh_picks_up_out_of_band_changes() {
  let store = Arc::new(InMemoryStore::new());
  let mut idm = IdmManager::new(store.clone()).unwrap();
  store.insert(ROOT_SCOPE, "X").unwrap();
  assert!(idm.resolve("1").is_err());
  idm.refresh().unwrap();
  assert_eq!(idm.resolve("1").unwrap(), "X");
}
