// Archivo: tree_store.rs
// Propósito: adaptador sobre el layout de árbol (nodos con hijos anidados).
// Las búsquedas recorren el árbol; mover es desenganchar el subárbol y
// engancharlo al final de los hijos del nuevo padre.
use crate::document_store::{is_live, parent_of_scope, scope_of, DocumentStore};
use crate::errors::{Result, StoreError};
use idm::{is_root, IdmError, ManagedStoreAdapter, StoreAdapter, LIFECYCLE_DIMENSION, ROOT_SCOPE};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use todo_domain::{Document, DocumentFormat, Item, TreeNode};
use todo_workflow::WorkflowStoreAdapter;

#[derive(Debug, Default)]
pub struct TreeStore {
  roots: Mutex<Vec<TreeNode>>,
}

fn find<'a>(nodes: &'a [TreeNode], uid: &str) -> Option<&'a TreeNode> {
  for node in nodes {
    if node.item.uid() == uid {
      return Some(node);
    }
    if let Some(found) = find(&node.children, uid) {
      return Some(found);
    }
  }
  None
}

fn find_mut<'a>(nodes: &'a mut [TreeNode], uid: &str) -> Option<&'a mut TreeNode> {
  for node in nodes.iter_mut() {
    if node.item.uid() == uid {
      return Some(node);
    }
    if let Some(found) = find_mut(&mut node.children, uid) {
      return Some(found);
    }
  }
  None
}

/// Quita el nodo (con su subárbol) de donde esté.
fn detach(nodes: &mut Vec<TreeNode>, uid: &str) -> Option<TreeNode> {
  if let Some(pos) = nodes.iter().position(|n| n.item.uid() == uid) {
    return Some(nodes.remove(pos));
  }
  nodes.iter_mut().find_map(|n| detach(&mut n.children, uid))
}

fn preorder<'a>(nodes: &'a [TreeNode], out: &mut Vec<&'a TreeNode>) {
  for node in nodes {
    out.push(node);
    preorder(&node.children, out);
  }
}

fn children_mut<'a>(roots: &'a mut Vec<TreeNode>, scope: &str) -> Option<&'a mut Vec<TreeNode>> {
  if is_root(scope) {
    Some(roots)
  } else {
    find_mut(roots, scope).map(|n| &mut n.children)
  }
}

impl TreeStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_nodes(roots: Vec<TreeNode>) -> Self {
    Self { roots: Mutex::new(roots) }
  }

  fn lock(&self) -> idm::Result<MutexGuard<'_, Vec<TreeNode>>> {
    self.roots
        .lock()
        .map_err(|e| IdmError::Adapter(format!("mutex poisoned: {:?}", e)))
  }

  fn with_item<T>(&self, uid: &str, f: impl FnOnce(&mut Item) -> T) -> idm::Result<T> {
    let mut roots = self.lock()?;
    let node = find_mut(&mut roots, uid).ok_or_else(|| IdmError::ItemNotFound(uid.to_string()))?;
    Ok(f(&mut node.item))
  }
}

impl StoreAdapter for TreeStore {
  fn get_children(&self, scope: &str) -> idm::Result<Vec<String>> {
    let roots = self.lock()?;
    let children: &[TreeNode] = if is_root(scope) {
      &roots
    } else {
      &find(&roots, scope).ok_or_else(|| IdmError::ItemNotFound(scope.to_string()))?.children
    };
    Ok(children.iter()
               .filter(|n| is_live(&n.item))
               .map(|n| n.item.uid().to_string())
               .collect())
  }

  fn get_scopes(&self) -> idm::Result<Vec<String>> {
    let roots = self.lock()?;
    let mut all = Vec::new();
    preorder(&roots, &mut all);
    let mut scopes = vec![ROOT_SCOPE.to_string()];
    scopes.extend(all.into_iter()
                     .filter(|n| n.children.iter().any(|c| is_live(&c.item)))
                     .map(|n| n.item.uid().to_string()));
    Ok(scopes)
  }

  fn get_all_uids(&self) -> idm::Result<Vec<String>> {
    let roots = self.lock()?;
    let mut all = Vec::new();
    preorder(&roots, &mut all);
    Ok(all.into_iter().map(|n| n.item.uid().to_string()).collect())
  }

  fn get_parent(&self, uid: &str) -> idm::Result<String> {
    let roots = self.lock()?;
    find(&roots, uid).map(|n| scope_of(n.item.parent()))
                     .ok_or_else(|| IdmError::ItemNotFound(uid.to_string()))
  }
}

impl ManagedStoreAdapter for TreeStore {
  fn add_item(&self, parent_scope: &str) -> idm::Result<String> {
    let mut roots = self.lock()?;
    let siblings =
      children_mut(&mut roots, parent_scope).ok_or_else(|| IdmError::ParentNotFound(parent_scope.to_string()))?;
    let item = Item::new(parent_of_scope(parent_scope));
    let uid = item.uid().to_string();
    siblings.push(TreeNode::new(item));
    log::debug!("tree store: added {} under {}", uid, parent_scope);
    Ok(uid)
  }

  fn remove_item(&self, uid: &str) -> idm::Result<()> {
    let mut roots = self.lock()?;
    let node = detach(&mut roots, uid).ok_or_else(|| IdmError::ItemNotFound(uid.to_string()))?;
    log::debug!("tree store: removed {} ({} items)", uid, node.size());
    Ok(())
  }

  fn move_item(&self, uid: &str, new_parent_scope: &str) -> idm::Result<()> {
    let mut roots = self.lock()?;
    let node = find(&roots, uid).ok_or_else(|| IdmError::ItemNotFound(uid.to_string()))?;
    if !is_root(new_parent_scope) {
      if new_parent_scope == uid || find(&node.children, new_parent_scope).is_some() {
        return Err(IdmError::InvalidMove { uid: uid.to_string(),
                                           reason: "target is the item itself or one of its descendants".into() });
      }
      if find(&roots, new_parent_scope).is_none() {
        return Err(IdmError::ParentNotFound(new_parent_scope.to_string()));
      }
    }
    let mut node = detach(&mut roots, uid).ok_or_else(|| IdmError::ItemNotFound(uid.to_string()))?;
    node.item.set_parent(parent_of_scope(new_parent_scope));
    children_mut(&mut roots, new_parent_scope).ok_or_else(|| IdmError::ParentNotFound(new_parent_scope.to_string()))?
                                              .push(node);
    Ok(())
  }

  fn set_status(&self, uid: &str, value: &str) -> idm::Result<()> {
    self.set_item_status(uid, LIFECYCLE_DIMENSION, value)
  }
}

impl WorkflowStoreAdapter for TreeStore {
  fn get_item_status(&self, uid: &str, dimension: &str) -> idm::Result<Option<String>> {
    self.with_item(uid, |i| i.status(dimension).map(String::from))
  }

  fn set_item_status(&self, uid: &str, dimension: &str, value: &str) -> idm::Result<()> {
    self.with_item(uid, |i| i.set_status(dimension, value))
  }

  fn get_all_statuses(&self, uid: &str) -> idm::Result<BTreeMap<String, String>> {
    self.with_item(uid, |i| i.statuses().clone())
  }

  fn set_statuses(&self, uid: &str, statuses: &BTreeMap<String, String>) -> idm::Result<()> {
    self.with_item(uid, |i| i.set_statuses(statuses))
  }
}

impl DocumentStore for TreeStore {
  fn item(&self, uid: &str) -> Result<Item> {
    Ok(self.with_item(uid, |i| i.clone())?)
  }

  fn set_text(&self, uid: &str, text: &str) -> Result<()> {
    self.with_item(uid, |i| i.set_text(text))??;
    Ok(())
  }

  fn swap(&self, uid_a: &str, uid_b: &str) -> Result<()> {
    let mut roots = self.lock()?;
    let parent_of = |uid: &str| {
      find(&roots, uid).map(|n| scope_of(n.item.parent()))
                       .ok_or_else(|| StoreError::Idm(IdmError::ItemNotFound(uid.to_string())))
    };
    let (parent_a, parent_b) = (parent_of(uid_a)?, parent_of(uid_b)?);
    if parent_a != parent_b {
      return Err(IdmError::InvalidMove { uid: uid_b.to_string(),
                                         reason: format!("{} and {} are not siblings", uid_a, uid_b) }.into());
    }
    let siblings = children_mut(&mut roots, &parent_a).ok_or_else(|| IdmError::ParentNotFound(parent_a.clone()))?;
    let a = siblings.iter().position(|n| n.item.uid() == uid_a);
    let b = siblings.iter().position(|n| n.item.uid() == uid_b);
    if let (Some(a), Some(b)) = (a, b) {
      siblings.swap(a, b);
    }
    Ok(())
  }

  fn format(&self) -> DocumentFormat {
    DocumentFormat::Tree
  }

  fn to_document(&self) -> Result<Document> {
    Ok(Document::Tree(self.lock()?.clone()))
  }
}
