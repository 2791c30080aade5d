//! todo-workflow: motor de estados multidimensionales
//!
//! Añade sobre `idm` un modelo de estados por dimensiones enumeradas,
//! contextos de visibilidad, reglas de transición validadas y
//! auto-transiciones que propagan cambios de los hijos hacia el padre.
//! El `StatusManager` trabaja sobre cualquier `WorkflowStoreAdapter`.
//!
//! ```rust
//! use idm::ROOT_SCOPE;
//! use std::sync::Arc;
//! use todo_workflow::stubs::InMemoryWorkflowStore;
//! use todo_workflow::{presets, StatusManager};
//!
//! let store = Arc::new(InMemoryWorkflowStore::new());
//! store.insert(ROOT_SCOPE, "p").unwrap();
//! store.insert("p", "c").unwrap();
//! let manager = StatusManager::new(store, presets::todo()).unwrap();
//! manager.set_status("c", "completion", "done").unwrap();
//! assert_eq!(manager.get_status("p", "completion").unwrap(), "done");
//! ```

pub mod adapter;
pub mod auto_transitions;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod presets;
pub mod status_manager;
pub mod stubs;
pub mod visibility;

pub use adapter::WorkflowStoreAdapter;
pub use config::{AutoAction, AutoCondition, AutoTransitionRule, AutoTrigger, StatusDimension, TransitionRule,
                 TransitionValidator, VisibilityRule, WorkflowConfig};
pub use errors::{Result, WorkflowError};
pub use metrics::WorkflowMetrics;
pub use status_manager::{StatusManager, ACTIVE_CONTEXT, ALL_CONTEXT};
pub use visibility::ContextFilter;
