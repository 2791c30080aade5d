// Archivo: commands.rs
// Propósito: orquestación de cada comando. Se carga el documento, se
// construyen el `IdmManager` y el `StatusManager` sobre el mismo adaptador,
// se ejecuta el comando y, si hubo cambios, se guarda de forma atómica.
use crate::cli::Command;
use crate::render;
use anyhow::Context;
use idm::{IdmManager, ROOT_SCOPE};
use std::sync::Arc;
use todo_domain::COMPLETION_DIMENSION;
use todo_persistence::{save_store, DocumentStore, StoreConfig};
use todo_workflow::{presets, StatusManager, WorkflowConfig, WorkflowError, ACTIVE_CONTEXT, ALL_CONTEXT};

/// Documento abierto con sus dos motores.
pub struct Session {
    config: StoreConfig,
    store: Arc<dyn DocumentStore>,
    idm: IdmManager<dyn DocumentStore>,
    workflow: StatusManager<dyn DocumentStore>,
    dirty: bool,
}

/// Configuración de workflow: el fichero si se indicó, si no el preset.
pub fn load_workflow(config: &StoreConfig) -> anyhow::Result<WorkflowConfig> {
    if let Some(path) = &config.workflow_file {
        return WorkflowConfig::from_path(path).with_context(|| format!("loading workflow {}", path.display()));
    }
    match presets::by_name(&config.workflow) {
        Some(workflow) => Ok(workflow),
        None => Err(WorkflowError::ConfigInvalid(format!("unknown workflow preset '{}' (available: {})",
                                                         config.workflow,
                                                         presets::names().join(", "))).into()),
    }
}

impl Session {
    pub fn open(config: StoreConfig) -> anyhow::Result<Self> {
        let workflow_config = load_workflow(&config)?;
        let (store, migrated) = config.open_migrating()
                                      .with_context(|| format!("opening {}", config.file.display()))?;
        let idm = IdmManager::new(store.clone())?;
        let workflow = StatusManager::new(store.clone(), workflow_config)?;
        log::debug!("session: {} ({}) with workflow '{}'", config.file.display(), store.format(), config.workflow);
        // UIDs asignados al migrar deben llegar a disco aunque el comando sólo lea
        Ok(Self { config, store, idm, workflow, dirty: migrated })
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn workflow(&self) -> &StatusManager<dyn DocumentStore> {
        &self.workflow
    }

    /// UID de una ruta numerada en `context`.
    pub fn resolve(&self, path: &str, context: &str) -> anyhow::Result<String> {
        Ok(self.workflow.resolve_position_path_in_context(ROOT_SCOPE, path, context)?)
    }

    /// Ruta del item en `context`, o su UID si no es visible allí.
    pub fn describe(&self, uid: &str, context: &str) -> String {
        self.workflow
            .get_position_path_in_context(ROOT_SCOPE, uid, context)
            .unwrap_or_else(|_| uid.to_string())
    }

    fn touched(&mut self) {
        self.dirty = true;
    }

    /// Guarda el documento si algún comando lo modificó.
    pub fn save(&self) -> anyhow::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        save_store(&self.config.file, self.store.as_ref()).with_context(|| format!("saving {}", self.config.file.display()))
    }
}

/// Ejecuta un comando y devuelve la salida a mostrar.
pub fn execute(config: StoreConfig, command: &Command, context: Option<&str>) -> anyhow::Result<String> {
    let mut session = Session::open(config)?;
    let output = run(&mut session, command, context)?;
    session.save()?;
    Ok(output)
}

fn run(session: &mut Session, command: &Command, context: Option<&str>) -> anyhow::Result<String> {
    let ctx = context.unwrap_or(ACTIVE_CONTEXT);
    match command {
        Command::Add { text, parent } => {
            let parent_uid = match parent {
                Some(path) => session.resolve(path, ctx)?,
                None => ROOT_SCOPE.to_string(),
            };
            let (uid, _) = session.idm.add(&parent_uid)?;
            session.store.set_text(&uid, &text.join(" "))?;
            session.workflow.initialize_defaults(&uid)?;
            session.touched();
            Ok(format!("added {}\n", session.describe(&uid, ctx)))
        }
        Command::List { all } => {
            let ctx = if *all { ALL_CONTEXT } else { ctx };
            render::forest(session, ctx)
        }
        Command::Complete { paths } => set_completion(session, paths, ctx, "done"),
        Command::Reopen { paths } => set_completion(session, paths, context.unwrap_or(ALL_CONTEXT), "pending"),
        Command::Set { path, dimension, value, force } => {
            let uid = session.resolve(path, ctx)?;
            if *force {
                session.workflow.set_status(&uid, dimension, value)?;
            } else {
                session.workflow.transition(&uid, dimension, value)?;
            }
            session.touched();
            Ok(format!("{}: {} = {}\n", path, dimension, value))
        }
        Command::Edit { path, text } => {
            let uid = session.resolve(path, ctx)?;
            session.store.set_text(&uid, &text.join(" "))?;
            session.touched();
            Ok(format!("edited {}\n", path))
        }
        Command::Move { path, to } => {
            let uid = session.resolve(path, ctx)?;
            let new_parent = match to {
                Some(target) => session.resolve(target, ctx)?,
                None => ROOT_SCOPE.to_string(),
            };
            let old_parent = session.store.get_parent(&uid)?;
            session.idm.move_item(&uid, &old_parent, &new_parent)?;
            session.workflow.clear_visibility_cache();
            session.touched();
            Ok(format!("moved {} to {}\n", path, session.describe(&uid, ctx)))
        }
        Command::Swap { first, second } => {
            let a = session.resolve(first, ctx)?;
            let b = session.resolve(second, ctx)?;
            session.store.swap(&a, &b)?;
            session.idm.refresh()?;
            session.touched();
            Ok(format!("swapped {} and {}\n", first, second))
        }
        Command::Delete { path } => {
            let uid = session.resolve(path, ctx)?;
            let parent = session.store.get_parent(&uid)?;
            session.idm.soft_delete(&uid, &parent)?;
            session.workflow.clear_visibility_cache();
            session.touched();
            Ok(format!("deleted {} (restore with: todo restore {})\n", path, uid))
        }
        Command::Restore { uid } => {
            let parent = session.store.get_parent(uid)?;
            session.idm.restore(uid, &parent)?;
            session.workflow.clear_visibility_cache();
            session.touched();
            Ok(format!("restored {}\n", session.describe(uid, ctx)))
        }
        Command::Purge { uid } => {
            session.idm.purge(uid)?;
            session.workflow.clear_visibility_cache();
            session.touched();
            Ok(format!("purged {}\n", uid))
        }
        Command::Metrics { under, json } => {
            let scope = match under {
                Some(path) => session.resolve(path, ctx)?,
                None => ROOT_SCOPE.to_string(),
            };
            let metrics = session.workflow.get_metrics(&scope)?;
            if *json {
                return Ok(format!("{}\n", serde_json::to_string_pretty(&metrics)?));
            }
            Ok(render::metrics(&metrics))
        }
        Command::Contexts => Ok(render::contexts(session.workflow.config())),
        Command::Presets => Ok(render::preset_list(&session.config.workflow)),
        Command::Show { path } => {
            let uid = session.resolve(path, ctx)?;
            render::item(session, &uid, path)
        }
    }
}

/// Resuelve todas las rutas antes de tocar nada: cada cambio puede
/// renumerar el contexto.
fn set_completion(session: &mut Session, paths: &[String], ctx: &str, value: &str) -> anyhow::Result<String> {
    if session.workflow.config().dimension(COMPLETION_DIMENSION).is_none() {
        let err = anyhow::Error::new(WorkflowError::UnknownDimension(COMPLETION_DIMENSION.to_string()));
        return Err(err.context(format!("workflow '{}' has no completion dimension; use `todo set`", session.config.workflow)));
    }
    let uids = paths.iter()
                    .map(|p| session.resolve(p, ctx))
                    .collect::<anyhow::Result<Vec<_>>>()?;
    let mut out = String::new();
    for (path, uid) in paths.iter().zip(&uids) {
        session.workflow.transition(uid, COMPLETION_DIMENSION, value)?;
        session.touched();
        out.push_str(&format!("{} {} -> {}\n", path, COMPLETION_DIMENSION, value));
    }
    Ok(out)
}
