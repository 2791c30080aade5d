// Archivo: cli.rs
// Propósito: definición de la línea de comandos (clap derive). Los flags
// globales tienen prioridad sobre las variables de entorno equivalentes.
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use todo_domain::DocumentFormat;
use todo_persistence::StoreConfig;

#[derive(Debug, Parser)]
#[command(name = "todo")]
#[command(about = "Hierarchical task manager with multi-dimensional workflows")]
pub struct Cli {
    /// JSON document to operate on
    #[arg(long, env = "TODO_FILE", global = true)]
    pub file: Option<PathBuf>,

    /// Layout for new documents (flat or tree)
    #[arg(long, env = "TODO_FORMAT", global = true)]
    pub format: Option<DocumentFormat>,

    /// Workflow preset name
    #[arg(long, env = "TODO_WORKFLOW", global = true)]
    pub workflow: Option<String>,

    /// JSON workflow configuration (overrides the preset)
    #[arg(long, env = "TODO_WORKFLOW_FILE", global = true)]
    pub workflow_file: Option<PathBuf>,

    /// Context used to number items (default: active)
    #[arg(short, long, global = true)]
    pub context: Option<String>,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Add an item at the root or under PARENT
    Add {
        #[arg(required = true)]
        text: Vec<String>,
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Show the items visible in the context
    List {
        /// Use the `all` context
        #[arg(short, long)]
        all: bool,
    },

    /// Mark items as done
    Complete {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Mark items as pending again (paths are numbered in `all` unless --context is given)
    Reopen {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Change one status dimension through the transition rules
    Set {
        path: String,
        dimension: String,
        value: String,
        /// Skip the transition rules
        #[arg(long)]
        force: bool,
    },

    /// Replace the text of an item
    Edit {
        path: String,
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Move an item under another one (or to the root)
    Move {
        path: String,
        #[arg(long)]
        to: Option<String>,
    },

    /// Swap two sibling items
    Swap { first: String, second: String },

    /// Soft-delete an item (prints its uid for `restore`)
    Delete { path: String },

    /// Undo a soft delete
    Restore { uid: String },

    /// Remove an item and its subtree permanently
    Purge { uid: String },

    /// Item counts per dimension and context
    Metrics {
        #[arg(long)]
        under: Option<String>,
        /// Print the counts as JSON
        #[arg(long)]
        json: bool,
    },

    /// Contexts of the active workflow
    Contexts,

    /// Available workflow presets
    Presets,

    /// Details of one item
    Show { path: String },
}

impl Cli {
    /// Entorno (y `.env`) con los flags aplicados encima.
    pub fn store_config(&self) -> anyhow::Result<StoreConfig> {
        let mut config = StoreConfig::from_env()?;
        if let Some(file) = &self.file {
            config.file = file.clone();
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(workflow) = &self.workflow {
            config.workflow = workflow.clone();
        }
        if let Some(path) = &self.workflow_file {
            config.workflow_file = Some(path.clone());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["todo", "add", "buy", "milk", "-p", "1.2", "--format", "tree", "-c", "all"]).unwrap();
        assert_eq!(cli.command, Command::Add { text: vec!["buy".into(), "milk".into()], parent: Some("1.2".into()) });
        assert_eq!(cli.format, Some(DocumentFormat::Tree));
        assert_eq!(cli.context.as_deref(), Some("all"));
        assert!(Cli::try_parse_from(["todo", "add"]).is_err());
        assert!(Cli::try_parse_from(["todo", "list", "--format", "yaml"]).is_err());
    }
}
