use idm::IdmError;
use thiserror::Error;

// Errores del motor de workflow.
//
// Este enum centraliza los errores que pueden ocurrir al consultar o
// cambiar estados: errores del gestor de identidades (`IdmError`), de
// configuracion, de reglas de transicion y de los hooks del adaptador.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
  /// Errores originados en el registro o en el adaptador.
  #[error(transparent)]
  Idm(#[from] IdmError),

  /// La dimension no esta declarada en la configuracion.
  #[error("unknown status dimension '{0}'")]
  UnknownDimension(String),

  /// El valor no pertenece al conjunto permitido de la dimension.
  #[error("'{value}' is not a valid value for dimension '{dimension}'")]
  InvalidValue { dimension: String, value: String },

  /// El item no tiene valor y la dimension no declara default.
  #[error("item {uid} has no value for dimension '{dimension}'")]
  NoStatusValue { uid: String, dimension: String },

  /// Ninguna regla permite el cambio.
  #[error("transition from '{from}' to '{to}' is not allowed for dimension '{dimension}'")]
  TransitionForbidden { from: String, to: String, dimension: String },

  /// Rechazo emitido por el validador propio de una regla de transicion.
  #[error("transition rejected: {0}")]
  TransitionRejected(String),

  /// El item no es visible en el contexto pedido.
  #[error("item {uid} is not visible in context '{context}'")]
  NotVisible { uid: String, context: String },

  /// Configuracion invalida; sólo aparece al construir el motor.
  #[error("invalid workflow configuration: {0}")]
  ConfigInvalid(String),

  /// Veto de `validate_status_change` del adaptador.
  #[error("change of '{dimension}' on {uid} to '{new}' rejected: {reason}")]
  ValidatorRejected { uid: String, dimension: String, old: Option<String>, new: String, reason: String },

  /// Fallo de `on_status_change`; el cambio ya quedó aplicado.
  #[error("post-change hook failed for '{dimension}' on {uid} (now '{new}'): {reason}")]
  PostHookFailed { uid: String, dimension: String, old: Option<String>, new: String, reason: String },
}

impl WorkflowError {
  /// Errores atribuibles al usuario o a la configuracion; el resto son
  /// fallos del almacenamiento.
  pub fn is_user_error(&self) -> bool {
    match self {
      WorkflowError::Idm(e) => e.is_user_error(),
      WorkflowError::PostHookFailed { .. } => false,
      _ => true,
    }
  }
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, WorkflowError>;
