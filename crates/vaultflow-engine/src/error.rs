use thiserror::Error;
use vaultflow_expr::TemplateError;
use vaultflow_store::StoreError;
use vaultflow_workspace::WorkspaceError;

/// Errors raised by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
  /// The flow definition for a configuration could not be resolved.
  #[error("cannot find flow {flow} for command '{command}': {source}")]
  FlowDefinition {
    flow: String,
    command: String,
    #[source]
    source: StoreError,
  },

  /// A result action failed. Remaining actions still run.
  #[error("{action} action failed: {message}")]
  Action {
    action: &'static str,
    message: String,
  },

  #[error("invalid file path template: {0}")]
  Template(#[from] TemplateError),

  #[error(transparent)]
  Workspace(#[from] WorkspaceError),

  #[error(transparent)]
  Store(#[from] StoreError),
}
