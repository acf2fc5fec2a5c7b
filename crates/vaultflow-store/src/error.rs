use thiserror::Error;
use vaultflow_client::ClientError;
use vaultflow_config::SchemaError;

/// Errors raised by settings storage and the definition cache.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("io error on {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to encode settings: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("settings file {path} is not JSON: {source}")]
  Decode {
    path: String,
    #[source]
    source: serde_json::Error,
  },

  /// No configuration with this command id exists.
  #[error("unknown command: {command_id}")]
  UnknownCommand { command_id: String },

  #[error(transparent)]
  Schema(#[from] SchemaError),

  #[error(transparent)]
  Client(#[from] ClientError),
}
