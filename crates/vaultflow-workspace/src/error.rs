use thiserror::Error;

/// Errors raised by workspace operations.
#[derive(Debug, Error)]
pub enum WorkspaceError {
  #[error("file not found: {path}")]
  NotFound { path: String },

  #[error("file already exists: {path}")]
  AlreadyExists { path: String },

  /// The path is absolute or climbs out of the workspace root.
  #[error("path is outside the workspace: {path}")]
  OutsideWorkspace { path: String },

  #[error("file is not valid UTF-8: {path}")]
  NotText { path: String },

  #[error("io error on {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

impl WorkspaceError {
  pub(crate) fn io(path: &str, source: std::io::Error) -> Self {
    if source.kind() == std::io::ErrorKind::NotFound {
      return WorkspaceError::NotFound {
        path: path.to_string(),
      };
    }
    WorkspaceError::Io {
      path: path.to_string(),
      source,
    }
  }
}
