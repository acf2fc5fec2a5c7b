use thiserror::Error;

use crate::validate::{DocumentKind, Violation};

/// Errors raised while checking or decoding a document.
#[derive(Debug, Error)]
pub enum SchemaError {
  /// The document is not a JSON object at all.
  #[error("expected a JSON object for {kind}, found {found}")]
  NotAnObject {
    kind: DocumentKind,
    found: &'static str,
  },

  /// The document is an object but does not conform to the schema.
  #[error("{kind} is invalid ({} violations)", .violations.len())]
  Invalid {
    kind: DocumentKind,
    violations: Vec<Violation>,
  },

  /// The document passed validation but could not be decoded.
  #[error("failed to decode {kind}: {source}")]
  Decode {
    kind: DocumentKind,
    #[source]
    source: serde_json::Error,
  },

  #[error("unknown document kind: {0}")]
  UnknownKind(String),
}
