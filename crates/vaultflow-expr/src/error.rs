use thiserror::Error;

/// Errors raised while rendering a `${...}` template.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
  #[error("unclosed placeholder starting at byte {position}")]
  Unclosed { position: usize },

  #[error("invalid placeholder '{placeholder}': {message}")]
  InvalidPlaceholder {
    placeholder: String,
    message: String,
  },

  #[error("no value for '{path}'")]
  MissingValue { path: String },
}

/// Errors raised while compiling or evaluating a trigger condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConditionError {
  #[error("syntax error at byte {position}: {message}")]
  Syntax { position: usize, message: String },

  #[error("unknown identifier '{0}'")]
  UnknownIdentifier(String),

  #[error("unknown method '{method}' on {target}")]
  UnknownMethod { method: String, target: String },

  #[error("type mismatch in '{operation}': {message}")]
  TypeMismatch { operation: String, message: String },

  #[error("invalid regular expression: {0}")]
  InvalidRegex(String),
}
