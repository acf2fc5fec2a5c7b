//! Trigger conditions.
//!
//! A condition is a small boolean expression evaluated against a JSON
//! object. Identifiers resolve to the object's top-level keys; strings
//! support a fixed set of methods (`includes`, `startsWith`, `endsWith`,
//! `matches`, `toLowerCase`, `toUpperCase`, `trim`) and `.length`. There
//! is no assignment, arithmetic or function definition, so evaluating a
//! condition cannot have side effects.

mod eval;
mod lexer;
mod parser;

use serde_json::{Map, Value};

use crate::error::ConditionError;
use parser::{Expr, Parser};

/// A compiled trigger condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
  source: String,
  // `None` for a blank condition, which always holds.
  expr: Option<Expr>,
}

impl Condition {
  /// Parse `source` into a reusable condition.
  pub fn compile(source: &str) -> Result<Self, ConditionError> {
    let expr = if source.trim().is_empty() {
      None
    } else {
      let tokens = lexer::tokenize(source)?;
      Some(Parser::new(tokens, source.len()).parse()?)
    };

    Ok(Self {
      source: source.to_string(),
      expr,
    })
  }

  pub fn source(&self) -> &str {
    &self.source
  }

  /// Evaluate against `context`, which must be a JSON object.
  pub fn evaluate(&self, context: &Value) -> Result<bool, ConditionError> {
    let Some(expr) = &self.expr else {
      return Ok(true);
    };

    let empty = Map::new();
    let scope = match context {
      Value::Object(map) => map,
      Value::Null => &empty,
      other => {
        return Err(ConditionError::TypeMismatch {
          operation: "evaluate".to_string(),
          message: format!("context must be an object, found {}", other),
        });
      }
    };

    eval::evaluate(expr, scope).map(|value| eval::truthy(&value))
  }
}
