use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Request body sent to the flow endpoint.
///
/// `records` is reserved for batch flows; configurations built here only
/// ever populate `constants`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowInput {
  pub constants: BTreeMap<String, String>,
  pub records: Vec<BTreeMap<String, String>>,
}

/// Structured result of a flow execution.
///
/// A well-behaved server returns either data or errors, but nothing
/// enforces exclusivity. Values are kept as JSON so that a non-string
/// field from the server does not invalidate the whole response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub constants: Option<serde_json::Map<String, serde_json::Value>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub records: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub errors: Option<Vec<String>>,
}

impl ApiResponse {
  /// A response that carries a single error message.
  pub fn error(message: impl Into<String>) -> Self {
    Self {
      errors: Some(vec![message.into()]),
      ..Self::default()
    }
  }

  /// Errors reported by the response, empty when there are none.
  pub fn errors(&self) -> &[String] {
    self.errors.as_deref().unwrap_or_default()
  }

  /// Look up a named field in `constants`, falling back to the first record.
  pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
    self
      .constants
      .as_ref()
      .and_then(|constants| constants.get(name))
      .or_else(|| {
        self
          .records
          .as_ref()
          .and_then(|records| records.first())
          .and_then(|record| record.get(name))
      })
  }
}
