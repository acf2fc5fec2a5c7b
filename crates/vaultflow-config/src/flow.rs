use serde::{Deserialize, Serialize};

/// Encoding of a single input or output value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
  /// Plain text.
  #[serde(rename = "string")]
  String,
  /// Binary content transported as standard base64.
  #[serde(rename = "binary/base64")]
  Base64,
}

impl ValueType {
  pub fn as_str(&self) -> &'static str {
    match self {
      ValueType::String => "string",
      ValueType::Base64 => "binary/base64",
    }
  }
}

/// One input a flow accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDefinition {
  pub name: String,
  pub description: String,
  #[serde(rename = "type")]
  pub value_type: ValueType,
}

/// One field a flow is expected to return in `constants` or `records`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDefinition {
  pub name: String,
  pub description: String,
}

/// The remote contract of a flow.
///
/// `url` is both the identity of the definition in the local cache and the
/// location it is refetched from. Fields the server adds later are kept in
/// `extra` so that a cached definition round-trips without losing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDefinition {
  pub id: String,
  pub name: String,
  pub description: String,
  pub url: String,
  pub input_definitions: Vec<InputDefinition>,
  pub output_definitions: Vec<OutputDefinition>,
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FlowDefinition {
  /// Look up the input definition with the given name.
  pub fn input_definition(&self, name: &str) -> Option<&InputDefinition> {
    self.input_definitions.iter().find(|d| d.name == name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_value_type_wire_names() {
    assert_eq!(serde_json::to_value(ValueType::Base64).unwrap(), json!("binary/base64"));
    assert_eq!(serde_json::to_value(ValueType::String).unwrap(), json!("string"));
  }

  #[test]
  fn test_extra_fields_survive_round_trip() {
    let raw = json!({
      "id": "f1",
      "name": "Summarize",
      "description": "",
      "url": "https://flows.example/f1",
      "inputDefinitions": [{ "name": "text", "description": "", "type": "string" }],
      "outputDefinitions": [],
      "icon": "sparkles"
    });

    let definition: FlowDefinition = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(definition.extra["icon"], "sparkles");
    assert_eq!(serde_json::to_value(&definition).unwrap(), raw);
  }

  #[test]
  fn test_input_definition_lookup() {
    let definition: FlowDefinition = serde_json::from_value(json!({
      "id": "f1",
      "name": "n",
      "description": "d",
      "url": "u",
      "inputDefinitions": [{ "name": "image", "description": "An image", "type": "binary/base64" }],
      "outputDefinitions": []
    }))
    .unwrap();

    assert_eq!(
      definition.input_definition("image").map(|d| d.value_type),
      Some(ValueType::Base64)
    );
    assert!(definition.input_definition("missing").is_none());
  }
}
