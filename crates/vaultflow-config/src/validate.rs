//! Structural validation of vaultflow documents.
//!
//! Documents are checked as raw [`serde_json::Value`]s so that every problem
//! can be reported at once, each with the path of the offending field. A
//! document that is not an object at its root is rejected with
//! [`SchemaError::NotAnObject`]; every other defect is collected into the
//! returned [`Validation`].
//!
//! Flow definitions accept unknown top-level fields so that a server can
//! add to the contract without breaking older clients. The tagged unions
//! (`sourceType` of inputs, `action` and `sourceType` of result actions)
//! are closed: anything outside the known taxonomy is a violation.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::configuration::FlowConfiguration;
use crate::error::SchemaError;
use crate::flow::FlowDefinition;
use crate::response::ApiResponse;
use crate::settings::Settings;

const VALUE_TYPES: &[&str] = &["string", "binary/base64"];
const INPUT_SOURCE_TYPES: &[&str] = &["constant", "activeFile", "fixedFile", "selectFile", "prompt"];
const ACTIONS: &[&str] = &[
  "log",
  "popup",
  "insertAtCursorPosition",
  "replaceActiveFile",
  "createOrReplaceFile",
  "createOrAppendFile",
];
const ACTION_SOURCE_TYPES: &[&str] = &["raw", "error", "property"];
const TRIGGER_EVENTS: &[&str] = &["fileOpen"];
const TRIGGER_FREQUENCIES: &[&str] = &["oncePerFileAndSession"];

/// The document shapes the validator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
  Settings,
  FlowDefinition,
  FlowConfiguration,
  ApiResponse,
}

impl DocumentKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      DocumentKind::Settings => "settings",
      DocumentKind::FlowDefinition => "flow-definition",
      DocumentKind::FlowConfiguration => "flow-configuration",
      DocumentKind::ApiResponse => "api-response",
    }
  }
}

impl fmt::Display for DocumentKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for DocumentKind {
  type Err = SchemaError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "settings" => Ok(DocumentKind::Settings),
      "flow-definition" => Ok(DocumentKind::FlowDefinition),
      "flow-configuration" => Ok(DocumentKind::FlowConfiguration),
      "api-response" => Ok(DocumentKind::ApiResponse),
      other => Err(SchemaError::UnknownKind(other.to_string())),
    }
  }
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
  /// Dotted path to the offending field, e.g. `resultActions[1].filePath`.
  /// Empty for the document root.
  pub path: String,
  pub reason: String,
}

impl fmt::Display for Violation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.path.is_empty() {
      write!(f, "(root): {}", self.reason)
    } else {
      write!(f, "{}: {}", self.path, self.reason)
    }
  }
}

/// Outcome of validating one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
  violations: Vec<Violation>,
}

impl Validation {
  pub fn is_valid(&self) -> bool {
    self.violations.is_empty()
  }

  pub fn violations(&self) -> &[Violation] {
    &self.violations
  }

  pub fn into_violations(self) -> Vec<Violation> {
    self.violations
  }
}

/// Validate a document of the given kind.
pub fn validate(kind: DocumentKind, value: &Value) -> Result<Validation, SchemaError> {
  let root = value.as_object().ok_or(SchemaError::NotAnObject {
    kind,
    found: type_name(value),
  })?;

  let mut checker = Checker::default();
  match kind {
    DocumentKind::Settings => checker.settings("", root),
    DocumentKind::FlowDefinition => checker.flow_definition("", root),
    DocumentKind::FlowConfiguration => checker.flow_configuration("", root),
    DocumentKind::ApiResponse => checker.api_response("", root),
  }

  Ok(Validation {
    violations: checker.violations,
  })
}

pub fn validate_settings(value: &Value) -> Result<Validation, SchemaError> {
  validate(DocumentKind::Settings, value)
}

pub fn validate_flow_definition(value: &Value) -> Result<Validation, SchemaError> {
  validate(DocumentKind::FlowDefinition, value)
}

pub fn validate_flow_configuration(value: &Value) -> Result<Validation, SchemaError> {
  validate(DocumentKind::FlowConfiguration, value)
}

pub fn validate_api_response(value: &Value) -> Result<Validation, SchemaError> {
  validate(DocumentKind::ApiResponse, value)
}

pub fn parse_settings(value: &Value) -> Result<Settings, SchemaError> {
  parse(DocumentKind::Settings, value)
}

pub fn parse_flow_definition(value: &Value) -> Result<FlowDefinition, SchemaError> {
  parse(DocumentKind::FlowDefinition, value)
}

pub fn parse_flow_configuration(value: &Value) -> Result<FlowConfiguration, SchemaError> {
  parse(DocumentKind::FlowConfiguration, value)
}

pub fn parse_api_response(value: &Value) -> Result<ApiResponse, SchemaError> {
  parse(DocumentKind::ApiResponse, value)
}

/// Validate, then decode into the typed model.
fn parse<T: DeserializeOwned>(kind: DocumentKind, value: &Value) -> Result<T, SchemaError> {
  let validation = validate(kind, value)?;
  if !validation.is_valid() {
    return Err(SchemaError::Invalid {
      kind,
      violations: validation.into_violations(),
    });
  }
  serde_json::from_value(value.clone()).map_err(|source| SchemaError::Decode { kind, source })
}

fn type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

fn field(path: &str, key: &str) -> String {
  if path.is_empty() {
    key.to_string()
  } else {
    format!("{}.{}", path, key)
  }
}

fn item(path: &str, index: usize) -> String {
  format!("{}[{}]", path, index)
}

fn one_of(allowed: &[&str]) -> String {
  allowed
    .iter()
    .map(|a| format!("\"{}\"", a))
    .collect::<Vec<_>>()
    .join(", ")
}

#[derive(Default)]
struct Checker {
  violations: Vec<Violation>,
}

impl Checker {
  fn violation(&mut self, path: String, reason: impl Into<String>) {
    self.violations.push(Violation {
      path,
      reason: reason.into(),
    });
  }

  fn mismatch(&mut self, path: String, expected: &str, found: &Value) {
    self.violation(
      path,
      format!("expected {}, found {}", expected, type_name(found)),
    );
  }

  fn object<'a>(&mut self, path: &str, value: &'a Value) -> Option<&'a Map<String, Value>> {
    match value.as_object() {
      Some(object) => Some(object),
      None => {
        self.mismatch(path.to_string(), "object", value);
        None
      }
    }
  }

  fn string<'a>(
    &mut self,
    object: &'a Map<String, Value>,
    path: &str,
    key: &str,
    required: bool,
  ) -> Option<&'a str> {
    match object.get(key) {
      Some(Value::String(s)) => Some(s.as_str()),
      None | Some(Value::Null) if !required => None,
      None => {
        self.violation(field(path, key), "required field is missing");
        None
      }
      Some(other) => {
        self.mismatch(field(path, key), "string", other);
        None
      }
    }
  }

  fn boolean(&mut self, object: &Map<String, Value>, path: &str, key: &str, required: bool) {
    match object.get(key) {
      Some(Value::Bool(_)) => {}
      None | Some(Value::Null) if !required => {}
      None => self.violation(field(path, key), "required field is missing"),
      Some(other) => self.mismatch(field(path, key), "boolean", other),
    }
  }

  fn enumeration<'a>(
    &mut self,
    object: &'a Map<String, Value>,
    path: &str,
    key: &str,
    allowed: &[&str],
  ) -> Option<&'a str> {
    let value = self.string(object, path, key, true)?;
    if allowed.contains(&value) {
      Some(value)
    } else {
      self.violation(
        field(path, key),
        format!("expected one of {}, found \"{}\"", one_of(allowed), value),
      );
      None
    }
  }

  fn array<'a>(
    &mut self,
    object: &'a Map<String, Value>,
    path: &str,
    key: &str,
    required: bool,
  ) -> Option<&'a Vec<Value>> {
    match object.get(key) {
      Some(Value::Array(items)) => Some(items),
      None | Some(Value::Null) if !required => None,
      None => {
        self.violation(field(path, key), "required field is missing");
        None
      }
      Some(other) => {
        self.mismatch(field(path, key), "array", other);
        None
      }
    }
  }

  fn each_object<F>(&mut self, items: &[Value], path: &str, mut check: F)
  where
    F: FnMut(&mut Self, &str, &Map<String, Value>),
  {
    for (index, value) in items.iter().enumerate() {
      let item_path = item(path, index);
      if let Some(object) = self.object(&item_path, value) {
        check(self, &item_path, object);
      }
    }
  }

  fn settings(&mut self, path: &str, object: &Map<String, Value>) {
    self.string(object, path, "apiKey", false);
    self.string(object, path, "baseUrl", true);
    self.string(object, path, "version", true);

    if let Some(items) = self.array(object, path, "flowDefinitions", true) {
      self.each_object(items, &field(path, "flowDefinitions"), |c, p, o| {
        c.flow_definition(p, o)
      });
    }
    if let Some(items) = self.array(object, path, "flowConfigurations", true) {
      self.each_object(items, &field(path, "flowConfigurations"), |c, p, o| {
        c.flow_configuration(p, o)
      });
    }
  }

  fn flow_definition(&mut self, path: &str, object: &Map<String, Value>) {
    for key in ["id", "name", "description", "url"] {
      self.string(object, path, key, true);
    }

    if let Some(items) = self.array(object, path, "inputDefinitions", true) {
      self.each_object(items, &field(path, "inputDefinitions"), |c, p, o| {
        c.string(o, p, "name", true);
        c.string(o, p, "description", true);
        c.enumeration(o, p, "type", VALUE_TYPES);
      });
    }
    if let Some(items) = self.array(object, path, "outputDefinitions", true) {
      self.each_object(items, &field(path, "outputDefinitions"), |c, p, o| {
        c.string(o, p, "name", true);
        c.string(o, p, "description", true);
      });
    }
  }

  fn flow_configuration(&mut self, path: &str, object: &Map<String, Value>) {
    self.string(object, path, "flow", true);

    match object.get("command") {
      Some(value) => {
        let command_path = field(path, "command");
        if let Some(command) = self.object(&command_path, value) {
          for key in ["id", "name", "description"] {
            self.string(command, &command_path, key, true);
          }
        }
      }
      None => self.violation(field(path, "command"), "required field is missing"),
    }

    if let Some(items) = self.array(object, path, "inputConfigurations", true) {
      self.each_object(items, &field(path, "inputConfigurations"), |c, p, o| {
        c.input_configuration(p, o)
      });
    }
    if let Some(items) = self.array(object, path, "resultActions", true) {
      self.each_object(items, &field(path, "resultActions"), |c, p, o| c.action(p, o));
    }
    if let Some(items) = self.array(object, path, "triggers", false) {
      self.each_object(items, &field(path, "triggers"), |c, p, o| c.trigger(p, o));
    }
  }

  fn input_configuration(&mut self, path: &str, object: &Map<String, Value>) {
    self.string(object, path, "name", true);
    let value_type = self.enumeration(object, path, "type", VALUE_TYPES);
    let Some(source_type) = self.enumeration(object, path, "sourceType", INPUT_SOURCE_TYPES) else {
      return;
    };

    match source_type {
      "constant" => {
        self.string(object, path, "value", true);
      }
      "fixedFile" => {
        self.string(object, path, "path", true);
      }
      "selectFile" => {
        self.boolean(object, path, "isRegularExpression", true);
        self.boolean(object, path, "autoRunOnCreate", false);
        if let Some(pattern) = self.string(object, path, "pattern", true)
          && let Err(e) = regex::Regex::new(pattern)
        {
          self.violation(
            field(path, "pattern"),
            format!("invalid regular expression: {}", e),
          );
        }
      }
      _ => {}
    }

    if value_type == Some("binary/base64") && matches!(source_type, "constant" | "prompt") {
      self.violation(
        field(path, "sourceType"),
        format!("binary/base64 inputs cannot be sourced from \"{}\"", source_type),
      );
    }
  }

  fn action(&mut self, path: &str, object: &Map<String, Value>) {
    if let Some(action) = self.enumeration(object, path, "action", ACTIONS)
      && matches!(action, "createOrReplaceFile" | "createOrAppendFile")
    {
      self.string(object, path, "filePath", true);
    }

    if self.enumeration(object, path, "sourceType", ACTION_SOURCE_TYPES) == Some("property") {
      self.string(object, path, "property", true);
    }
  }

  fn trigger(&mut self, path: &str, object: &Map<String, Value>) {
    self.enumeration(object, path, "event", TRIGGER_EVENTS);
    self.string(object, path, "condition", true);
    self.enumeration(object, path, "frequency", TRIGGER_FREQUENCIES);
  }

  fn api_response(&mut self, path: &str, object: &Map<String, Value>) {
    match object.get("constants") {
      None | Some(Value::Null) | Some(Value::Object(_)) => {}
      Some(other) => self.mismatch(field(path, "constants"), "object", other),
    }
    if let Some(records) = self.array(object, path, "records", false) {
      self.each_object(records, &field(path, "records"), |_, _, _| {});
    }
    if let Some(errors) = self.array(object, path, "errors", false) {
      for (index, value) in errors.iter().enumerate() {
        if !value.is_string() {
          self.mismatch(item(&field(path, "errors"), index), "string", value);
        }
      }
    }
  }
}
