//! Validation tests over complete documents.

use serde_json::{Value, json};
use vaultflow_config::validate::{
  validate_api_response, validate_flow_configuration, validate_flow_definition, validate_settings,
};
use vaultflow_config::{
  ActionKind, InputSource, SchemaError, ValueType, parse_flow_configuration, parse_flow_definition,
  parse_settings,
};

fn flow_definition() -> Value {
  json!({
    "id": "flow-1",
    "name": "Extract text",
    "description": "Runs OCR on an image",
    "url": "https://flows.example/ocr",
    "inputDefinitions": [
      { "name": "image", "description": "The image", "type": "binary/base64" },
      { "name": "language", "description": "Language hint", "type": "string" }
    ],
    "outputDefinitions": [
      { "name": "text", "description": "Recognized text" }
    ]
  })
}

fn flow_configuration() -> Value {
  json!({
    "flow": "https://flows.example/ocr",
    "command": { "id": "cmd-1", "name": "OCR image", "description": "" },
    "inputConfigurations": [
      { "name": "image", "type": "binary/base64", "sourceType": "selectFile", "pattern": "\\.png$", "isRegularExpression": true, "autoRunOnCreate": false },
      { "name": "language", "type": "string", "sourceType": "prompt" }
    ],
    "resultActions": [
      { "action": "log", "sourceType": "raw" },
      { "action": "createOrReplaceFile", "filePath": "${input.image/workspace/filePath}.md", "sourceType": "property", "property": "text" },
      { "action": "popup", "sourceType": "error" }
    ],
    "triggers": [
      { "event": "fileOpen", "condition": "content.includes('#ocr')", "frequency": "oncePerFileAndSession" }
    ]
  })
}

#[test]
fn test_flow_definition_requires_url() {
  let mut definition = flow_definition();
  definition.as_object_mut().unwrap().remove("url");

  let validation = validate_flow_definition(&definition).unwrap();
  assert!(!validation.is_valid());
  assert_eq!(validation.violations()[0].path, "url");
  assert_eq!(validation.violations()[0].reason, "required field is missing");
}

#[test]
fn test_flow_definition_accepts_unknown_fields() {
  let mut definition = flow_definition();
  definition["category"] = json!("vision");

  let validation = validate_flow_definition(&definition).unwrap();
  assert!(validation.is_valid(), "{:?}", validation.violations());

  let parsed = parse_flow_definition(&definition).unwrap();
  assert_eq!(parsed.url, "https://flows.example/ocr");
  assert_eq!(parsed.extra["category"], "vision");
}

#[test]
fn test_valid_flow_configuration_parses() {
  let config = parse_flow_configuration(&flow_configuration()).unwrap();

  assert_eq!(config.command.id, "cmd-1");
  assert_eq!(config.input_configurations[0].value_type, ValueType::Base64);
  assert!(matches!(
    config.input_configurations[0].source,
    InputSource::SelectFile {
      auto_run_on_create: Some(false),
      ..
    }
  ));
  assert_eq!(config.result_actions.len(), 3);
  assert!(matches!(
    &config.result_actions[1].kind,
    ActionKind::CreateOrReplaceFile { file_path } if file_path.ends_with(".md")
  ));
  assert_eq!(config.triggers().len(), 1);
}

#[test]
fn test_binary_constant_and_prompt_are_rejected() {
  let mut config = flow_configuration();
  config["inputConfigurations"] = json!([
    { "name": "image", "type": "binary/base64", "sourceType": "constant", "value": "AAAA" },
    { "name": "other", "type": "binary/base64", "sourceType": "prompt" }
  ]);

  let validation = validate_flow_configuration(&config).unwrap();
  let paths: Vec<&str> = validation
    .violations()
    .iter()
    .map(|v| v.path.as_str())
    .collect();
  assert_eq!(
    paths,
    vec![
      "inputConfigurations[0].sourceType",
      "inputConfigurations[1].sourceType"
    ]
  );
}

#[test]
fn test_unknown_input_source_type_is_rejected() {
  let mut config = flow_configuration();
  config["inputConfigurations"] = json!([
    { "name": "image", "type": "string", "sourceType": "clipboard" }
  ]);

  let validation = validate_flow_configuration(&config).unwrap();
  assert_eq!(validation.violations().len(), 1);
  assert_eq!(
    validation.violations()[0].path,
    "inputConfigurations[0].sourceType"
  );
}

#[test]
fn test_variant_specific_fields_are_required() {
  let mut config = flow_configuration();
  config["inputConfigurations"] = json!([
    { "name": "a", "type": "string", "sourceType": "constant" },
    { "name": "b", "type": "string", "sourceType": "fixedFile" },
    { "name": "c", "type": "string", "sourceType": "selectFile", "pattern": "(", "isRegularExpression": true }
  ]);
  config["resultActions"] = json!([
    { "action": "createOrAppendFile", "sourceType": "property" }
  ]);

  let validation = validate_flow_configuration(&config).unwrap();
  let paths: Vec<&str> = validation
    .violations()
    .iter()
    .map(|v| v.path.as_str())
    .collect();
  assert_eq!(
    paths,
    vec![
      "inputConfigurations[0].value",
      "inputConfigurations[1].path",
      "inputConfigurations[2].pattern",
      "resultActions[0].filePath",
      "resultActions[0].property",
    ]
  );
  assert!(
    validation.violations()[2]
      .reason
      .starts_with("invalid regular expression")
  );
}

#[test]
fn test_parse_reports_violations() {
  let mut config = flow_configuration();
  config["triggers"] = json!([{ "event": "fileSave", "condition": "", "frequency": "always" }]);

  match parse_flow_configuration(&config) {
    Err(SchemaError::Invalid { violations, .. }) => {
      assert_eq!(violations.len(), 2);
      assert_eq!(violations[0].path, "triggers[0].event");
      assert_eq!(violations[1].path, "triggers[0].frequency");
    }
    other => panic!("expected invalid configuration, got {:?}", other),
  }
}

#[test]
fn test_settings_document() {
  let document = json!({
    "apiKey": null,
    "baseUrl": "https://app.taskbone.com",
    "version": "0.1.0",
    "flowDefinitions": [flow_definition()],
    "flowConfigurations": [flow_configuration()]
  });

  let settings = parse_settings(&document).unwrap();
  assert!(settings.api_key().is_none());
  assert_eq!(settings.flow_definitions.len(), 1);
  assert!(settings.configuration("cmd-1").is_some());

  let broken = json!({
    "baseUrl": "https://app.taskbone.com",
    "flowDefinitions": {},
    "flowConfigurations": [{ "flow": "x" }]
  });
  let validation = validate_settings(&broken).unwrap();
  let paths: Vec<&str> = validation
    .violations()
    .iter()
    .map(|v| v.path.as_str())
    .collect();
  assert_eq!(
    paths,
    vec![
      "version",
      "flowDefinitions",
      "flowConfigurations[0].command",
      "flowConfigurations[0].inputConfigurations",
      "flowConfigurations[0].resultActions",
    ]
  );
}

#[test]
fn test_api_response_shapes() {
  assert!(validate_api_response(&json!({})).unwrap().is_valid());
  assert!(
    validate_api_response(&json!({ "constants": { "a": "b" }, "records": [{ "x": "y" }] }))
      .unwrap()
      .is_valid()
  );

  let validation = validate_api_response(&json!({ "errors": ["ok", 5], "records": "nope" })).unwrap();
  let paths: Vec<&str> = validation
    .violations()
    .iter()
    .map(|v| v.path.as_str())
    .collect();
  assert_eq!(paths, vec!["records", "errors[1]"]);

  assert!(matches!(
    validate_api_response(&json!("text")),
    Err(SchemaError::NotAnObject { .. })
  ));
}
