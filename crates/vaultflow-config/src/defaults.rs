//! Default values used when authoring configurations.

use crate::configuration::{
  Action, ActionKind, ActionSource, FlowConfiguration, InputConfiguration, InputSource, Trigger,
  TriggerEvent, TriggerFrequency,
};
use crate::flow::ValueType;

/// Generate a fresh, globally unique command id.
pub fn new_command_id() -> String {
  uuid::Uuid::new_v4().simple().to_string()
}

/// Deep copy a configuration under a new command.
///
/// The copy gets a fresh command id and its name is prefixed with
/// `"Copy of "`. Nothing is shared with the original.
pub fn duplicate_with_new_command(configuration: &FlowConfiguration) -> FlowConfiguration {
  let mut copy = configuration.clone();
  copy.command.name = format!("Copy of {}", configuration.command.name);
  copy.command.id = new_command_id();
  copy
}

/// The input configuration a newly chosen source starts out with.
///
/// Returns `None` for combinations that are not allowed: binary inputs
/// cannot be `constant` or `prompt` sourced.
pub fn default_input_configuration(
  source_type: &str,
  value_type: ValueType,
  name: &str,
) -> Option<InputConfiguration> {
  let source = match (source_type, value_type) {
    ("constant", ValueType::String) => InputSource::Constant {
      value: String::new(),
    },
    ("activeFile", _) => InputSource::ActiveFile,
    ("selectFile", value_type) => InputSource::SelectFile {
      pattern: match value_type {
        ValueType::String => r"\.md$".to_string(),
        ValueType::Base64 => r"\.(png|jpg|jpeg|gif)$".to_string(),
      },
      is_regular_expression: true,
      auto_run_on_create: Some(false),
    },
    ("fixedFile", _) => InputSource::FixedFile {
      path: String::new(),
    },
    ("prompt", ValueType::String) => InputSource::Prompt,
    _ => return None,
  };

  Some(InputConfiguration {
    name: name.to_string(),
    value_type,
    source,
  })
}

/// A newly added action of the given kind, consuming the raw response.
pub fn default_action(kind: ActionKind) -> Action {
  Action {
    kind,
    source: ActionSource::Raw,
  }
}

pub fn default_trigger(event: TriggerEvent) -> Trigger {
  Trigger {
    event,
    condition: String::new(),
    frequency: TriggerFrequency::OncePerFileAndSession,
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;
  use crate::configuration::Command;

  fn configuration() -> FlowConfiguration {
    FlowConfiguration {
      flow: "https://flows.example/summarize".to_string(),
      command: Command {
        id: "abc".to_string(),
        name: "Summarize".to_string(),
        description: "Summarize the note".to_string(),
      },
      input_configurations: vec![InputConfiguration {
        name: "text".to_string(),
        value_type: ValueType::String,
        source: InputSource::ActiveFile,
      }],
      result_actions: vec![default_action(ActionKind::Popup)],
      triggers: Some(vec![default_trigger(TriggerEvent::FileOpen)]),
    }
  }

  #[test]
  fn test_duplicate_renames_and_reassigns_id() {
    let original = configuration();
    let copy = duplicate_with_new_command(&original);

    assert_eq!(copy.command.name, "Copy of Summarize");
    assert_ne!(copy.command.id, original.command.id);
    assert_eq!(copy.input_configurations, original.input_configurations);
    assert_eq!(copy.result_actions, original.result_actions);
  }

  #[test]
  fn test_duplicate_is_independent_of_original() {
    let original = configuration();
    let mut copy = duplicate_with_new_command(&original);

    copy.input_configurations[0].name = "changed".to_string();
    copy.result_actions.clear();
    copy.triggers = None;

    assert_eq!(original.input_configurations[0].name, "text");
    assert_eq!(original.result_actions.len(), 1);
    assert_eq!(original.triggers().len(), 1);
  }

  #[test]
  fn test_duplicate_ids_are_unique() {
    let original = configuration();
    let ids: HashSet<String> = (0..64)
      .map(|_| duplicate_with_new_command(&original).command.id)
      .collect();
    assert_eq!(ids.len(), 64);
  }

  #[test]
  fn test_binary_inputs_have_no_constant_or_prompt_default() {
    assert!(default_input_configuration("constant", ValueType::Base64, "img").is_none());
    assert!(default_input_configuration("prompt", ValueType::Base64, "img").is_none());
    assert!(default_input_configuration("constant", ValueType::String, "txt").is_some());
    assert!(default_input_configuration("unknown", ValueType::String, "txt").is_none());
  }

  #[test]
  fn test_select_file_default_pattern_depends_on_type() {
    let image = default_input_configuration("selectFile", ValueType::Base64, "img").unwrap();
    match image.source {
      InputSource::SelectFile { pattern, .. } => assert_eq!(pattern, r"\.(png|jpg|jpeg|gif)$"),
      other => panic!("unexpected source {:?}", other),
    }
  }

  #[test]
  fn test_default_file_action_has_empty_path() {
    let action = default_action(ActionKind::CreateOrReplaceFile {
      file_path: String::new(),
    });
    assert_eq!(action.source, ActionSource::Raw);
    assert_eq!(action.kind.name(), "createOrReplaceFile");
  }
}
