use serde::{Deserialize, Serialize};

use crate::flow::ValueType;

/// The command a configuration is exposed as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
  pub id: String,
  pub name: String,
  pub description: String,
}

/// A user-authored binding of a command to a remote flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowConfiguration {
  /// URL of the flow definition this configuration executes.
  pub flow: String,
  pub command: Command,
  pub input_configurations: Vec<InputConfiguration>,
  /// Dispatched in order.
  pub result_actions: Vec<Action>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub triggers: Option<Vec<Trigger>>,
}

impl FlowConfiguration {
  /// Triggers in evaluation order; empty when none are declared.
  pub fn triggers(&self) -> &[Trigger] {
    self.triggers.as_deref().unwrap_or_default()
  }
}

/// Where the value of one flow input comes from.
///
/// `name` must match an input definition of the flow and `value_type` must
/// agree with it. Binary inputs can never be `constant` or `prompt` sourced;
/// the validator rejects those combinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfiguration {
  pub name: String,
  #[serde(rename = "type")]
  pub value_type: ValueType,
  #[serde(flatten)]
  pub source: InputSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sourceType", rename_all = "camelCase")]
pub enum InputSource {
  /// A literal value stored in the configuration.
  Constant { value: String },
  /// The document that is active when the command runs.
  ActiveFile,
  /// A document at a fixed workspace path.
  FixedFile { path: String },
  /// A document the user picks among paths matching `pattern`.
  SelectFile {
    pattern: String,
    #[serde(rename = "isRegularExpression", default = "default_true")]
    is_regular_expression: bool,
    #[serde(
      rename = "autoRunOnCreate",
      default,
      skip_serializing_if = "Option::is_none"
    )]
    auto_run_on_create: Option<bool>,
  },
  /// Text typed by the user when the command runs.
  Prompt,
}

fn default_true() -> bool {
  true
}

impl InputSource {
  pub fn source_type(&self) -> &'static str {
    match self {
      InputSource::Constant { .. } => "constant",
      InputSource::ActiveFile => "activeFile",
      InputSource::FixedFile { .. } => "fixedFile",
      InputSource::SelectFile { .. } => "selectFile",
      InputSource::Prompt => "prompt",
    }
  }
}

/// A side effect applied to a projection of the flow response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
  #[serde(flatten)]
  pub kind: ActionKind,
  #[serde(flatten)]
  pub source: ActionSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ActionKind {
  Log,
  Popup,
  InsertAtCursorPosition,
  ReplaceActiveFile,
  CreateOrReplaceFile {
    #[serde(rename = "filePath")]
    file_path: String,
  },
  CreateOrAppendFile {
    #[serde(rename = "filePath")]
    file_path: String,
  },
}

impl ActionKind {
  pub fn name(&self) -> &'static str {
    match self {
      ActionKind::Log => "log",
      ActionKind::Popup => "popup",
      ActionKind::InsertAtCursorPosition => "insertAtCursorPosition",
      ActionKind::ReplaceActiveFile => "replaceActiveFile",
      ActionKind::CreateOrReplaceFile { .. } => "createOrReplaceFile",
      ActionKind::CreateOrAppendFile { .. } => "createOrAppendFile",
    }
  }
}

/// Which part of the response an action consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sourceType", rename_all = "camelCase")]
pub enum ActionSource {
  /// The whole response, pretty-printed.
  Raw,
  /// The `errors` array, only when it is non-empty.
  Error,
  /// One named field of `constants`, or of the first record.
  Property { property: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerEvent {
  FileOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerFrequency {
  OncePerFileAndSession,
}

/// A workspace-event rule that runs a configuration automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
  pub event: TriggerEvent,
  /// Boolean expression evaluated against the event context.
  pub condition: String,
  pub frequency: TriggerFrequency,
}
