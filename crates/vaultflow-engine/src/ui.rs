//! The user-facing collaborator: prompts, pickers, popups and notices.

use async_trait::async_trait;
use vaultflow_workspace::WorkspaceFile;

/// One field of a batched text prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptField {
  pub name: String,
  /// Taken from the flow's input definition, empty when there is none.
  pub description: String,
}

/// A request to pick one file among `candidates`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePick {
  pub input_name: String,
  pub description: String,
  pub pattern: String,
  pub candidates: Vec<WorkspaceFile>,
}

/// Interaction with the person running commands.
///
/// `None` from a prompt or picker means the user cancelled.
#[async_trait]
pub trait UserInterface: Send + Sync {
  /// Ask for all `fields` at once. Returns `(name, value)` pairs.
  async fn prompt_text(&self, fields: &[PromptField]) -> Option<Vec<(String, String)>>;

  async fn pick_file(&self, request: FilePick) -> Option<WorkspaceFile>;

  /// Show `text` in a popup titled `title`.
  async fn show_text(&self, title: &str, text: &str);

  /// A short transient message.
  fn notice(&self, message: &str);

  /// Replace the status line.
  fn status(&self, text: &str);
}
