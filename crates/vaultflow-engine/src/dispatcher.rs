//! Result action dispatch.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info, instrument};
use vaultflow_config::{Action, ActionKind, ActionSource, ApiResponse, FlowInput};
use vaultflow_expr::render_template;
use vaultflow_workspace::{Workspace, WorkspaceFile};

use crate::error::EngineError;
use crate::ui::UserInterface;

/// Tracing target the `log` action writes to.
pub const ACTION_LOG_TARGET: &str = "vaultflow::action";

/// The text an action consumes, or `None` when there is nothing to act on.
pub fn project_output(source: &ActionSource, response: &ApiResponse) -> Option<String> {
  let output = match source {
    ActionSource::Raw => serde_json::to_string_pretty(response).ok()?,
    ActionSource::Error => {
      let errors = response.errors();
      if errors.is_empty() {
        return None;
      }
      serde_json::to_string_pretty(errors).ok()?
    }
    ActionSource::Property { property } => match response.property(property)? {
      Value::Null => return None,
      Value::String(s) => s.clone(),
      other => other.to_string(),
    },
  };

  (!output.is_empty()).then_some(output)
}

/// What happened to one action.
#[derive(Debug)]
pub enum ActionOutcome {
  Applied,
  /// No output, or nothing to apply it to.
  Skipped,
  Failed(EngineError),
}

pub struct ActionDispatcher {
  workspace: Arc<dyn Workspace>,
  ui: Arc<dyn UserInterface>,
}

impl ActionDispatcher {
  pub fn new(workspace: Arc<dyn Workspace>, ui: Arc<dyn UserInterface>) -> Self {
    Self { workspace, ui }
  }

  /// Run `actions` in order. A failing action does not stop the ones after it.
  #[instrument(name = "dispatch_actions", skip_all, fields(command = %command_name, actions = actions.len()))]
  pub async fn dispatch(
    &self,
    command_name: &str,
    actions: &[Action],
    input: &FlowInput,
    response: &ApiResponse,
    active: Option<&WorkspaceFile>,
  ) -> Vec<ActionOutcome> {
    let mut outcomes = Vec::with_capacity(actions.len());

    for action in actions {
      let outcome = match project_output(&action.source, response) {
        None => {
          debug!(action = action.kind.name(), "no output, skipping action");
          ActionOutcome::Skipped
        }
        Some(output) => match self
          .apply(command_name, &action.kind, &output, input, response, active)
          .await
        {
          Ok(true) => ActionOutcome::Applied,
          Ok(false) => ActionOutcome::Skipped,
          Err(e) => ActionOutcome::Failed(e),
        },
      };
      outcomes.push(outcome);
    }

    outcomes
  }

  /// Returns `false` when there was nothing to apply the output to.
  async fn apply(
    &self,
    command_name: &str,
    kind: &ActionKind,
    output: &str,
    input: &FlowInput,
    response: &ApiResponse,
    active: Option<&WorkspaceFile>,
  ) -> Result<bool, EngineError> {
    match kind {
      ActionKind::Log => {
        info!(target: ACTION_LOG_TARGET, command = %command_name, "{}", output);
        Ok(true)
      }
      ActionKind::Popup => {
        self.ui.show_text(command_name, output).await;
        Ok(true)
      }
      ActionKind::InsertAtCursorPosition => {
        let inserted = self.workspace.replace_selection(output).await?;
        if !inserted {
          debug!("no active editor, nothing to insert into");
        }
        Ok(inserted)
      }
      ActionKind::ReplaceActiveFile => match active {
        Some(file) => {
          self.workspace.modify(file, output).await?;
          Ok(true)
        }
        None => {
          debug!("no active file to replace");
          Ok(false)
        }
      },
      ActionKind::CreateOrReplaceFile { file_path } => {
        self.write_file(file_path, output, input, response, false).await?;
        Ok(true)
      }
      ActionKind::CreateOrAppendFile { file_path } => {
        self.write_file(file_path, output, input, response, true).await?;
        Ok(true)
      }
    }
  }

  async fn write_file(
    &self,
    template: &str,
    output: &str,
    input: &FlowInput,
    response: &ApiResponse,
    append: bool,
  ) -> Result<(), EngineError> {
    let context = json!({ "input": input.constants, "output": response });
    let path = render_template(template, &context)?;

    if !self.workspace.exists(&path).await? {
      info!(path = %path, "creating file");
      self.workspace.create(&path, output).await?;
      return Ok(());
    }

    let Some(file) = self.workspace.file(&path).await? else {
      return Err(EngineError::Action {
        action: if append { "createOrAppendFile" } else { "createOrReplaceFile" },
        message: format!("{} exists but is not a file", path),
      });
    };

    info!(path = %path, append, "updating file");
    if append {
      self.workspace.append(&file, output).await?;
    } else {
      self.workspace.modify(&file, output).await?;
    }
    Ok(())
  }
}
